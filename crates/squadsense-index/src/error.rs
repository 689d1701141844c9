//! Error types for squadsense-index.

use squadsense_memory::MemoryError;

/// Per-file extraction failure. Never fatal to an ingest run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("{path}: unsupported language")]
    UnsupportedLanguage { path: String },

    #[error("{path}: empty input")]
    EmptyInput { path: String },

    #[error("{path}: grammar unavailable: {reason}")]
    Grammar { path: String, reason: String },

    #[error("{path}:{line}:{column}: syntax error")]
    Syntax {
        path: String,
        line: usize,
        column: usize,
    },
}

impl ParseError {
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::UnsupportedLanguage { path }
            | Self::EmptyInput { path }
            | Self::Grammar { path, .. }
            | Self::Syntax { path, .. } => path,
        }
    }
}

/// Failures that abort a whole ingest run.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Two distinct chunks computed the same id; indicates a span bug.
    #[error("identity collision on chunk {id}: {first} and {second} differ")]
    IdentityCollision {
        id: String,
        first: String,
        second: String,
    },

    #[error("ingest cancelled")]
    Cancelled,

    #[error("store error: {0}")]
    Store(#[from] MemoryError),

    #[error("source adapter error: {0}")]
    Source(#[from] IndexError),

    #[error("worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Errors that can occur in source adapters and retrieval.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// IO error reading source files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("document error: {0}")]
    Document(#[from] squadsense_memory::document::DocumentError),

    #[error("store error: {0}")]
    Store(#[from] MemoryError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Generic catch-all error.
    #[error("{0}")]
    Other(String),
}

/// Result type alias using `IndexError`.
pub type Result<T> = std::result::Result<T, IndexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_error_message_has_location() {
        let err = ParseError::Syntax {
            path: "src/Vault.java".into(),
            line: 12,
            column: 5,
        };
        assert_eq!(err.to_string(), "src/Vault.java:12:5: syntax error");
        assert_eq!(err.path(), "src/Vault.java");
    }

    #[test]
    fn collision_message_names_id() {
        let err = IngestError::IdentityCollision {
            id: "abc".into(),
            first: "a.md:1-2".into(),
            second: "a.md:1-2".into(),
        };
        assert!(err.to_string().contains("abc"));
    }
}
