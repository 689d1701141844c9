pub mod chunker;
pub mod error;
pub mod loader;

pub use chunker::{DocumentChunker, DocumentChunkerConfig};
pub use error::DocumentError;
pub use loader::TextLoader;

/// Default maximum file size: 50 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// File extensions treated as prose documentation.
pub const DOCUMENT_EXTENSIONS: &[&str] = &["md", "markdown", "txt", "rst", "html", "htm"];
