use serde::{Deserialize, Serialize};

use crate::identity::chunk_id;

/// Content class of a chunk, used as the retrieval filter key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    Code,
    Document,
}

impl ChunkKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Document => "document",
        }
    }
}

impl std::fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ChunkKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "code" => Ok(Self::Code),
            "document" | "doc" => Ok(Self::Document),
            other => Err(format!("unknown chunk kind: {other}")),
        }
    }
}

/// Citation and filtering metadata attached to every chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source_file: String,
    pub kind: ChunkKind,
    #[serde(default)]
    pub language: Option<String>,
    /// 1-based, inclusive.
    pub start_line: usize,
    /// 1-based, inclusive.
    pub end_line: usize,
    /// Character offsets into the source text; zero for code chunks.
    #[serde(default)]
    pub start_offset: usize,
    #[serde(default)]
    pub end_offset: usize,
    #[serde(default)]
    pub unit_names: Vec<String>,
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default)]
    pub section_index: usize,
    #[serde(default)]
    pub window_index: usize,
    /// Set when a single indivisible unit or section exceeded the chunker budget.
    #[serde(default)]
    pub budget_exceeded: bool,
    /// Set when a decorator or annotation line sat between a unit and its comment.
    #[serde(default)]
    pub decorator_adjacent: bool,
}

impl ChunkMetadata {
    #[must_use]
    pub fn new(
        source_file: impl Into<String>,
        kind: ChunkKind,
        start_line: usize,
        end_line: usize,
    ) -> Self {
        Self {
            source_file: source_file.into(),
            kind,
            language: None,
            start_line,
            end_line,
            start_offset: 0,
            end_offset: 0,
            unit_names: Vec::new(),
            heading: None,
            section_index: 0,
            window_index: 0,
            budget_exceeded: false,
            decorator_adjacent: false,
        }
    }
}

/// Final retrieval unit handed to the vector store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub content: String,
    pub kind: ChunkKind,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Build a chunk whose id is derived from its metadata span.
    #[must_use]
    pub fn new(content: String, metadata: ChunkMetadata) -> Self {
        let id = chunk_id(
            metadata.kind,
            &metadata.source_file,
            metadata.start_line,
            metadata.end_line,
            metadata.start_offset,
            metadata.end_offset,
        );
        Self {
            id,
            content,
            kind: metadata.kind,
            metadata,
        }
    }

    /// Length of the content in characters, the unit chunk budgets are measured in.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ChunkKind::Code).unwrap(), "\"code\"");
        assert_eq!(
            serde_json::to_string(&ChunkKind::Document).unwrap(),
            "\"document\""
        );
    }

    #[test]
    fn kind_from_str_accepts_doc_alias() {
        assert_eq!("doc".parse::<ChunkKind>().unwrap(), ChunkKind::Document);
        assert_eq!("code".parse::<ChunkKind>().unwrap(), ChunkKind::Code);
        assert!("image".parse::<ChunkKind>().is_err());
    }

    #[test]
    fn chunk_new_derives_id_from_span() {
        let meta = ChunkMetadata::new("src/Account.java", ChunkKind::Code, 3, 9);
        let a = Chunk::new("a".into(), meta.clone());
        let b = Chunk::new("b".into(), meta);
        assert_eq!(a.id, b.id);
        assert_eq!(a.kind, ChunkKind::Code);
    }

    #[test]
    fn metadata_defaults_on_deserialize() {
        let json = serde_json::json!({
            "source_file": "README.md",
            "kind": "document",
            "start_line": 1,
            "end_line": 4,
        });
        let meta: ChunkMetadata = serde_json::from_value(json).unwrap();
        assert!(meta.unit_names.is_empty());
        assert!(!meta.budget_exceeded);
        assert_eq!(meta.heading, None);
    }

    #[test]
    fn char_len_counts_chars_not_bytes() {
        let meta = ChunkMetadata::new("a.md", ChunkKind::Document, 1, 1);
        let chunk = Chunk::new("héllo".into(), meta);
        assert_eq!(chunk.char_len(), 5);
    }
}
