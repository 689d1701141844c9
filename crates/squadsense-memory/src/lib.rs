//! Chunk model, document chunking and scope-isolated vector storage.
//!
//! Chunks produced by the ingestion core are embedded through an [`Embedder`]
//! and persisted into a [`VectorStore`] (Qdrant or in-memory), one collection
//! per scope, behind the [`ChunkStore`] capability.

pub mod chunk_store;
pub mod document;
pub mod embedding;
pub mod error;
pub mod identity;
pub mod in_memory_store;
pub mod qdrant_ops;
pub mod types;
pub mod vector_store;

pub use chunk_store::{ChunkStore, EmbeddingChunkStore, normalize_scope};
pub use embedding::{EmbedFuture, Embedder, HashingEmbedder};
pub use error::{MemoryError, Result};
pub use identity::{chunk_id, content_hash, point_id};
pub use in_memory_store::InMemoryVectorStore;
pub use qdrant_ops::QdrantOps;
pub use types::{Chunk, ChunkKind, ChunkMetadata, ScoredChunk};
pub use vector_store::{
    BoxFuture, FieldCondition, FieldValue, ScoredVectorPoint, VectorFilter, VectorPoint,
    VectorStore, VectorStoreError,
};
