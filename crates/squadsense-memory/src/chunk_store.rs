//! Scope-isolated chunk persistence over a [`VectorStore`].

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::embedding::Embedder;
use crate::error::{MemoryError, Result};
use crate::identity::point_id;
use crate::types::{Chunk, ChunkKind, ChunkMetadata, ScoredChunk};
use crate::vector_store::{BoxFuture, VectorFilter, VectorPoint, VectorStore};

const MAX_COLLECTION_NAME: usize = 63;
const MIN_SCOPE_LEN: usize = 3;

/// Vector store capability as seen by the ingestion core and retrieval facade.
pub trait ChunkStore: Send + Sync {
    /// Insert or replace chunks under `scope`, keyed by chunk id. Returns the number written.
    fn upsert<'a>(&'a self, scope: &'a str, chunks: &'a [Chunk]) -> BoxFuture<'a, Result<usize>>;

    /// Nearest chunks to `text` within `scope`, optionally restricted to one kind.
    fn query<'a>(
        &'a self,
        scope: &'a str,
        text: &'a str,
        top_k: usize,
        kind: Option<ChunkKind>,
    ) -> BoxFuture<'a, Result<Vec<ScoredChunk>>>;

    fn list_scopes(&self) -> BoxFuture<'_, Result<BTreeSet<String>>>;

    /// Remove every chunk stored under `scope`. Missing scopes are a no-op.
    fn drop_scope<'a>(&'a self, scope: &'a str) -> BoxFuture<'a, Result<()>>;
}

/// Normalise a scope name into a storage key: lowercase, trimmed, spaces and
/// hyphens mapped to `_`, padded to at least three characters.
#[must_use]
pub fn normalize_scope(scope: &str) -> String {
    let mut normalized: String = scope
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect();
    if normalized.chars().count() < MIN_SCOPE_LEN {
        normalized.push_str("_col");
    }
    normalized
}

/// [`ChunkStore`] that embeds chunk content and keeps one collection per scope.
pub struct EmbeddingChunkStore {
    vectors: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    collection_prefix: String,
    batch_size: usize,
}

impl std::fmt::Debug for EmbeddingChunkStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingChunkStore")
            .field("collection_prefix", &self.collection_prefix)
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

impl EmbeddingChunkStore {
    pub const DEFAULT_BATCH_SIZE: usize = 64;

    #[must_use]
    pub fn new(
        vectors: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        collection_prefix: impl Into<String>,
    ) -> Self {
        Self {
            vectors,
            embedder,
            collection_prefix: collection_prefix.into(),
            batch_size: Self::DEFAULT_BATCH_SIZE,
        }
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Collection backing `scope`.
    #[must_use]
    pub fn collection_name(&self, scope: &str) -> String {
        let name = format!("{}{}", self.collection_prefix, normalize_scope(scope));
        name.chars().take(MAX_COLLECTION_NAME).collect()
    }

    fn to_point(scope: &str, chunk: &Chunk, vector: Vec<f32>) -> Result<VectorPoint> {
        let payload = HashMap::from([
            ("scope".to_owned(), serde_json::json!(scope)),
            ("chunk_id".to_owned(), serde_json::json!(chunk.id)),
            ("kind".to_owned(), serde_json::json!(chunk.kind.as_str())),
            (
                "source_file".to_owned(),
                serde_json::json!(chunk.metadata.source_file),
            ),
            ("content".to_owned(), serde_json::json!(chunk.content)),
            (
                "metadata".to_owned(),
                serde_json::Value::String(serde_json::to_string(&chunk.metadata)?),
            ),
        ]);
        Ok(VectorPoint {
            id: point_id(scope, &chunk.id),
            vector,
            payload,
        })
    }

    fn from_payload(
        key: &str,
        payload: &HashMap<String, serde_json::Value>,
    ) -> Result<Chunk> {
        let id = payload
            .get("chunk_id")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| MemoryError::Other(format!("point {key} has no chunk id")))?
            .to_owned();
        let content = payload
            .get("content")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| MemoryError::Other(format!("point {key} has no content")))?
            .to_owned();
        let raw_meta = payload
            .get("metadata")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| MemoryError::Other(format!("point {key} has no metadata")))?;
        let metadata: ChunkMetadata = serde_json::from_str(raw_meta)?;
        Ok(Chunk {
            id,
            content,
            kind: metadata.kind,
            metadata,
        })
    }
}

impl ChunkStore for EmbeddingChunkStore {
    fn upsert<'a>(&'a self, scope: &'a str, chunks: &'a [Chunk]) -> BoxFuture<'a, Result<usize>> {
        Box::pin(async move {
            if chunks.is_empty() {
                return Ok(0);
            }
            let collection = self.collection_name(scope);
            let dims = u64::try_from(self.embedder.dimensions())?;
            self.vectors.ensure_collection(&collection, dims).await?;

            for batch in chunks.chunks(self.batch_size) {
                let mut points = Vec::with_capacity(batch.len());
                for chunk in batch {
                    let vector = self.embedder.embed(&chunk.content).await?;
                    points.push(Self::to_point(scope, chunk, vector)?);
                }
                self.vectors.upsert(&collection, points).await?;
                tracing::debug!(collection = %collection, batch = batch.len(), "upserted chunks");
            }
            Ok(chunks.len())
        })
    }

    fn query<'a>(
        &'a self,
        scope: &'a str,
        text: &'a str,
        top_k: usize,
        kind: Option<ChunkKind>,
    ) -> BoxFuture<'a, Result<Vec<ScoredChunk>>> {
        Box::pin(async move {
            if top_k == 0 {
                return Ok(Vec::new());
            }
            let collection = self.collection_name(scope);
            if !self.vectors.collection_exists(&collection).await? {
                tracing::debug!(scope, "query against scope with no ingested chunks");
                return Ok(Vec::new());
            }

            let mut fields = vec![("scope", scope)];
            if let Some(kind) = kind {
                fields.push(("kind", kind.as_str()));
            }
            let filter = VectorFilter::must_text(fields);

            let vector = self.embedder.embed(text).await?;
            let limit = u64::try_from(top_k)?;
            let hits = self
                .vectors
                .search(&collection, vector, limit, Some(filter))
                .await?;

            hits.into_iter()
                .map(|hit| {
                    let chunk = Self::from_payload(&hit.id, &hit.payload)?;
                    Ok(ScoredChunk {
                        chunk,
                        score: hit.score,
                    })
                })
                .collect()
        })
    }

    fn list_scopes(&self) -> BoxFuture<'_, Result<BTreeSet<String>>> {
        Box::pin(async move {
            let collections = self.vectors.list_collections().await?;
            Ok(collections
                .into_iter()
                .filter_map(|c| c.strip_prefix(&self.collection_prefix).map(str::to_owned))
                .collect())
        })
    }

    fn drop_scope<'a>(&'a self, scope: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let collection = self.collection_name(scope);
            if self.vectors.collection_exists(&collection).await? {
                self.vectors.delete_collection(&collection).await?;
                tracing::info!(scope, collection = %collection, "dropped scope");
            }
            Ok(())
        })
    }
}
