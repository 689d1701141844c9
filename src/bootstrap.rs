//! Construct-once wiring of stores, pipeline and retriever.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use squadsense_index::{
    FsSourceAdapter, IngestPipeline, IngestReport, Retriever, SourceDocument,
};
use squadsense_memory::{
    ChunkKind, ChunkStore, Embedder, EmbeddingChunkStore, HashingEmbedder, InMemoryVectorStore,
    QdrantOps, ScoredChunk, VectorStore,
};
use tokio_util::sync::CancellationToken;

use crate::config::{Config, StoreBackend};

/// Shared handles for one process. Dropping it releases the store.
pub struct App {
    config: Config,
    store: Arc<dyn ChunkStore>,
    pipeline: IngestPipeline,
    retriever: Retriever,
    cancel: CancellationToken,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("config", &self.config)
            .field("pipeline", &self.pipeline)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl App {
    /// Build the vector store, embedder, chunk store, pipeline and retriever.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the Qdrant client
    /// cannot be created.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        config.validate()?;

        let vectors: Arc<dyn VectorStore> = match config.store.backend {
            StoreBackend::Memory => Arc::new(InMemoryVectorStore::new()),
            StoreBackend::Qdrant => Arc::new(
                QdrantOps::new(&config.store.qdrant_url)
                    .with_context(|| format!("failed to connect to {}", config.store.qdrant_url))?,
            ),
        };
        let embedder: Arc<dyn Embedder> =
            Arc::new(HashingEmbedder::new(config.store.embedding_dimensions));
        let store: Arc<dyn ChunkStore> = Arc::new(
            EmbeddingChunkStore::new(vectors, embedder, config.store.collection_prefix.clone())
                .with_batch_size(config.ingest.upsert_batch),
        );

        tracing::info!(
            backend = ?config.store.backend,
            dimensions = config.store.embedding_dimensions,
            "store ready"
        );

        Ok(Self {
            config: config.clone(),
            pipeline: IngestPipeline::new(Arc::clone(&store), config.ingest_config()),
            retriever: Retriever::new(Arc::clone(&store)),
            store,
            cancel: CancellationToken::new(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn ChunkStore> {
        &self.store
    }

    #[must_use]
    pub fn pipeline(&self) -> &IngestPipeline {
        &self.pipeline
    }

    #[must_use]
    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Token cancelled by [`Self::shutdown`]; ingest runs stop between files.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Ingest in-memory documents under `scope`.
    ///
    /// # Errors
    ///
    /// Returns an error if the run is cancelled, hits an identity collision
    /// or the store upsert fails.
    pub async fn ingest(
        &self,
        scope: &str,
        documents: Vec<SourceDocument>,
    ) -> anyhow::Result<IngestReport> {
        self.pipeline
            .ingest(scope, documents, &self.cancel)
            .await
            .with_context(|| format!("ingest of scope {scope} failed"))
    }

    /// Ingest a directory tree under `scope`.
    ///
    /// # Errors
    ///
    /// As [`Self::ingest`], plus walk failures.
    pub async fn ingest_dir(&self, root: &Path, scope: &str) -> anyhow::Result<IngestReport> {
        let adapter = FsSourceAdapter::new(root);
        self.pipeline
            .ingest_from(&adapter, scope, &self.cancel)
            .await
            .with_context(|| format!("ingest of {} into {scope} failed", root.display()))
    }

    /// Query `scope` with the configured default `top_k`.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding or the store search fails.
    pub async fn query(
        &self,
        scope: &str,
        text: &str,
        kind: Option<ChunkKind>,
    ) -> anyhow::Result<Vec<ScoredChunk>> {
        let top_k = self.config.retrieval.default_top_k;
        Ok(self.retriever.query(scope, text, top_k, kind).await?)
    }

    /// Stop in-flight ingest runs. Later runs on this app fail as cancelled.
    pub fn shutdown(&self) {
        tracing::info!("shutting down");
        self.cancel.cancel();
    }
}
