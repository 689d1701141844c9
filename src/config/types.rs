use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub ingest: IngestSettings,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IngestSettings {
    #[serde(default = "default_code_max_chars")]
    pub code_max_chars: usize,
    #[serde(default = "default_doc_max_chars")]
    pub doc_max_chars: usize,
    #[serde(default = "default_doc_overlap_chars")]
    pub doc_overlap_chars: usize,
    /// Parallel file workers; defaults to the available parallelism.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_upsert_batch")]
    pub upsert_batch: usize,
}

fn default_code_max_chars() -> usize {
    2048
}

fn default_doc_max_chars() -> usize {
    1500
}

fn default_doc_overlap_chars() -> usize {
    150
}

fn default_concurrency() -> usize {
    squadsense_index::indexer::default_concurrency()
}

fn default_upsert_batch() -> usize {
    64
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            code_max_chars: default_code_max_chars(),
            doc_max_chars: default_doc_max_chars(),
            doc_overlap_chars: default_doc_overlap_chars(),
            concurrency: default_concurrency(),
            upsert_batch: default_upsert_batch(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Qdrant,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default = "default_qdrant_url")]
    pub qdrant_url: String,
    #[serde(default = "default_collection_prefix")]
    pub collection_prefix: String,
    #[serde(default = "default_embedding_dimensions")]
    pub embedding_dimensions: usize,
}

fn default_qdrant_url() -> String {
    "http://localhost:6334".into()
}

fn default_collection_prefix() -> String {
    "squadsense_".into()
}

fn default_embedding_dimensions() -> usize {
    squadsense_memory::HashingEmbedder::DEFAULT_DIMENSIONS
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            qdrant_url: default_qdrant_url(),
            collection_prefix: default_collection_prefix(),
            embedding_dimensions: default_embedding_dimensions(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,
}

fn default_top_k() -> usize {
    5
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_top_k: default_top_k(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
