use std::str::FromStr;

use super::Config;

/// Parse `key` into `T`, warning and returning `None` on a bad value.
fn parsed<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("ignoring invalid {key} value: {raw}");
            None
        }
    }
}

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SQUADSENSE_STORE_BACKEND") {
            if let Ok(backend) = serde_json::from_value(serde_json::Value::String(v.clone())) {
                self.store.backend = backend;
            } else {
                tracing::warn!("ignoring invalid SQUADSENSE_STORE_BACKEND value: {v}");
            }
        }
        if let Ok(v) = std::env::var("SQUADSENSE_QDRANT_URL") {
            self.store.qdrant_url = v;
        }
        if let Ok(v) = std::env::var("SQUADSENSE_COLLECTION_PREFIX") {
            self.store.collection_prefix = v;
        }
        if let Some(n) = parsed("SQUADSENSE_CODE_MAX_CHARS") {
            self.ingest.code_max_chars = n;
        }
        if let Some(n) = parsed("SQUADSENSE_DOC_MAX_CHARS") {
            self.ingest.doc_max_chars = n;
        }
        if let Some(n) = parsed("SQUADSENSE_DOC_OVERLAP_CHARS") {
            self.ingest.doc_overlap_chars = n;
        }
        if let Some(n) = parsed("SQUADSENSE_INGEST_CONCURRENCY") {
            self.ingest.concurrency = n;
        }
        if let Some(n) = parsed("SQUADSENSE_TOP_K") {
            self.retrieval.default_top_k = n;
        }
        if let Ok(v) = std::env::var("SQUADSENSE_LOG_LEVEL") {
            self.logging.level = v;
        }
    }
}
