mod env;
mod types;

#[cfg(test)]
mod tests;

pub use types::*;

use std::path::Path;

use anyhow::{Context, bail};
use squadsense_index::{CodeMergerConfig, IngestConfig};
use squadsense_memory::document::DocumentChunkerConfig;

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed,
    /// or if the resulting configuration is invalid.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject budgets and sizes the chunkers cannot work with.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        let ingest = &self.ingest;
        if ingest.code_max_chars == 0 {
            bail!("ingest.code_max_chars must be positive");
        }
        if ingest.doc_max_chars == 0 {
            bail!("ingest.doc_max_chars must be positive");
        }
        if ingest.doc_overlap_chars >= ingest.doc_max_chars {
            bail!(
                "ingest.doc_overlap_chars ({}) must be smaller than ingest.doc_max_chars ({})",
                ingest.doc_overlap_chars,
                ingest.doc_max_chars
            );
        }
        if ingest.concurrency == 0 {
            bail!("ingest.concurrency must be positive");
        }
        if ingest.upsert_batch == 0 {
            bail!("ingest.upsert_batch must be positive");
        }
        if self.store.embedding_dimensions == 0 {
            bail!("store.embedding_dimensions must be positive");
        }
        Ok(())
    }

    /// Pipeline settings derived from the `[ingest]` section.
    #[must_use]
    pub fn ingest_config(&self) -> IngestConfig {
        IngestConfig {
            merger: CodeMergerConfig {
                max_chars: self.ingest.code_max_chars,
            },
            document: DocumentChunkerConfig {
                max_chars: self.ingest.doc_max_chars,
                overlap_chars: self.ingest.doc_overlap_chars,
            },
            concurrency: self.ingest.concurrency,
            upsert_batch: self.ingest.upsert_batch,
        }
    }
}
