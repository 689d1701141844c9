//! Scope-isolated retrieval over the chunk store.

use std::collections::BTreeSet;
use std::fmt::Write;
use std::sync::Arc;

use squadsense_memory::{ChunkKind, ChunkStore, ScoredChunk};

use crate::error::Result;

/// Nearest-neighbour query facade with deterministic ordering.
#[derive(Clone)]
pub struct Retriever {
    store: Arc<dyn ChunkStore>,
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever").finish_non_exhaustive()
    }
}

impl Retriever {
    #[must_use]
    pub fn new(store: Arc<dyn ChunkStore>) -> Self {
        Self { store }
    }

    /// Top `top_k` chunks of `scope` nearest to `text`.
    ///
    /// Ordered by score descending, ties by id ascending. `top_k == 0` returns
    /// an empty result without querying the store. An unknown scope also
    /// returns empty; use [`Self::list_scopes`] to tell it apart from no match.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding or the store search fails.
    pub async fn query(
        &self,
        scope: &str,
        text: &str,
        top_k: usize,
        kind: Option<ChunkKind>,
    ) -> Result<Vec<ScoredChunk>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let mut hits = self.store.query(scope, text, top_k, kind).await?;
        hits.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.chunk.id.cmp(&b.chunk.id))
        });
        hits.truncate(top_k);
        tracing::debug!(scope, top_k, hits = hits.len(), "retrieval complete");
        Ok(hits)
    }

    /// # Errors
    ///
    /// See [`Self::query`].
    pub async fn search_code(&self, scope: &str, text: &str, top_k: usize) -> Result<Vec<ScoredChunk>> {
        self.query(scope, text, top_k, Some(ChunkKind::Code)).await
    }

    /// # Errors
    ///
    /// See [`Self::query`].
    pub async fn search_docs(&self, scope: &str, text: &str, top_k: usize) -> Result<Vec<ScoredChunk>> {
        self.query(scope, text, top_k, Some(ChunkKind::Document)).await
    }

    /// Scopes with at least one ingested chunk.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot list its collections.
    pub async fn list_scopes(&self) -> Result<BTreeSet<String>> {
        Ok(self.store.list_scopes().await?)
    }
}

/// Render retrieved chunks as a citation block for downstream prompts.
#[must_use]
pub fn format_as_context(chunks: &[ScoredChunk]) -> String {
    if chunks.is_empty() {
        return String::new();
    }

    let mut out = String::from("<knowledge_context>\n");
    for hit in chunks {
        let meta = &hit.chunk.metadata;
        let _ = writeln!(
            out,
            "  <chunk id=\"{}\" kind=\"{}\" source=\"{}\" lines=\"{}-{}\" score=\"{:.2}\">",
            escape_attr(&hit.chunk.id),
            hit.chunk.kind,
            escape_attr(&meta.source_file),
            meta.start_line,
            meta.end_line,
            hit.score,
        );
        out.push_str(&hit.chunk.content);
        out.push_str("\n  </chunk>\n");
    }
    out.push_str("</knowledge_context>");
    out
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            _ => out.push(c),
        }
    }
    out
}
