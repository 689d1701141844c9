//! Ingest orchestrator: fetch, extract or split, merge, dedupe, upsert.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use squadsense_memory::document::{DocumentChunker, DocumentChunkerConfig};
use squadsense_memory::{Chunk, ChunkKind, ChunkStore, content_hash};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::error::{IngestError, ParseError};
use crate::merger::{CodeMerger, CodeMergerConfig};
use crate::registry::LanguageRegistry;
use crate::source::{SourceAdapter, SourceDocument};

const DEFAULT_UPSERT_BATCH: usize = 64;

#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub merger: CodeMergerConfig,
    pub document: DocumentChunkerConfig,
    /// Files processed in parallel.
    pub concurrency: usize,
    /// Chunks per store upsert call.
    pub upsert_batch: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            merger: CodeMergerConfig::default(),
            document: DocumentChunkerConfig::default(),
            concurrency: default_concurrency(),
            upsert_batch: DEFAULT_UPSERT_BATCH,
        }
    }
}

/// Worker count used when none is configured.
#[must_use]
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism().map_or(4, std::num::NonZero::get)
}

/// A file skipped during ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub origin: String,
    pub reason: String,
}

/// Summary of an ingest run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub files_total: usize,
    pub files_ingested: usize,
    pub units_extracted: usize,
    pub units_filtered: usize,
    pub chunks_created: usize,
    /// Chunks holding a single unit or section above budget.
    pub oversized_chunks: usize,
    /// Chunks dropped because an identical chunk with the same id was already emitted.
    pub duplicates: usize,
    pub failures: Vec<FileFailure>,
    pub duration_ms: u64,
}

/// Per-file chunking shared by all workers.
struct Chunkers {
    registry: LanguageRegistry,
    merger: CodeMerger,
    documents: DocumentChunker,
}

struct FileChunks {
    chunks: Vec<Chunk>,
    units: usize,
    filtered: usize,
}

impl Chunkers {
    fn process(&self, doc: &SourceDocument) -> Result<FileChunks, ParseError> {
        match doc.kind {
            ChunkKind::Document => Ok(FileChunks {
                chunks: self.documents.chunk(&doc.content, &doc.origin),
                units: 0,
                filtered: 0,
            }),
            ChunkKind::Code => {
                let extractor = self.registry.detect(Path::new(&doc.origin)).ok_or_else(|| {
                    ParseError::UnsupportedLanguage {
                        path: doc.origin.clone(),
                    }
                })?;
                let extraction = extractor.extract(&doc.content, &doc.origin)?;
                Ok(FileChunks {
                    chunks: self.merger.merge(&extraction.units),
                    units: extraction.units.len(),
                    filtered: extraction.filtered.len(),
                })
            }
        }
    }
}

/// Turns source documents into chunks and upserts them under a scope.
pub struct IngestPipeline {
    store: Arc<dyn ChunkStore>,
    chunkers: Arc<Chunkers>,
    config: IngestConfig,
}

impl std::fmt::Debug for IngestPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestPipeline")
            .field("registry", &self.chunkers.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl IngestPipeline {
    #[must_use]
    pub fn new(store: Arc<dyn ChunkStore>, config: IngestConfig) -> Self {
        Self::with_registry(store, LanguageRegistry::with_defaults(), config)
    }

    #[must_use]
    pub fn with_registry(
        store: Arc<dyn ChunkStore>,
        registry: LanguageRegistry,
        config: IngestConfig,
    ) -> Self {
        let chunkers = Chunkers {
            registry,
            merger: CodeMerger::new(config.merger.clone()),
            documents: DocumentChunker::new(config.document.clone()),
        };
        Self {
            store,
            chunkers: Arc::new(chunkers),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Fetch `scope` from `adapter` and ingest it.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Source`] when the adapter fails, otherwise as [`Self::ingest`].
    pub async fn ingest_from(
        &self,
        adapter: &dyn SourceAdapter,
        scope: &str,
        cancel: &CancellationToken,
    ) -> Result<IngestReport, IngestError> {
        let documents = adapter.fetch(scope).await?;
        self.ingest(scope, documents, cancel).await
    }

    /// Chunk `documents` in parallel and upsert the result under `scope`.
    ///
    /// Files that fail to parse are skipped and listed in the report.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Cancelled`] when `cancel` fires before the upsert,
    /// [`IngestError::IdentityCollision`] when two different chunks share an id,
    /// and [`IngestError::Store`] when the upsert fails. Nothing is written in
    /// the first two cases.
    pub async fn ingest(
        &self,
        scope: &str,
        documents: Vec<SourceDocument>,
        cancel: &CancellationToken,
    ) -> Result<IngestReport, IngestError> {
        let start = Instant::now();
        let mut report = IngestReport {
            files_total: documents.len(),
            ..IngestReport::default()
        };
        tracing::info!(scope, files = report.files_total, "ingest started");

        let origins: Vec<String> = documents.iter().map(|d| d.origin.clone()).collect();
        let outcomes = self.chunk_all(documents, cancel).await?;

        let mut chunks = Vec::new();
        for (origin, outcome) in origins.into_iter().zip(outcomes) {
            match outcome {
                Ok(file) => {
                    tracing::debug!(
                        file = %origin,
                        units = file.units,
                        filtered = file.filtered,
                        chunks = file.chunks.len(),
                        "file chunked"
                    );
                    report.files_ingested += 1;
                    report.units_extracted += file.units;
                    report.units_filtered += file.filtered;
                    chunks.extend(file.chunks);
                }
                Err(e) => {
                    tracing::warn!(file = %origin, error = %e, "skipping file");
                    report.failures.push(FileFailure {
                        origin,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let (chunks, duplicates) = dedupe(chunks)?;
        report.duplicates = duplicates;
        report.oversized_chunks = chunks.iter().filter(|c| c.metadata.budget_exceeded).count();

        if cancel.is_cancelled() {
            return Err(IngestError::Cancelled);
        }
        for batch in chunks.chunks(self.config.upsert_batch.max(1)) {
            report.chunks_created += self.store.upsert(scope, batch).await?;
        }

        report.duration_ms = start.elapsed().as_millis().try_into().unwrap_or(u64::MAX);
        tracing::info!(
            scope,
            files = report.files_ingested,
            failed = report.failures.len(),
            chunks = report.chunks_created,
            duration_ms = report.duration_ms,
            "ingest finished"
        );
        Ok(report)
    }

    /// Run per-file chunking on blocking workers; results are indexed by input position.
    async fn chunk_all(
        &self,
        documents: Vec<SourceDocument>,
        cancel: &CancellationToken,
    ) -> Result<Vec<Result<FileChunks, ParseError>>, IngestError> {
        let total = documents.len();
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let mut set = JoinSet::new();

        for (index, doc) in documents.into_iter().enumerate() {
            let permit = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    set.abort_all();
                    return Err(IngestError::Cancelled);
                }
                permit = Arc::clone(&semaphore).acquire_owned() => {
                    permit.map_err(|_| IngestError::Cancelled)?
                }
            };
            let chunkers = Arc::clone(&self.chunkers);
            set.spawn_blocking(move || {
                let _permit = permit;
                (index, chunkers.process(&doc))
            });
        }

        let mut slots: Vec<Option<Result<FileChunks, ParseError>>> =
            std::iter::repeat_with(|| None).take(total).collect();
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    set.abort_all();
                    return Err(IngestError::Cancelled);
                }
                joined = set.join_next() => match joined {
                    Some(result) => {
                        let (index, outcome) = result?;
                        slots[index] = Some(outcome);
                    }
                    None => break,
                }
            }
        }

        Ok(slots
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| {
                    Err(ParseError::Grammar {
                        path: String::new(),
                        reason: "worker produced no result".into(),
                    })
                })
            })
            .collect())
    }
}

fn describe(chunk: &Chunk) -> String {
    format!(
        "{}:{}-{}",
        chunk.metadata.source_file, chunk.metadata.start_line, chunk.metadata.end_line
    )
}

/// Drop exact repeats and reject distinct chunks sharing an id.
fn dedupe(chunks: Vec<Chunk>) -> Result<(Vec<Chunk>, usize), IngestError> {
    let mut seen: HashMap<String, (String, String)> = HashMap::with_capacity(chunks.len());
    let mut unique = Vec::with_capacity(chunks.len());
    let mut duplicates = 0;

    for chunk in chunks {
        let hash = content_hash(&chunk.content);
        if let Some((first_hash, first)) = seen.get(&chunk.id) {
            if *first_hash == hash {
                duplicates += 1;
                continue;
            }
            return Err(IngestError::IdentityCollision {
                id: chunk.id.clone(),
                first: first.clone(),
                second: describe(&chunk),
            });
        }
        seen.insert(chunk.id.clone(), (hash, describe(&chunk)));
        unique.push(chunk);
    }
    Ok((unique, duplicates))
}
