//! Source adapters supplying raw content to the ingest pipeline.

use std::path::{Path, PathBuf};

use squadsense_memory::document::TextLoader;
use squadsense_memory::{BoxFuture, ChunkKind};

use crate::error::{IndexError, Result};
use crate::registry::LanguageRegistry;

/// Raw content of one artifact plus its declared kind and origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub content: String,
    /// Opaque origin identifier, used as `source_file` in chunk metadata.
    pub origin: String,
    pub kind: ChunkKind,
}

impl SourceDocument {
    #[must_use]
    pub fn code(origin: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            origin: origin.into(),
            kind: ChunkKind::Code,
        }
    }

    #[must_use]
    pub fn document(origin: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            origin: origin.into(),
            kind: ChunkKind::Document,
        }
    }
}

/// Capability supplying the artifacts of one scope.
pub trait SourceAdapter: Send + Sync {
    /// Fetch every artifact of `scope`, in a deterministic order.
    fn fetch<'a>(&'a self, scope: &'a str) -> BoxFuture<'a, Result<Vec<SourceDocument>>>;
}

/// Local filesystem adapter walking a directory tree.
#[derive(Debug, Clone)]
pub struct FsSourceAdapter {
    root: PathBuf,
    registry: LanguageRegistry,
    loader: TextLoader,
}

impl FsSourceAdapter {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            registry: LanguageRegistry::with_defaults(),
            loader: TextLoader::default(),
        }
    }

    #[must_use]
    pub fn with_registry(mut self, registry: LanguageRegistry) -> Self {
        self.registry = registry;
        self
    }

    #[must_use]
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.loader.max_file_size = bytes;
        self
    }

    fn classify(&self, path: &Path) -> Option<ChunkKind> {
        if self.registry.is_code(path) {
            Some(ChunkKind::Code)
        } else if TextLoader::is_document(path) {
            Some(ChunkKind::Document)
        } else {
            None
        }
    }

    /// Directory walked for `scope`: `root/scope` when it exists, otherwise `root`.
    fn scope_root(&self, scope: &str) -> PathBuf {
        let candidate = self.root.join(scope);
        if !scope.is_empty() && candidate.is_dir() {
            candidate
        } else {
            self.root.clone()
        }
    }

    async fn fetch_dir(&self, scope: &str) -> Result<Vec<SourceDocument>> {
        if !self.root.is_dir() {
            return Err(IndexError::Other(format!(
                "source root {} is not a directory",
                self.root.display()
            )));
        }
        let dir = self.scope_root(scope);

        let mut entries: Vec<(String, PathBuf, ChunkKind)> = ignore::WalkBuilder::new(&dir)
            .hidden(true)
            .git_ignore(true)
            .build()
            .flatten()
            .filter(|e| e.file_type().is_some_and(|ft| ft.is_file()))
            .filter_map(|e| {
                let kind = self.classify(e.path())?;
                let rel = e
                    .path()
                    .strip_prefix(&self.root)
                    .unwrap_or(e.path())
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                Some((rel, e.into_path(), kind))
            })
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        tracing::debug!(scope, root = %dir.display(), files = entries.len(), "source walk complete");

        let mut documents = Vec::with_capacity(entries.len());
        for (origin, path, kind) in entries {
            match self.loader.load(&path).await {
                Ok(content) => documents.push(SourceDocument {
                    content,
                    origin,
                    kind,
                }),
                Err(e) => tracing::warn!(file = %origin, error = %e, "skipping unreadable source"),
            }
        }
        Ok(documents)
    }
}

impl SourceAdapter for FsSourceAdapter {
    fn fetch<'a>(&'a self, scope: &'a str) -> BoxFuture<'a, Result<Vec<SourceDocument>>> {
        Box::pin(self.fetch_dir(scope))
    }
}

/// Adapter over content already held in memory, returned for every scope.
#[derive(Debug, Clone, Default)]
pub struct StaticSourceAdapter {
    documents: Vec<SourceDocument>,
}

impl StaticSourceAdapter {
    #[must_use]
    pub fn new(documents: Vec<SourceDocument>) -> Self {
        Self { documents }
    }
}

impl SourceAdapter for StaticSourceAdapter {
    fn fetch<'a>(&'a self, _scope: &'a str) -> BoxFuture<'a, Result<Vec<SourceDocument>>> {
        let documents = self.documents.clone();
        Box::pin(async move { Ok(documents) })
    }
}
