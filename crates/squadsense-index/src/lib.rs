//! Syntax-tree unit extraction, chunk merging, ingestion and retrieval.
//!
//! Source files are parsed with tree-sitter into function-level units,
//! trivial accessors are filtered out, units are packed into budgeted code
//! chunks, and documents are split structurally. The [`IngestPipeline`]
//! upserts the result per scope and the [`Retriever`] queries it back.

pub mod error;
pub mod extractor;
pub mod filter;
pub mod indexer;
pub mod languages;
pub mod merger;
pub mod registry;
pub mod retriever;
pub mod source;

pub use error::{IndexError, IngestError, ParseError, Result};
pub use extractor::{Extraction, SourceUnit, TreeSitterExtractor, UnitExtractor, extract_units};
pub use indexer::{FileFailure, IngestConfig, IngestPipeline, IngestReport};
pub use languages::{Lang, LanguageSpec, UnitKind};
pub use merger::{CodeMerger, CodeMergerConfig};
pub use registry::LanguageRegistry;
pub use retriever::{Retriever, format_as_context};
pub use source::{FsSourceAdapter, SourceAdapter, SourceDocument, StaticSourceAdapter};
