//! Extension-based dispatch from files to unit extractors.

use std::path::Path;
use std::sync::Arc;

use crate::extractor::{TreeSitterExtractor, UnitExtractor};
use crate::languages::LANGUAGES;

/// Table of extractors keyed by file extension.
#[derive(Clone, Default)]
pub struct LanguageRegistry {
    extractors: Vec<Arc<dyn UnitExtractor>>,
}

impl std::fmt::Debug for LanguageRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.extractors.iter().map(|e| e.lang()))
            .finish()
    }
}

impl LanguageRegistry {
    /// Empty registry; every file is unsupported.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with a tree-sitter extractor for every compiled-in grammar.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for spec in LANGUAGES {
            if spec.lang.grammar().is_some() {
                registry.register(Arc::new(TreeSitterExtractor::new(spec)));
            }
        }
        registry
    }

    /// Add an extractor. Later registrations win on shared extensions.
    pub fn register(&mut self, extractor: Arc<dyn UnitExtractor>) {
        self.extractors.push(extractor);
    }

    /// Extractor for `path`, matched on its lowercased extension.
    #[must_use]
    pub fn detect(&self, path: &Path) -> Option<Arc<dyn UnitExtractor>> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        self.extractors
            .iter()
            .rev()
            .find(|e| e.extensions().contains(&ext.as_str()))
            .cloned()
    }

    #[must_use]
    pub fn is_code(&self, path: &Path) -> bool {
        self.detect(path).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use crate::extractor::Extraction;
    use crate::languages::Lang;

    struct FakeJava;

    impl UnitExtractor for FakeJava {
        fn lang(&self) -> Lang {
            Lang::Java
        }

        fn extensions(&self) -> &[&'static str] {
            &["java"]
        }

        fn extract(&self, _source: &str, _file_path: &str) -> Result<Extraction, ParseError> {
            Ok(Extraction::default())
        }
    }

    #[test]
    fn detect_by_extension() {
        let registry = LanguageRegistry::with_defaults();
        #[cfg(feature = "lang-java")]
        assert_eq!(
            registry.detect(Path::new("src/Vault.java")).unwrap().lang(),
            Lang::Java
        );
        #[cfg(feature = "lang-ts")]
        assert_eq!(
            registry.detect(Path::new("ui/App.TSX")).unwrap().lang(),
            Lang::Tsx
        );
        #[cfg(feature = "lang-python")]
        assert_eq!(
            registry.detect(Path::new("tool.py")).unwrap().lang(),
            Lang::Python
        );
        assert!(registry.detect(Path::new("README.md")).is_none());
        assert!(registry.detect(Path::new("Makefile")).is_none());
    }

    #[test]
    fn empty_registry_supports_nothing() {
        assert!(!LanguageRegistry::new().is_code(Path::new("a.rs")));
    }

    #[test]
    fn later_registration_wins() {
        let mut registry = LanguageRegistry::new();
        registry.register(Arc::new(TreeSitterExtractor::new(Lang::Java.spec())));
        registry.register(Arc::new(FakeJava));

        let extractor = registry.detect(Path::new("A.java")).unwrap();
        let out = extractor
            .extract("class A { void run() { a(); } }", "A.java")
            .unwrap();
        assert!(out.units.is_empty());
    }
}
