//! Language tags and the per-language grammar tables driving unit extraction.

use serde::{Deserialize, Serialize};

/// Supported language with its tree-sitter grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    Java,
    TypeScript,
    Tsx,
    JavaScript,
    Python,
    Rust,
    Go,
}

impl Lang {
    /// Identifier used in chunk metadata and config.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::Java => "java",
            Self::TypeScript => "typescript",
            Self::Tsx => "tsx",
            Self::JavaScript => "javascript",
            Self::Python => "python",
            Self::Rust => "rust",
            Self::Go => "go",
        }
    }

    /// Get the tree-sitter grammar. Returns `None` if the
    /// corresponding feature is not enabled.
    #[must_use]
    pub fn grammar(self) -> Option<tree_sitter::Language> {
        match self {
            #[cfg(feature = "lang-java")]
            Self::Java => Some(tree_sitter_java::LANGUAGE.into()),
            #[cfg(feature = "lang-ts")]
            Self::TypeScript => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
            #[cfg(feature = "lang-ts")]
            Self::Tsx => Some(tree_sitter_typescript::LANGUAGE_TSX.into()),
            #[cfg(feature = "lang-js")]
            Self::JavaScript => Some(tree_sitter_javascript::LANGUAGE.into()),
            #[cfg(feature = "lang-python")]
            Self::Python => Some(tree_sitter_python::LANGUAGE.into()),
            #[cfg(feature = "lang-rust")]
            Self::Rust => Some(tree_sitter_rust::LANGUAGE.into()),
            #[cfg(feature = "lang-go")]
            Self::Go => Some(tree_sitter_go::LANGUAGE.into()),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }

    #[must_use]
    pub fn spec(self) -> &'static LanguageSpec {
        match self {
            Self::Java => &JAVA,
            Self::TypeScript => &TYPESCRIPT,
            Self::Tsx => &TSX,
            Self::JavaScript => &JAVASCRIPT,
            Self::Python => &PYTHON,
            Self::Rust => &RUST,
            Self::Go => &GO,
        }
    }
}

impl std::fmt::Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Coarse classification of an extracted unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    Method,
    Function,
    Constructor,
    Other,
}

impl UnitKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Method => "method",
            Self::Function => "function",
            Self::Constructor => "constructor",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CommentSyntax {
    pub line: &'static [&'static str],
    pub block: Option<(&'static str, &'static str)>,
}

const C_STYLE: CommentSyntax = CommentSyntax {
    line: &["//"],
    block: Some(("/*", "*/")),
};

/// Grammar-level description of where units live in one language.
#[derive(Debug)]
pub struct LanguageSpec {
    pub lang: Lang,
    pub extensions: &'static [&'static str],
    /// Node kinds that are always units.
    pub units: &'static [(&'static str, UnitKind)],
    /// Anonymous function node kinds that become units when bound to a name.
    pub bound_functions: &'static [&'static str],
    /// Parent kinds that bind an anonymous function to a name, and the kind it gets.
    pub binders: &'static [(&'static str, UnitKind)],
    /// Ancestors that turn a nested function into a method.
    pub method_scopes: &'static [&'static str],
    /// Parent kinds whose span replaces the unit's own (decorated definitions).
    pub wrappers: &'static [&'static str],
    /// Method names classified as constructors.
    pub constructor_names: &'static [&'static str],
    /// Statement node kinds not ending in `_statement`.
    pub statement_extras: &'static [&'static str],
    /// Count a trailing expression of a block as a statement.
    pub counts_block_tail: bool,
    pub comments: CommentSyntax,
    pub decorator_prefixes: &'static [&'static str],
}

impl LanguageSpec {
    #[must_use]
    pub fn unit_kind(&self, node_kind: &str) -> Option<UnitKind> {
        self.units
            .iter()
            .find(|(k, _)| *k == node_kind)
            .map(|(_, kind)| *kind)
    }

    #[must_use]
    pub fn binder_kind(&self, node_kind: &str) -> Option<UnitKind> {
        self.binders
            .iter()
            .find(|(k, _)| *k == node_kind)
            .map(|(_, kind)| *kind)
    }

    #[must_use]
    pub fn is_statement(&self, node_kind: &str) -> bool {
        node_kind.ends_with("_statement") || self.statement_extras.contains(&node_kind)
    }

    #[must_use]
    pub fn is_comment_kind(node_kind: &str) -> bool {
        matches!(node_kind, "comment" | "line_comment" | "block_comment")
    }
}

pub static JAVA: LanguageSpec = LanguageSpec {
    lang: Lang::Java,
    extensions: &["java"],
    units: &[
        ("method_declaration", UnitKind::Method),
        ("constructor_declaration", UnitKind::Constructor),
        ("compact_constructor_declaration", UnitKind::Constructor),
    ],
    bound_functions: &[],
    binders: &[],
    method_scopes: &[],
    wrappers: &[],
    constructor_names: &[],
    statement_extras: &[
        "local_variable_declaration",
        "explicit_constructor_invocation",
    ],
    counts_block_tail: false,
    comments: C_STYLE,
    decorator_prefixes: &["@"],
};

const ECMA_UNITS: &[(&str, UnitKind)] = &[
    ("function_declaration", UnitKind::Function),
    ("generator_function_declaration", UnitKind::Function),
    ("method_definition", UnitKind::Method),
];

const ECMA_BOUND: &[&str] = &["arrow_function", "function_expression"];

const ECMA_BINDERS: &[(&str, UnitKind)] = &[
    ("variable_declarator", UnitKind::Function),
    ("public_field_definition", UnitKind::Method),
    ("field_definition", UnitKind::Method),
];

const ECMA_STATEMENTS: &[&str] = &["lexical_declaration", "variable_declaration"];

const ECMA: LanguageSpec = LanguageSpec {
    lang: Lang::TypeScript,
    extensions: &[],
    units: ECMA_UNITS,
    bound_functions: ECMA_BOUND,
    binders: ECMA_BINDERS,
    method_scopes: &[],
    wrappers: &[],
    constructor_names: &["constructor"],
    statement_extras: ECMA_STATEMENTS,
    counts_block_tail: false,
    comments: C_STYLE,
    decorator_prefixes: &["@"],
};

pub static TYPESCRIPT: LanguageSpec = LanguageSpec {
    lang: Lang::TypeScript,
    extensions: &["ts", "mts", "cts"],
    ..ECMA
};

pub static TSX: LanguageSpec = LanguageSpec {
    lang: Lang::Tsx,
    extensions: &["tsx"],
    ..ECMA
};

pub static JAVASCRIPT: LanguageSpec = LanguageSpec {
    lang: Lang::JavaScript,
    extensions: &["js", "jsx", "mjs", "cjs"],
    ..ECMA
};

pub static PYTHON: LanguageSpec = LanguageSpec {
    lang: Lang::Python,
    extensions: &["py", "pyi"],
    units: &[("function_definition", UnitKind::Function)],
    bound_functions: &[],
    binders: &[],
    method_scopes: &["class_definition"],
    wrappers: &["decorated_definition"],
    constructor_names: &["__init__"],
    statement_extras: &[],
    counts_block_tail: false,
    comments: CommentSyntax {
        line: &["#"],
        block: None,
    },
    decorator_prefixes: &["@"],
};

pub static RUST: LanguageSpec = LanguageSpec {
    lang: Lang::Rust,
    extensions: &["rs"],
    units: &[("function_item", UnitKind::Function)],
    bound_functions: &[],
    binders: &[],
    method_scopes: &["impl_item", "trait_item"],
    wrappers: &[],
    constructor_names: &["new"],
    statement_extras: &["let_declaration"],
    counts_block_tail: true,
    comments: C_STYLE,
    decorator_prefixes: &["#[", "#!["],
};

pub static GO: LanguageSpec = LanguageSpec {
    lang: Lang::Go,
    extensions: &["go"],
    units: &[
        ("function_declaration", UnitKind::Function),
        ("method_declaration", UnitKind::Method),
    ],
    bound_functions: &[],
    binders: &[],
    method_scopes: &[],
    wrappers: &[],
    constructor_names: &[],
    statement_extras: &[
        "short_var_declaration",
        "var_declaration",
        "const_declaration",
    ],
    counts_block_tail: false,
    comments: C_STYLE,
    decorator_prefixes: &[],
};

/// Every language spec, in lookup order.
pub static LANGUAGES: &[&LanguageSpec] =
    &[&JAVA, &TYPESCRIPT, &TSX, &JAVASCRIPT, &PYTHON, &RUST, &GO];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for spec in LANGUAGES {
            for ext in spec.extensions {
                assert!(seen.insert(*ext), "duplicate extension {ext}");
            }
        }
    }

    #[test]
    fn spec_lang_matches_tag() {
        for spec in LANGUAGES {
            assert_eq!(spec.lang.spec().lang, spec.lang);
        }
    }

    #[test]
    fn derived_specs_keep_their_identity() {
        assert_eq!(TSX.lang, Lang::Tsx);
        assert_eq!(TSX.extensions, &["tsx"]);
        assert_eq!(JAVASCRIPT.unit_kind("method_definition"), Some(UnitKind::Method));
    }

    #[test]
    fn unit_kind_lookup() {
        assert_eq!(
            JAVA.unit_kind("constructor_declaration"),
            Some(UnitKind::Constructor)
        );
        assert_eq!(JAVA.unit_kind("class_declaration"), None);
        assert_eq!(GO.unit_kind("method_declaration"), Some(UnitKind::Method));
    }

    #[test]
    fn statement_kinds() {
        assert!(JAVA.is_statement("return_statement"));
        assert!(JAVA.is_statement("local_variable_declaration"));
        assert!(!JAVA.is_statement("block"));
        assert!(RUST.is_statement("let_declaration"));
        assert!(TYPESCRIPT.is_statement("lexical_declaration"));
    }

    #[test]
    fn grammar_returns_some_for_enabled_features() {
        #[cfg(feature = "lang-java")]
        assert!(Lang::Java.grammar().is_some());
        #[cfg(feature = "lang-ts")]
        {
            assert!(Lang::TypeScript.grammar().is_some());
            assert!(Lang::Tsx.grammar().is_some());
        }
        #[cfg(feature = "lang-js")]
        assert!(Lang::JavaScript.grammar().is_some());
        #[cfg(feature = "lang-python")]
        assert!(Lang::Python.grammar().is_some());
        #[cfg(feature = "lang-rust")]
        assert!(Lang::Rust.grammar().is_some());
        #[cfg(feature = "lang-go")]
        assert!(Lang::Go.grammar().is_some());
    }

    #[test]
    fn lang_id_roundtrip() {
        for spec in LANGUAGES {
            let lang = spec.lang;
            assert!(!lang.id().is_empty());
            assert_eq!(lang.to_string(), lang.id());
        }
    }

    #[test]
    fn unit_kind_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&UnitKind::Constructor).unwrap(),
            "\"constructor\""
        );
        assert_eq!(UnitKind::Method.as_str(), "method");
    }
}
