//! Syntax-tree unit extraction with strict comment attachment.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tree_sitter::{Node, Parser};

use crate::error::ParseError;
use crate::filter::is_trivial_accessor;
use crate::languages::{Lang, LanguageSpec, UnitKind};
use crate::registry::LanguageRegistry;

/// A function-level unit extracted from one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceUnit {
    pub name: String,
    pub language: Lang,
    /// Exact source text of the unit.
    pub body: String,
    /// Comment block ending on the line directly above `start_line`.
    pub doc_comment: Option<String>,
    /// 1-based, inclusive.
    pub start_line: usize,
    /// 1-based, inclusive.
    pub end_line: usize,
    pub file_path: String,
    pub unit_kind: UnitKind,
    /// A decorator or annotation line sits directly above the unit, outside its span.
    pub decorator_adjacent: bool,
}

impl SourceUnit {
    /// First line covered by the unit including its doc comment.
    #[must_use]
    pub fn span_start_line(&self) -> usize {
        let doc_lines = self.doc_comment.as_deref().map_or(0, |d| d.lines().count());
        self.start_line.saturating_sub(doc_lines).max(1)
    }

    /// Text the merger embeds: doc comment and body joined by a newline.
    #[must_use]
    pub fn merged_text(&self) -> String {
        match &self.doc_comment {
            Some(doc) => format!("{doc}\n{}", self.body),
            None => self.body.clone(),
        }
    }
}

/// Output of one extraction call.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub units: Vec<SourceUnit>,
    /// Names of units dropped by the trivial-accessor filter.
    pub filtered: Vec<String>,
}

/// Strategy turning one language's source into units.
pub trait UnitExtractor: Send + Sync {
    fn lang(&self) -> Lang;

    fn extensions(&self) -> &[&'static str];

    /// Extract units from `source` in file order.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] for empty input, a missing grammar or a syntax error.
    fn extract(&self, source: &str, file_path: &str) -> Result<Extraction, ParseError>;
}

/// [`UnitExtractor`] driven by a tree-sitter grammar and a [`LanguageSpec`] table.
#[derive(Debug, Clone, Copy)]
pub struct TreeSitterExtractor {
    spec: &'static LanguageSpec,
    filter_trivial: bool,
}

impl TreeSitterExtractor {
    #[must_use]
    pub fn new(spec: &'static LanguageSpec) -> Self {
        Self {
            spec,
            filter_trivial: true,
        }
    }

    /// Keep trivial accessors instead of dropping them.
    #[must_use]
    pub fn without_filter(mut self) -> Self {
        self.filter_trivial = false;
        self
    }
}

impl UnitExtractor for TreeSitterExtractor {
    fn lang(&self) -> Lang {
        self.spec.lang
    }

    fn extensions(&self) -> &[&'static str] {
        self.spec.extensions
    }

    fn extract(&self, source: &str, file_path: &str) -> Result<Extraction, ParseError> {
        let spec = self.spec;
        if source.trim().is_empty() {
            return Err(ParseError::EmptyInput {
                path: file_path.to_owned(),
            });
        }

        let grammar = spec.lang.grammar().ok_or_else(|| ParseError::Grammar {
            path: file_path.to_owned(),
            reason: format!("no grammar compiled in for {}", spec.lang),
        })?;
        let mut parser = Parser::new();
        parser
            .set_language(&grammar)
            .map_err(|e| ParseError::Grammar {
                path: file_path.to_owned(),
                reason: e.to_string(),
            })?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| ParseError::Grammar {
                path: file_path.to_owned(),
                reason: "parser produced no tree".to_owned(),
            })?;

        let root = tree.root_node();
        if root.has_error() {
            let (line, column) = first_error_position(root);
            return Err(ParseError::Syntax {
                path: file_path.to_owned(),
                line,
                column,
            });
        }

        let lines: Vec<&str> = source.lines().collect();
        let mut out = Extraction::default();
        let mut cursor = root.walk();

        'walk: loop {
            let node = cursor.node();
            if node.is_named()
                && let Some(unit) = unit_match(node, spec, source)
            {
                self.visit_unit(&unit, source, file_path, &lines, &mut out);
            }

            if cursor.goto_first_child() {
                continue;
            }
            while !cursor.goto_next_sibling() {
                if !cursor.goto_parent() {
                    break 'walk;
                }
            }
        }

        out.units.sort_by_key(|u| u.start_line);
        Ok(out)
    }
}

impl TreeSitterExtractor {
    fn visit_unit(
        &self,
        unit: &UnitMatch<'_>,
        source: &str,
        file_path: &str,
        lines: &[&str],
        out: &mut Extraction,
    ) {
        let body = &source[unit.span.byte_range()];
        if body.trim().is_empty() {
            return;
        }
        if self.filter_trivial && is_trivial_accessor(&unit.name, unit.core, self.spec) {
            tracing::trace!(file = file_path, unit = %unit.name, "dropped trivial accessor");
            out.filtered.push(unit.name.clone());
            return;
        }

        let (start_line, end_line) = line_span(unit.span);
        let attachment = attach_comment(lines, start_line, self.spec);
        if attachment.decorator_adjacent {
            tracing::debug!(
                file = file_path,
                unit = %unit.name,
                line = start_line,
                "decorator directly above unit, comment left unattached"
            );
        }

        out.units.push(SourceUnit {
            name: unit.name.clone(),
            language: self.spec.lang,
            body: body.to_owned(),
            doc_comment: attachment.doc,
            start_line,
            end_line,
            file_path: file_path.to_owned(),
            unit_kind: unit.kind,
            decorator_adjacent: attachment.decorator_adjacent,
        });
    }
}

/// Extract units from one file, picking the extractor by extension.
///
/// # Errors
///
/// Returns [`ParseError::UnsupportedLanguage`] when no compiled-in grammar
/// handles the extension, otherwise whatever the extractor reports.
pub fn extract_units(source: &str, file_path: &str) -> Result<Vec<SourceUnit>, ParseError> {
    let extractor = LanguageRegistry::with_defaults()
        .detect(Path::new(file_path))
        .ok_or_else(|| ParseError::UnsupportedLanguage {
            path: file_path.to_owned(),
        })?;
    extractor.extract(source, file_path).map(|e| e.units)
}

/// A matched unit: `core` is the function node, `span` the text range emitted.
pub(crate) struct UnitMatch<'t> {
    pub(crate) core: Node<'t>,
    pub(crate) span: Node<'t>,
    pub(crate) name: String,
    pub(crate) kind: UnitKind,
}

pub(crate) fn unit_match<'t>(
    node: Node<'t>,
    spec: &LanguageSpec,
    source: &str,
) -> Option<UnitMatch<'t>> {
    if let Some(base) = spec.unit_kind(node.kind()) {
        let name = field_text(node, "name", source).unwrap_or_default();
        let kind = refine_kind(node, base, &name, spec);
        let span = node
            .parent()
            .filter(|p| spec.wrappers.contains(&p.kind()))
            .unwrap_or(node);
        return Some(UnitMatch {
            core: node,
            span,
            name,
            kind,
        });
    }

    let (binder, base) = bound_binder(node, spec)?;
    let name = field_text(binder, "name", source)
        .or_else(|| field_text(binder, "property", source))
        .unwrap_or_default();
    let span = if base == UnitKind::Function {
        binder
            .parent()
            .filter(|d| spec.is_statement(d.kind()))
            .unwrap_or(binder)
    } else {
        binder
    };
    let kind = refine_kind(node, base, &name, spec);
    Some(UnitMatch {
        core: node,
        span,
        name,
        kind,
    })
}

/// Whether `node` would be emitted as a unit, ignoring its name.
pub(crate) fn is_unit_node(node: Node<'_>, spec: &LanguageSpec) -> bool {
    spec.unit_kind(node.kind()).is_some() || bound_binder(node, spec).is_some()
}

/// Binder of an anonymous function assigned to a name, with its unit kind.
fn bound_binder<'t>(node: Node<'t>, spec: &LanguageSpec) -> Option<(Node<'t>, UnitKind)> {
    if !spec.bound_functions.contains(&node.kind()) {
        return None;
    }
    let parent = node.parent()?;
    let kind = spec.binder_kind(parent.kind())?;
    let value = parent.child_by_field_name("value")?;
    (value.id() == node.id()).then_some((parent, kind))
}

fn refine_kind(node: Node<'_>, base: UnitKind, name: &str, spec: &LanguageSpec) -> UnitKind {
    let mut kind = base;
    if base == UnitKind::Function && !spec.method_scopes.is_empty() {
        let mut cur = node.parent();
        while let Some(p) = cur {
            if spec.method_scopes.contains(&p.kind()) {
                kind = UnitKind::Method;
                break;
            }
            if spec.unit_kind(p.kind()).is_some() {
                break;
            }
            cur = p.parent();
        }
    }
    if kind == UnitKind::Method && spec.constructor_names.contains(&name) {
        kind = UnitKind::Constructor;
    }
    kind
}

fn field_text(node: Node<'_>, field: &str, source: &str) -> Option<String> {
    node.child_by_field_name(field)
        .map(|n| source[n.byte_range()].to_string())
}

/// 1-based inclusive line span of a node.
fn line_span(node: Node<'_>) -> (usize, usize) {
    let start = node.start_position();
    let end = node.end_position();
    let start_line = start.row + 1;
    // A node ending at column 0 stops before that row's first character.
    let end_line = if end.column == 0 && end.row > start.row {
        end.row
    } else {
        end.row + 1
    };
    (start_line, end_line)
}

/// 1-based line and column of the first `ERROR` or `MISSING` node in pre-order.
fn first_error_position(root: Node<'_>) -> (usize, usize) {
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.is_error() || node.is_missing() {
            let pos = node.start_position();
            return (pos.row + 1, pos.column + 1);
        }
        if node.has_error() && cursor.goto_first_child() {
            continue;
        }
        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                let pos = root.start_position();
                return (pos.row + 1, pos.column + 1);
            }
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Attachment {
    pub(crate) doc: Option<String>,
    pub(crate) decorator_adjacent: bool,
}

/// Find the comment block ending on the line directly above `start_line`.
///
/// A blank line or any non-comment line breaks the association. A decorator
/// line in that position is reported instead of skipped.
pub(crate) fn attach_comment(lines: &[&str], start_line: usize, spec: &LanguageSpec) -> Attachment {
    if start_line < 2 {
        return Attachment::default();
    }
    let above = start_line - 2;
    let Some(line) = lines.get(above) else {
        return Attachment::default();
    };
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Attachment::default();
    }

    if spec
        .decorator_prefixes
        .iter()
        .any(|p| trimmed.starts_with(p))
    {
        return Attachment {
            doc: None,
            decorator_adjacent: true,
        };
    }

    let is_line_comment = |l: &str| spec.comments.line.iter().any(|p| l.trim().starts_with(p));

    let first = if is_line_comment(line) {
        let mut first = above;
        while first > 0 && is_line_comment(lines[first - 1]) {
            first -= 1;
        }
        Some(first)
    } else if let Some((open, close)) = spec.comments.block
        && trimmed.ends_with(close)
        && (trimmed.starts_with(open) || trimmed.starts_with('*'))
    {
        block_comment_start(lines, above, open, close)
    } else {
        None
    };

    Attachment {
        doc: first.map(|first| {
            lines[first..=above]
                .iter()
                .map(|l| l.trim_end())
                .collect::<Vec<_>>()
                .join("\n")
        }),
        decorator_adjacent: false,
    }
}

/// Opening line of the block comment closing on `close_line`.
///
/// `None` when a line above holds code before the opener or belongs to an
/// earlier comment.
fn block_comment_start(
    lines: &[&str],
    close_line: usize,
    open: &str,
    close: &str,
) -> Option<usize> {
    for (i, line) in lines.get(..=close_line)?.iter().enumerate().rev() {
        let trimmed = line.trim();
        if i != close_line && trimmed.contains(close) {
            return None;
        }
        if trimmed.starts_with(open) {
            return Some(i);
        }
        if trimmed.contains(open) {
            return None;
        }
    }
    None
}
