//! Trivial accessor detection.

use tree_sitter::Node;

use crate::extractor::is_unit_node;
use crate::languages::{Lang, LanguageSpec};

/// Units with an accessor name and at most this many statements are dropped.
pub const MAX_ACCESSOR_STATEMENTS: usize = 2;

const ACCESSOR_PREFIXES: &[&str] = &["get", "set", "is"];

/// Whether `name` starts with `get`, `set` or `is` at a word boundary.
///
/// The prefix match is case-insensitive. The next character must be an
/// uppercase letter, an underscore, a digit, or the end of the name, so
/// `getBalance`, `set_value` and `is` qualify while `settle` and `isolate`
/// do not.
#[must_use]
pub fn has_accessor_prefix(name: &str) -> bool {
    ACCESSOR_PREFIXES.iter().any(|prefix| {
        let Some(head) = name.get(..prefix.len()) else {
            return false;
        };
        if !head.eq_ignore_ascii_case(prefix) {
            return false;
        }
        name[prefix.len()..]
            .chars()
            .next()
            .is_none_or(|c| c.is_uppercase() || c == '_' || c.is_ascii_digit())
    })
}

/// Count statement nodes in the unit rooted at `core`, skipping nested units.
#[must_use]
pub fn count_statements(core: Node<'_>, spec: &LanguageSpec) -> usize {
    let docstring = leading_docstring(core, spec).map(|n| n.id());
    let mut count = 0;
    let mut stack: Vec<Node<'_>> = named_children(core).collect();

    while let Some(node) = stack.pop() {
        if is_unit_node(node, spec) || docstring == Some(node.id()) {
            continue;
        }
        if spec.is_statement(node.kind()) {
            count += 1;
        }
        stack.extend(named_children(node));
    }

    count + implicit_tail(core, spec)
}

/// Whether the unit is a getter or setter too small to carry meaning.
#[must_use]
pub fn is_trivial_accessor(name: &str, core: Node<'_>, spec: &LanguageSpec) -> bool {
    has_accessor_prefix(name) && count_statements(core, spec) <= MAX_ACCESSOR_STATEMENTS
}

fn named_children<'t>(node: Node<'t>) -> impl Iterator<Item = Node<'t>> {
    let child_count = u32::try_from(node.named_child_count()).unwrap_or(u32::MAX);
    (0..child_count).filter_map(move |i| node.named_child(i))
}

/// Python docstring: a bare string as the first statement of the body.
fn leading_docstring<'t>(core: Node<'t>, spec: &LanguageSpec) -> Option<Node<'t>> {
    if spec.lang != Lang::Python {
        return None;
    }
    let first = named_children(core.child_by_field_name("body")?)
        .find(|n| !LanguageSpec::is_comment_kind(n.kind()))?;
    let is_doc = first.kind() == "expression_statement"
        && first.named_child_count() == 1
        && first.named_child(0).is_some_and(|n| n.kind() == "string");
    is_doc.then_some(first)
}

/// Expression bodies without statement nodes still count as one statement.
fn implicit_tail(core: Node<'_>, spec: &LanguageSpec) -> usize {
    let Some(body) = core.child_by_field_name("body") else {
        return 0;
    };

    if spec.counts_block_tail {
        let tail = named_children(body)
            .filter(|n| !LanguageSpec::is_comment_kind(n.kind()))
            .last();
        return usize::from(tail.is_some_and(|n| !spec.is_statement(n.kind())));
    }

    if core.kind() == "arrow_function" && body.kind() != "statement_block" {
        return 1;
    }
    0
}
