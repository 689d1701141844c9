//! Greedy packing of extracted units into budgeted code chunks.

use squadsense_memory::{Chunk, ChunkKind, ChunkMetadata};

use crate::extractor::SourceUnit;

/// Joins consecutive units inside one chunk. Counted against the budget.
pub const UNIT_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone)]
pub struct CodeMergerConfig {
    pub max_chars: usize,
}

impl Default for CodeMergerConfig {
    fn default() -> Self {
        Self { max_chars: 2048 }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CodeMerger {
    config: CodeMergerConfig,
}

struct Buffer<'u> {
    units: Vec<&'u SourceUnit>,
    chars: usize,
}

impl CodeMerger {
    #[must_use]
    pub fn new(config: CodeMergerConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &CodeMergerConfig {
        &self.config
    }

    /// Pack `units` into chunks, one file at a time, in file order.
    ///
    /// A unit longer than the budget is emitted whole as its own chunk and
    /// flagged with `budget_exceeded`.
    #[must_use]
    pub fn merge(&self, units: &[SourceUnit]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for mut group in group_by_file(units) {
            group.sort_by_key(|u| u.start_line);
            self.merge_file(&group, &mut chunks);
        }
        chunks
    }

    fn merge_file(&self, units: &[&SourceUnit], out: &mut Vec<Chunk>) {
        let max = self.config.max_chars;
        let sep = UNIT_SEPARATOR.chars().count();
        let mut buffer = Buffer {
            units: Vec::new(),
            chars: 0,
        };

        for &unit in units {
            let unit_chars = unit.merged_text().chars().count();
            if !buffer.units.is_empty() && buffer.chars + sep + unit_chars > max {
                out.push(self.close(&buffer));
                buffer.units.clear();
                buffer.chars = 0;
            }
            if !buffer.units.is_empty() {
                buffer.chars += sep;
            }
            buffer.units.push(unit);
            buffer.chars += unit_chars;
        }

        if !buffer.units.is_empty() {
            out.push(self.close(&buffer));
        }
    }

    fn close(&self, buffer: &Buffer<'_>) -> Chunk {
        let first = buffer.units[0];
        let content = buffer
            .units
            .iter()
            .map(|u| u.merged_text())
            .collect::<Vec<_>>()
            .join(UNIT_SEPARATOR);

        let start_line = first.span_start_line();
        let end_line = buffer
            .units
            .iter()
            .map(|u| u.end_line)
            .max()
            .unwrap_or(first.end_line);

        let mut metadata = ChunkMetadata::new(&first.file_path, ChunkKind::Code, start_line, end_line);
        metadata.language = Some(first.language.id().to_owned());
        metadata.unit_names = buffer.units.iter().map(|u| u.name.clone()).collect();
        metadata.decorator_adjacent = buffer.units.iter().any(|u| u.decorator_adjacent);
        metadata.budget_exceeded = buffer.chars > self.config.max_chars;

        if metadata.budget_exceeded {
            tracing::debug!(
                file = %first.file_path,
                unit = %first.name,
                chars = buffer.chars,
                max_chars = self.config.max_chars,
                "unit exceeds chunk budget, kept whole"
            );
        }

        Chunk::new(content, metadata)
    }
}

/// Group units by `file_path`, keeping first-appearance order of files.
fn group_by_file(units: &[SourceUnit]) -> Vec<Vec<&SourceUnit>> {
    let mut groups: Vec<Vec<&SourceUnit>> = Vec::new();
    for unit in units {
        match groups
            .iter_mut()
            .find(|g| g[0].file_path == unit.file_path)
        {
            Some(group) => group.push(unit),
            None => groups.push(vec![unit]),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::languages::{Lang, UnitKind};

    fn unit(file: &str, name: &str, start: usize, body_chars: usize) -> SourceUnit {
        SourceUnit {
            name: name.to_owned(),
            language: Lang::Java,
            body: "x".repeat(body_chars),
            doc_comment: None,
            start_line: start,
            end_line: start + 4,
            file_path: file.to_owned(),
            unit_kind: UnitKind::Method,
            decorator_adjacent: false,
        }
    }

    fn merger(max_chars: usize) -> CodeMerger {
        CodeMerger::new(CodeMergerConfig { max_chars })
    }

    #[test]
    fn four_halves_pack_into_two() {
        let units: Vec<_> = (0..4)
            .map(|i| unit("A.java", &format!("m{i}"), 1 + i * 10, 500))
            .collect();
        let chunks = merger(1200).merge(&units);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].char_len(), 1002);
        assert_eq!(chunks[1].char_len(), 1002);
        assert_eq!(chunks[0].metadata.unit_names, vec!["m0", "m1"]);
        assert_eq!(chunks[1].metadata.unit_names, vec!["m2", "m3"]);
        assert_eq!(
            (chunks[0].metadata.start_line, chunks[0].metadata.end_line),
            (1, 15)
        );
        assert!(chunks.iter().all(|c| !c.metadata.budget_exceeded));
    }

    #[test]
    fn oversized_unit_kept_whole() {
        let units = vec![
            unit("A.java", "small", 1, 100),
            unit("A.java", "huge", 10, 3000),
            unit("A.java", "tail", 40, 100),
        ];
        let chunks = merger(2048).merge(&units);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1].content, "x".repeat(3000));
        assert!(chunks[1].metadata.budget_exceeded);
        assert!(!chunks[0].metadata.budget_exceeded);
        assert!(!chunks[2].metadata.budget_exceeded);
    }

    #[test]
    fn doc_comment_precedes_body() {
        let mut u = unit("A.java", "run", 5, 10);
        u.doc_comment = Some("/** Runs. */".into());
        let chunks = merger(2048).merge(&[u]);

        assert_eq!(chunks[0].content, format!("/** Runs. */\n{}", "x".repeat(10)));
        assert_eq!(chunks[0].metadata.start_line, 4);
        assert_eq!(chunks[0].metadata.language.as_deref(), Some("java"));
    }

    #[test]
    fn files_never_share_a_chunk() {
        let units = vec![
            unit("A.java", "a", 1, 10),
            unit("B.java", "b", 1, 10),
            unit("A.java", "c", 20, 10),
        ];
        let chunks = merger(2048).merge(&units);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].metadata.source_file, "A.java");
        assert_eq!(chunks[0].metadata.unit_names, vec!["a", "c"]);
        assert_eq!(chunks[1].metadata.source_file, "B.java");
    }

    #[test]
    fn units_sorted_by_line_within_file() {
        let units = vec![unit("A.java", "late", 50, 10), unit("A.java", "early", 1, 10)];
        let chunks = merger(2048).merge(&units);
        assert_eq!(chunks[0].metadata.unit_names, vec!["early", "late"]);
    }

    #[test]
    fn decorator_flag_propagates() {
        let mut u = unit("a.py", "f", 1, 10);
        u.decorator_adjacent = true;
        let chunks = merger(2048).merge(&[u, unit("a.py", "g", 10, 10)]);
        assert!(chunks[0].metadata.decorator_adjacent);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(merger(2048).merge(&[]).is_empty());
    }

    #[test]
    fn ids_are_stable_across_runs() {
        let units = vec![unit("A.java", "a", 1, 10), unit("A.java", "b", 10, 10)];
        let first: Vec<_> = merger(15).merge(&units).into_iter().map(|c| c.id).collect();
        let second: Vec<_> = merger(15).merge(&units).into_iter().map(|c| c.id).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    mod proptest_merger {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn never_splits_and_respects_budget(
                sizes in prop::collection::vec(1usize..600, 0..30),
                max_chars in 1usize..1500,
            ) {
                let units: Vec<_> = sizes
                    .iter()
                    .enumerate()
                    .map(|(i, &n)| unit("P.java", &format!("u{i}"), 1 + i * 10, n))
                    .collect();
                let chunks = merger(max_chars).merge(&units);

                let names: Vec<String> = chunks
                    .iter()
                    .flat_map(|c| c.metadata.unit_names.clone())
                    .collect();
                let expected: Vec<String> = units.iter().map(|u| u.name.clone()).collect();
                prop_assert_eq!(names, expected);

                for chunk in &chunks {
                    if chunk.metadata.unit_names.len() > 1 {
                        prop_assert!(chunk.char_len() <= max_chars);
                    }
                    prop_assert_eq!(chunk.metadata.budget_exceeded, chunk.char_len() > max_chars);
                    prop_assert!(chunk.metadata.start_line <= chunk.metadata.end_line);
                }
            }
        }
    }
}
