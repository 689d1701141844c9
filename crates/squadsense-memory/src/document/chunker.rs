//! Structural splitting of prose documents.
//!
//! Text is cut into sections at Markdown headings and horizontal rules; any
//! section longer than the budget is split into fixed-width, overlapping
//! windows. All lengths and offsets are measured in characters.

use crate::types::{Chunk, ChunkKind, ChunkMetadata};

#[derive(Debug, Clone)]
pub struct DocumentChunkerConfig {
    pub max_chars: usize,
    pub overlap_chars: usize,
}

impl Default for DocumentChunkerConfig {
    fn default() -> Self {
        Self {
            max_chars: 1500,
            overlap_chars: 150,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DocumentChunker {
    config: DocumentChunkerConfig,
}

/// One structural section, as character offsets into the whole document.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Section {
    start: usize,
    end: usize,
    heading: Option<String>,
}

impl DocumentChunker {
    #[must_use]
    pub fn new(config: DocumentChunkerConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &DocumentChunkerConfig {
        &self.config
    }

    /// Split `text` into document chunks attributed to `source_file`.
    #[must_use]
    pub fn chunk(&self, text: &str, source_file: &str) -> Vec<Chunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = text.chars().collect();
        let line_starts = line_starts(&chars);
        let max = self.config.max_chars.max(1);
        let step = max.saturating_sub(self.config.overlap_chars).max(1);

        let mut chunks = Vec::new();
        let sections = split_sections(&chars, &line_starts)
            .into_iter()
            .filter(|s| chars[s.start..s.end].iter().any(|c| !c.is_whitespace()));

        for (section_index, section) in sections.enumerate() {
            let len = section.end - section.start;
            let mut window_index = 0;
            let mut offset = 0;
            loop {
                let end = (offset + max).min(len);
                let start_abs = section.start + offset;
                let end_abs = section.start + end;
                let content: String = chars[start_abs..end_abs].iter().collect();

                let mut meta = ChunkMetadata::new(
                    source_file,
                    ChunkKind::Document,
                    line_of(&line_starts, start_abs),
                    line_of(&line_starts, end_abs - 1),
                );
                meta.start_offset = start_abs;
                meta.end_offset = end_abs;
                meta.heading.clone_from(&section.heading);
                meta.section_index = section_index;
                meta.window_index = window_index;
                chunks.push(Chunk::new(content, meta));

                if end == len {
                    break;
                }
                offset += step;
                window_index += 1;
            }
            if window_index > 0 {
                tracing::debug!(
                    source = source_file,
                    section = section_index,
                    windows = window_index + 1,
                    "split oversized section"
                );
            }
        }
        chunks
    }
}

fn line_starts(chars: &[char]) -> Vec<usize> {
    let mut starts = vec![0];
    for (i, c) in chars.iter().enumerate() {
        if *c == '\n' && i + 1 < chars.len() {
            starts.push(i + 1);
        }
    }
    starts
}

/// 1-based line number containing the character at `offset`.
fn line_of(line_starts: &[usize], offset: usize) -> usize {
    line_starts.partition_point(|&s| s <= offset).max(1)
}

fn split_sections(chars: &[char], line_starts: &[usize]) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current = Section {
        start: 0,
        end: 0,
        heading: None,
    };
    let mut fence: Option<(char, usize)> = None;

    for (i, &start) in line_starts.iter().enumerate() {
        let end = line_starts.get(i + 1).copied().unwrap_or(chars.len());
        let line: String = chars[start..end].iter().collect();
        let trimmed = line.trim_start();

        if let Some(marker) = fence_marker(trimmed) {
            fence = match fence {
                None => Some(marker),
                Some((ch, n)) if marker.0 == ch && marker.1 >= n => None,
                open => open,
            };
            continue;
        }
        if fence.is_some() {
            continue;
        }

        let heading = atx_heading(trimmed);
        if heading.is_some() || is_thematic_break(trimmed) {
            if start > current.start {
                current.end = start;
                sections.push(current);
            }
            current = Section {
                start,
                end: 0,
                heading: heading.map(str::to_owned),
            };
        }
    }
    current.end = chars.len();
    sections.push(current);
    sections
}

/// Heading text of an ATX heading line (`#` to `######`), `None` otherwise.
fn atx_heading(line: &str) -> Option<&str> {
    let level = line.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &line[level..];
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some(rest.trim().trim_end_matches('#').trim_end())
}

fn is_thematic_break(line: &str) -> bool {
    let mut marks = line.chars().filter(|c| !c.is_whitespace());
    let Some(first) = marks.next() else {
        return false;
    };
    if !matches!(first, '-' | '*' | '_') {
        return false;
    }
    let mut count = 1;
    for c in marks {
        if c != first {
            return false;
        }
        count += 1;
    }
    count >= 3
}

/// Opening or closing code fence: marker char and run length.
fn fence_marker(line: &str) -> Option<(char, usize)> {
    let first = line.chars().next()?;
    if first != '`' && first != '~' {
        return None;
    }
    let run = line.chars().take_while(|c| *c == first).count();
    (run >= 3).then_some((first, run))
}
