use crate::config::ChunkerConfig;
use crate::error::{ChunkerError, Result};
use crate::types::Chunk;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

static HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#{1,6})\s+(.+)$").expect("valid heading regex"));

/// Chunks markdown content respecting document structure.
///
/// Sections are formed at heading boundaries, oversized sections are split
/// at blank lines (fenced code regions stay atomic), and consecutive chunks
/// of the same section share a sentence-aligned overlap.
pub struct MarkdownChunker {
    config: ChunkerConfig,
}

/// One heading-delimited span of the document.
struct Section {
    heading: Option<String>,
    text: String,
    line_start: usize,
}

/// A pre-trim unit produced while splitting a section.
struct RawUnit {
    text: String,
    line_start: usize,
    line_end: usize,
}

impl MarkdownChunker {
    /// Create a new chunker with configuration
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        config.validate().map_err(ChunkerError::invalid_config)?;
        Ok(Self { config })
    }

    /// Get configuration
    #[must_use]
    pub const fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Chunk markdown content into ordered, position-tagged units.
    ///
    /// `chunk_index` is assigned in emission order across all sections of
    /// the document. Line numbers are relative to the document after
    /// frontmatter stripping.
    #[must_use]
    pub fn chunk(&self, content: &str) -> Vec<Chunk> {
        let body = strip_frontmatter(content);
        let sections = split_by_headings(body);
        let section_count = sections.len();

        let mut chunks = Vec::new();
        let mut chunk_index = 0;

        for section in sections {
            let units = self.split_section(&section.text, section.line_start);
            let single_unit = units.len() == 1;

            for unit in units {
                let trimmed = unit.text.trim();
                if trimmed.is_empty() {
                    continue;
                }

                // A section that produced exactly one unit must not vanish,
                // even if it falls below the minimum size.
                if trimmed.chars().count() < self.config.min_chunk_chars && !single_unit {
                    continue;
                }

                chunks.push(Chunk {
                    text: trimmed.to_string(),
                    heading: section.heading.clone(),
                    line_start: unit.line_start,
                    line_end: unit.line_end,
                    chunk_index,
                });
                chunk_index += 1;
            }
        }

        debug!(
            "Chunked {section_count} section(s) into {} chunk(s)",
            chunks.len()
        );
        chunks
    }

    /// Split a section into units, respecting the maximum chunk size.
    fn split_section(&self, text: &str, start_line: usize) -> Vec<RawUnit> {
        if text.chars().count() <= self.config.max_chunk_chars {
            let line_count = text.split('\n').count();
            return vec![RawUnit {
                text: text.to_string(),
                line_start: start_line,
                line_end: start_line + line_count.saturating_sub(1),
            }];
        }

        let paragraphs = split_paragraphs(text);

        let mut units = Vec::new();
        let mut current = String::new();
        let mut current_chars = 0usize;
        let mut current_start = start_line;
        let mut current_line = start_line;

        for para in paragraphs {
            let para_chars = para.chars().count();
            let para_lines = para.matches('\n').count() + 1;

            if current_chars + para_chars <= self.config.max_chunk_chars {
                current.push_str(&para);
                current_chars += para_chars;
                current_line += para_lines;
            } else {
                if !current.trim().is_empty() {
                    units.push(RawUnit {
                        text: current.clone(),
                        line_start: current_start,
                        line_end: current_line.saturating_sub(1),
                    });
                }

                // Seed the next buffer with the tail of the emitted one so
                // the split does not land mid-sentence. The start line is an
                // estimate once overlap re-injects earlier text.
                let overlap = self.overlap_tail(&current);
                current_start = current_line.saturating_sub(overlap.matches('\n').count());
                current_chars = overlap.chars().count() + para_chars;
                current = overlap;
                current.push_str(&para);
                current_line += para_lines;
            }
        }

        if !current.trim().is_empty() {
            units.push(RawUnit {
                text: current,
                line_start: current_start,
                line_end: current_line,
            });
        }

        units
    }

    /// Overlap region carried from the end of an emitted chunk.
    ///
    /// The tail is trimmed forward to the first sentence terminator,
    /// blank-line boundary, or single newline, tried in that priority
    /// order, so the next chunk starts at a natural boundary.
    fn overlap_tail(&self, text: &str) -> String {
        if text.chars().count() <= self.config.overlap_chars {
            return text.to_string();
        }

        let region = tail_chars(text, self.config.overlap_chars);
        for sep in [". ", ".\n", "\n\n", "\n"] {
            if let Some(idx) = region.find(sep) {
                return region[idx + sep.len()..].to_string();
            }
        }

        region.to_string()
    }
}

/// Remove a leading `---` frontmatter block, if present at document start.
fn strip_frontmatter(content: &str) -> &str {
    let mut lines = content.split_inclusive('\n');

    let Some(first) = lines.next() else {
        return content;
    };
    if first.trim_end() != "---" || !first.ends_with('\n') {
        return content;
    }

    let mut offset = first.len();
    let mut body_lines = 0usize;
    for line in lines {
        let line_end = offset + line.len();
        // The closing delimiter needs at least one body line before it and
        // must be newline-terminated.
        if body_lines > 0 && line.trim_end() == "---" && line.ends_with('\n') {
            return &content[line_end..];
        }
        body_lines += 1;
        offset = line_end;
    }

    content
}

/// Split content into sections at heading lines.
///
/// The heading line itself belongs to its section. Text before the first
/// heading forms a heading-less preamble section. All-whitespace sections
/// are dropped.
fn split_by_headings(content: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current = Section {
        heading: None,
        text: String::new(),
        line_start: 1,
    };

    for (i, line) in content.split('\n').enumerate() {
        let line_number = i + 1;
        if let Some(caps) = HEADING_RE.captures(line) {
            if !current.text.trim().is_empty() {
                sections.push(current);
            }

            current = Section {
                heading: caps.get(2).map(|m| m.as_str().trim().to_string()),
                text: format!("{line}\n"),
                line_start: line_number,
            };
        } else {
            current.text.push_str(line);
            current.text.push('\n');
        }
    }

    if !current.text.trim().is_empty() {
        sections.push(current);
    }

    sections
}

/// Split text into paragraph segments at blank lines.
///
/// Lines between a pair of fence markers never act as blank-line
/// boundaries, so fenced regions stay inside a single segment.
fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_code_block = false;

    for line in text.split('\n') {
        if line.starts_with("```") {
            in_code_block = !in_code_block;
            current.push_str(line);
            current.push('\n');
        } else if !in_code_block && line.trim().is_empty() {
            if !current.trim().is_empty() {
                paragraphs.push(std::mem::take(&mut current));
            } else {
                current.clear();
            }
        } else {
            current.push_str(line);
            current.push('\n');
        }
    }

    if !current.trim().is_empty() {
        paragraphs.push(current);
    }

    paragraphs
}

/// Last `n` characters of `text`, sliced on a char boundary.
fn tail_chars(text: &str, n: usize) -> &str {
    let count = text.chars().count();
    if count <= n {
        return text;
    }

    let skip = count - n;
    match text.char_indices().nth(skip) {
        Some((idx, _)) => &text[idx..],
        None => "",
    }
}
