use serde::{Deserialize, Serialize};

/// A bounded, position-tagged slice of document text.
///
/// Line numbers are 1-indexed. When a chunk starts with overlap carried
/// over from the previous chunk of the same section, `line_start` is a
/// best-effort estimate rather than an exact position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// Trimmed chunk text
    pub text: String,

    /// Nearest enclosing section title, `None` before the first heading
    pub heading: Option<String>,

    /// Start line (1-indexed)
    pub line_start: usize,

    /// End line (1-indexed, inclusive)
    pub line_end: usize,

    /// 0-based emission order within one file
    pub chunk_index: usize,
}

impl Chunk {
    /// Character count of the chunk text
    #[must_use]
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}
