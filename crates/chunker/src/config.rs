use serde::{Deserialize, Serialize};

/// Configuration for markdown chunking behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Maximum chunk size in characters (hard limit for accumulation)
    pub max_chunk_chars: usize,

    /// Overlap carried from one chunk into the next, in characters
    pub overlap_chars: usize,

    /// Minimum chunk size in characters (smaller units are dropped,
    /// unless they are the only unit of their section)
    pub min_chunk_chars: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: 1000,
            overlap_chars: 200,
            min_chunk_chars: 100,
        }
    }
}

impl ChunkerConfig {
    /// Create config optimized for small embedding models (shorter chunks)
    #[must_use]
    pub fn for_small_model() -> Self {
        Self {
            max_chunk_chars: 512,
            overlap_chars: 100,
            min_chunk_chars: 50,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_chunk_chars == 0 {
            return Err("max_chunk_chars must be > 0".to_string());
        }

        if self.min_chunk_chars > self.max_chunk_chars {
            return Err(format!(
                "min_chunk_chars ({}) cannot exceed max_chunk_chars ({})",
                self.min_chunk_chars, self.max_chunk_chars
            ));
        }

        if self.overlap_chars >= self.max_chunk_chars {
            return Err(format!(
                "overlap_chars ({}) must be smaller than max_chunk_chars ({})",
                self.overlap_chars, self.max_chunk_chars
            ));
        }

        Ok(())
    }
}
