//! # Vault Chunker
//!
//! Markdown-aware text chunking for semantic indexing.
//!
//! ## Pipeline
//!
//! ```text
//! Markdown document
//!     │
//!     ├──> Frontmatter stripping (leading `---` block)
//!     │
//!     ├──> Section split at headings (#, ##, ... ######)
//!     │
//!     ├──> Paragraph split inside oversized sections
//!     │    (fenced code regions are never split)
//!     │
//!     └──> Greedy accumulation with sentence-aligned overlap
//!          └─> Chunk[] with heading + line metadata
//! ```
//!
//! ## Example
//!
//! ```rust
//! use vault_chunker::{ChunkerConfig, MarkdownChunker};
//!
//! let chunker = MarkdownChunker::new(ChunkerConfig::default()).unwrap();
//! let chunks = chunker.chunk("# Notes\n\nSome content here.\n");
//! for chunk in chunks {
//!     println!("{:?}: lines {}-{}", chunk.heading, chunk.line_start, chunk.line_end);
//! }
//! ```

mod chunker;
mod config;
mod error;
mod types;

pub use chunker::MarkdownChunker;
pub use config::ChunkerConfig;
pub use error::{ChunkerError, Result};
pub use types::Chunk;
