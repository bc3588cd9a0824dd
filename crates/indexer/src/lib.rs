//! # Vault Indexer
//!
//! Incremental synchronization of a markdown vault into a vector-chunk
//! index.
//!
//! ## Pipeline
//!
//! ```text
//! VaultWalker ──> changed files (content fingerprint vs Ledger)
//!     │
//!     ├──> MarkdownChunker ──> chunks
//!     │
//!     ├──> Embedder ──> vectors (one batch per file)
//!     │
//!     └──> VectorStore  purge old points, upsert new ones
//!              │
//!              └─> Ledger (atomic save, once per run)
//! ```
//!
//! Change detection is content-addressed: a file is re-indexed only when
//! the blake3 fingerprint of its content differs from the ledger's record.
//! Touching a file without changing it costs one hash, nothing more.

mod config;
mod error;
mod indexer;
mod ledger;
mod search;
mod stats;
mod walker;

pub use config::{load_config, VaultConfig};
pub use error::{IndexerError, Result};
pub use indexer::{ProgressFn, VaultIndexer};
pub use ledger::{Ledger, LedgerEntry};
pub use search::{PathScope, SearchHit, VaultSearcher};
pub use stats::{IndexReport, IndexStatus};
pub use walker::{fingerprint, FileInfo, VaultWalker};
