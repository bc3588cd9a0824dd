use serde::{Deserialize, Serialize};

/// Outcome of one indexing run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexReport {
    /// Files chunked and embedded this run
    pub files_processed: usize,

    /// Files left alone because their content was unchanged
    pub files_skipped: usize,

    /// Ledger entries reconciled away because the file disappeared
    pub files_deleted: usize,

    /// Points written to the store
    pub chunks_added: usize,

    /// Points purged from the store
    pub chunks_removed: usize,

    /// Per-file failures, as `"path: error"` strings
    pub errors: Vec<String>,

    /// Wall-clock duration in milliseconds
    pub time_ms: u64,
}

impl IndexReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, path: &str, error: impl std::fmt::Display) {
        self.errors.push(format!("{path}: {error}"));
    }
}

/// Read-only snapshot merging ledger counters with store counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStatus {
    pub collection_name: String,
    pub model_name: String,

    /// Files the ledger tracks
    pub files_indexed: usize,

    /// Chunk ids the ledger tracks
    pub chunks_tracked: usize,

    /// Points the store reports; 0 when the collection does not exist yet
    pub points_stored: usize,

    pub last_indexed_unix_ms: Option<u64>,
}
