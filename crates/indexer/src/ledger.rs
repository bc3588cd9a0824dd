use std::collections::BTreeMap;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Per-file record of what the index currently holds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerEntry {
    /// Content fingerprint at index time
    pub fingerprint: String,

    /// Modification time at index time, unix milliseconds. Informational;
    /// never consulted for change detection.
    pub mtime_ms: u64,

    /// Point ids stored for this file
    pub chunk_ids: Vec<String>,
}

/// Persisted incremental-state ledger.
///
/// Maps vault-relative paths to the fingerprint and point ids of their last
/// successful indexing. The ledger is the only thing standing between a run
/// and a full re-embed, but it is not load-bearing for correctness: losing
/// it merely forces re-indexing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    #[serde(default)]
    pub entries: BTreeMap<String, LedgerEntry>,

    #[serde(default)]
    pub collection_name: String,

    #[serde(default)]
    pub model_name: String,

    #[serde(default)]
    pub last_indexed_unix_ms: Option<u64>,
}

impl Ledger {
    #[must_use]
    pub fn new(collection_name: impl Into<String>, model_name: impl Into<String>) -> Self {
        Self {
            entries: BTreeMap::new(),
            collection_name: collection_name.into(),
            model_name: model_name.into(),
            last_indexed_unix_ms: None,
        }
    }

    /// Load the ledger, tolerating absence and corruption.
    ///
    /// A missing file starts empty. A malformed file is logged and replaced
    /// by an empty ledger; the next run re-indexes everything rather than
    /// refusing to run.
    pub async fn load(path: &Path, collection_name: &str, model_name: &str) -> Self {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Self::new(collection_name, model_name);
            }
            Err(e) => {
                warn!(
                    "Cannot read ledger {} ({e}); starting fresh",
                    path.display()
                );
                return Self::new(collection_name, model_name);
            }
        };

        match serde_json::from_slice::<Self>(&bytes) {
            // The stored names describe a past run; the caller's config is
            // authoritative for the current one.
            Ok(mut ledger) => {
                ledger.collection_name = collection_name.to_string();
                ledger.model_name = model_name.to_string();
                ledger
            }
            Err(e) => {
                warn!(
                    "Malformed ledger {} ({e}); starting fresh",
                    path.display()
                );
                Self::new(collection_name, model_name)
            }
        }
    }

    /// Persist atomically: write a sibling temp file, then rename over the
    /// target. Stamps `last_indexed_unix_ms`.
    pub async fn save(&mut self, path: &Path) -> Result<()> {
        self.last_indexed_unix_ms = Some(unix_now_ms());

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let bytes = serde_json::to_vec_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// True when the file is unknown or its content changed.
    #[must_use]
    pub fn needs_reindex(&self, relative_path: &str, fingerprint: &str) -> bool {
        self.entries
            .get(relative_path)
            .is_none_or(|entry| entry.fingerprint != fingerprint)
    }

    /// Drop a file's entry, returning its stored point ids.
    pub fn remove(&mut self, relative_path: &str) -> Vec<String> {
        self.entries
            .remove(relative_path)
            .map(|entry| entry.chunk_ids)
            .unwrap_or_default()
    }

    /// Record a file's indexed state.
    pub fn update(
        &mut self,
        relative_path: impl Into<String>,
        fingerprint: impl Into<String>,
        mtime_ms: u64,
        chunk_ids: Vec<String>,
    ) {
        self.entries.insert(
            relative_path.into(),
            LedgerEntry {
                fingerprint: fingerprint.into(),
                mtime_ms,
                chunk_ids,
            },
        );
    }

    /// Tracked paths, in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    #[must_use]
    pub fn file_count(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.entries.values().map(|e| e.chunk_ids.len()).sum()
    }
}

fn unix_now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}
