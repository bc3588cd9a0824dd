use std::sync::Arc;
use std::time::Instant;

use log::{info, warn};
use vault_chunker::MarkdownChunker;
use vault_store::{ChunkPayload, ChunkPoint, Embedder, VectorStore};

use crate::config::VaultConfig;
use crate::error::{IndexerError, Result};
use crate::ledger::Ledger;
use crate::stats::{IndexReport, IndexStatus};
use crate::walker::{fingerprint, FileInfo, VaultWalker};

/// Texts per embedding call
const EMBED_BATCH_SIZE: usize = 32;

/// Progress callback: current path, position, total.
pub type ProgressFn = dyn Fn(&str, usize, usize) + Send + Sync;

/// The incremental sync engine.
///
/// Collaborators are injected at construction; the engine owns no model or
/// connection state of its own. One `index` run is single-threaded over the
/// working set, and per-file failures never abort the run.
pub struct VaultIndexer {
    config: VaultConfig,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    chunker: MarkdownChunker,
    walker: VaultWalker,
    progress: Option<Box<ProgressFn>>,
}

impl VaultIndexer {
    pub fn new(
        config: VaultConfig,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
    ) -> Result<Self> {
        let chunker = MarkdownChunker::new(config.chunker_config())?;
        let walker = VaultWalker::new(
            &config.vault_path,
            &config.include_extensions,
            &config.exclude_patterns,
        )?;

        Ok(Self {
            config,
            embedder,
            store,
            chunker,
            walker,
            progress: None,
        })
    }

    /// Attach a progress callback, invoked once per working-set file.
    #[must_use]
    pub fn with_progress(mut self, progress: Box<ProgressFn>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Synchronize the vault into the collection.
    ///
    /// `files` narrows the run to the given vault-relative paths. Listed
    /// paths are filtered by existence only; the extension and exclusion
    /// rules govern discovery, not files the caller named directly.
    /// Deletion reconciliation runs only on full-tree runs so
    /// a narrowed run can never purge files it was not asked to look at.
    /// `force` re-indexes regardless of fingerprints.
    ///
    /// The ledger is persisted exactly once, at the end, even when some
    /// files failed.
    pub async fn index(&self, files: Option<&[String]>, force: bool) -> Result<IndexReport> {
        let start = Instant::now();
        let mut report = IndexReport::new();

        self.store
            .ensure_collection(&self.config.collection_name, self.config.model_dimensions)
            .await?;

        let state_path = self.config.state_path();
        let mut ledger = Ledger::load(
            &state_path,
            &self.config.collection_name,
            &self.config.model_name,
        )
        .await;

        let full_run = files.is_none();
        let working_set: Vec<FileInfo> = match files {
            None => self.walker.walk(),
            Some(list) => list
                .iter()
                .filter_map(|rel| self.walker.file_info(rel))
                .collect(),
        };

        info!(
            "Indexing {} file(s) into '{}'",
            working_set.len(),
            self.config.collection_name
        );

        let total = working_set.len();
        for (position, file) in working_set.iter().enumerate() {
            if let Some(callback) = &self.progress {
                callback(&file.relative_path, position + 1, total);
            }

            if let Err(e) = self
                .index_file(file, force, &mut ledger, &mut report)
                .await
            {
                warn!("Failed to index {}: {e}", file.relative_path);
                report.add_error(&file.relative_path, e);
            }
        }

        if full_run {
            self.reconcile_deletions(&mut ledger, &mut report).await;
        }

        ledger.save(&state_path).await?;

        report.time_ms = start.elapsed().as_millis() as u64;
        info!(
            "Run finished: {} processed, {} skipped, {} deleted, {} error(s) in {}ms",
            report.files_processed,
            report.files_skipped,
            report.files_deleted,
            report.errors.len(),
            report.time_ms
        );
        Ok(report)
    }

    async fn index_file(
        &self,
        file: &FileInfo,
        force: bool,
        ledger: &mut Ledger,
        report: &mut IndexReport,
    ) -> Result<()> {
        let content = file.read_content()?;
        let print = fingerprint(&content);

        if !force && !ledger.needs_reindex(&file.relative_path, &print) {
            report.files_skipped += 1;
            return Ok(());
        }

        // Drop the ledger entry before purging the store. If the process
        // dies between purge and upsert, the file is still marked
        // un-indexed and the next run picks it up.
        let old_ids = ledger.remove(&file.relative_path);
        if !old_ids.is_empty() {
            self.store
                .delete(&self.config.collection_name, &old_ids)
                .await?;
            report.chunks_removed += old_ids.len();
        }

        let chunks = self.chunker.chunk(&content);
        if chunks.is_empty() {
            // Nothing indexable, but remember the fingerprint so the file
            // is skipped until it changes.
            ledger.update(&file.relative_path, &print, file.mtime_ms, Vec::new());
            report.files_processed += 1;
            return Ok(());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts, EMBED_BATCH_SIZE).await?;
        if vectors.len() != chunks.len() {
            return Err(IndexerError::Other(format!(
                "embedder returned {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }

        let points: Vec<ChunkPoint> = chunks
            .iter()
            .zip(vectors)
            .map(|(chunk, vector)| {
                ChunkPoint::new(
                    vector,
                    ChunkPayload {
                        path: file.relative_path.clone(),
                        text: chunk.text.clone(),
                        heading: chunk.heading.clone(),
                        line_start: chunk.line_start,
                        line_end: chunk.line_end,
                        chunk_index: chunk.chunk_index,
                        content_fingerprint: print.clone(),
                    },
                )
            })
            .collect();
        let chunk_ids: Vec<String> = points.iter().map(|p| p.id.clone()).collect();

        self.store
            .upsert(&self.config.collection_name, points)
            .await?;

        ledger.update(&file.relative_path, &print, file.mtime_ms, chunk_ids);
        report.files_processed += 1;
        report.chunks_added += chunks.len();
        Ok(())
    }

    async fn reconcile_deletions(&self, ledger: &mut Ledger, report: &mut IndexReport) {
        for path in self.walker.find_deleted(ledger) {
            let ids = ledger.remove(&path);
            if !ids.is_empty() {
                if let Err(e) = self.store.delete(&self.config.collection_name, &ids).await {
                    warn!("Failed to purge chunks of deleted {path}: {e}");
                    report.add_error(&path, e);
                    continue;
                }
                report.chunks_removed += ids.len();
            }
            report.files_deleted += 1;
        }
    }

    /// Remove one file from the index and persist the ledger immediately.
    ///
    /// Returns the number of purged chunks. Unknown paths purge nothing.
    pub async fn delete_file(&self, relative_path: &str) -> Result<usize> {
        let state_path = self.config.state_path();
        let mut ledger = Ledger::load(
            &state_path,
            &self.config.collection_name,
            &self.config.model_name,
        )
        .await;

        let ids = ledger.remove(relative_path);
        if !ids.is_empty() {
            self.store
                .delete(&self.config.collection_name, &ids)
                .await?;
        }
        ledger.save(&state_path).await?;
        Ok(ids.len())
    }

    /// Drop the collection and reset the ledger.
    pub async fn clear(&self) -> Result<()> {
        self.store
            .delete_collection(&self.config.collection_name)
            .await?;

        let mut ledger = Ledger::new(&self.config.collection_name, &self.config.model_name);
        ledger.save(&self.config.state_path()).await?;
        info!("Cleared collection '{}'", self.config.collection_name);
        Ok(())
    }

    /// Read-only status: ledger counters merged with store counters.
    pub async fn status(&self) -> Result<IndexStatus> {
        let ledger = Ledger::load(
            &self.config.state_path(),
            &self.config.collection_name,
            &self.config.model_name,
        )
        .await;

        let points_stored = match self
            .store
            .collection_stats(&self.config.collection_name)
            .await
        {
            Ok(stats) => stats.points,
            Err(e) => {
                warn!("Collection stats unavailable: {e}");
                0
            }
        };

        Ok(IndexStatus {
            collection_name: self.config.collection_name.clone(),
            model_name: self.config.model_name.clone(),
            files_indexed: ledger.file_count(),
            chunks_tracked: ledger.chunk_count(),
            points_stored,
            last_indexed_unix_ms: ledger.last_indexed_unix_ms,
        })
    }
}
