use std::sync::Arc;

use serde::Serialize;
use vault_store::{Embedder, PayloadFilter, ScoredPoint, VectorStore};

use crate::config::VaultConfig;
use crate::error::{IndexerError, Result};

/// Optional path restriction for a search.
#[derive(Debug, Clone)]
pub enum PathScope {
    /// Only chunks of this exact file
    Exact(String),

    /// Only chunks whose path starts with this prefix
    Folder(String),
}

/// One search result.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub path: String,
    pub text: String,
    pub score: f32,
    pub heading: Option<String>,
    pub line_start: usize,
    pub line_end: usize,
    pub chunk_index: usize,
}

impl From<ScoredPoint> for SearchHit {
    fn from(point: ScoredPoint) -> Self {
        Self {
            path: point.payload.path,
            text: point.payload.text,
            score: point.score,
            heading: point.payload.heading,
            line_start: point.payload.line_start,
            line_end: point.payload.line_end,
            chunk_index: point.payload.chunk_index,
        }
    }
}

/// Query front-end over an indexed vault.
pub struct VaultSearcher {
    config: VaultConfig,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
}

impl VaultSearcher {
    pub fn new(
        config: VaultConfig,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            config,
            embedder,
            store,
        }
    }

    /// Embed `query` and return the closest chunks, best first.
    pub async fn search(
        &self,
        query: &str,
        limit: usize,
        min_score: Option<f32>,
        scope: Option<PathScope>,
    ) -> Result<Vec<SearchHit>> {
        let vector = self.embedder.embed(query).await?;
        let filter = scope.map(|scope| match scope {
            PathScope::Exact(path) => PayloadFilter::by_path(path),
            PathScope::Folder(prefix) => PayloadFilter::by_prefix(prefix),
        });

        let hits = self
            .store
            .query(
                &self.config.collection_name,
                &vector,
                limit,
                min_score,
                filter.as_ref(),
            )
            .await?;
        Ok(hits.into_iter().map(SearchHit::from).collect())
    }

    /// Find chunks similar to an already-indexed file.
    ///
    /// The file's first stored point stands in for the whole document; no
    /// re-embedding happens. With `exclude_same_file` the file's own chunks
    /// are filtered out of the results.
    pub async fn search_by_path(
        &self,
        relative_path: &str,
        limit: usize,
        min_score: Option<f32>,
        exclude_same_file: bool,
    ) -> Result<Vec<SearchHit>> {
        let points = self
            .store
            .fetch_by_filter(
                &self.config.collection_name,
                &PayloadFilter::by_path(relative_path),
                true,
                1,
            )
            .await?;

        let Some(representative) = points.into_iter().next() else {
            return Err(IndexerError::InvalidPath(format!(
                "no indexed chunks for '{relative_path}'"
            )));
        };

        let filter = exclude_same_file.then(|| PayloadFilter {
            exclude_path: Some(relative_path.to_string()),
            ..PayloadFilter::default()
        });

        let hits = self
            .store
            .query(
                &self.config.collection_name,
                &representative.vector,
                limit,
                min_score,
                filter.as_ref(),
            )
            .await?;
        Ok(hits.into_iter().map(SearchHit::from).collect())
    }
}
