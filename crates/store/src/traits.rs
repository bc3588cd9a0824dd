//! Collaborator seams for the indexing engine.
//!
//! The engine never talks to a concrete model or database. It is handed an
//! [`Embedder`] and a [`VectorStore`] at construction, so tests can inject
//! deterministic doubles and deployments can pick backends freely.

use async_trait::async_trait;

use crate::error::{Result, StoreError};
use crate::types::{ChunkPoint, CollectionStats, PayloadFilter, ScoredPoint};

/// Text to vector mapping.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model identifier
    fn model_name(&self) -> &str;

    /// Vector dimension this model produces
    fn dimension(&self) -> usize;

    /// Embed a batch of texts, preserving input order.
    async fn embed_batch(&self, texts: &[String], batch_size: usize) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()], 1).await?;
        vectors
            .pop()
            .ok_or_else(|| StoreError::Embedding("empty embedding result".to_string()))
    }
}

/// Vector database operations the engine and searcher rely on.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create the collection if missing; verify the dimension if present.
    ///
    /// A dimension mismatch against an existing collection is a
    /// [`StoreError::CollectionSchema`] and must not be papered over.
    async fn ensure_collection(&self, name: &str, dimension: usize) -> Result<()>;

    /// Insert or replace points by id.
    async fn upsert(&self, collection: &str, points: Vec<ChunkPoint>) -> Result<()>;

    /// Delete points by id. Unknown ids are ignored.
    async fn delete(&self, collection: &str, ids: &[String]) -> Result<()>;

    /// Similarity query, highest score first.
    async fn query(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
        score_threshold: Option<f32>,
        filter: Option<&PayloadFilter>,
    ) -> Result<Vec<ScoredPoint>>;

    /// Fetch points matching a payload filter, without scoring.
    ///
    /// When `with_vectors` is false the returned points carry empty vectors.
    async fn fetch_by_filter(
        &self,
        collection: &str,
        filter: &PayloadFilter,
        with_vectors: bool,
        limit: usize,
    ) -> Result<Vec<ChunkPoint>>;

    /// Drop the collection. Absence is not an error.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Point counters for an existing collection.
    async fn collection_stats(&self, name: &str) -> Result<CollectionStats>;
}
