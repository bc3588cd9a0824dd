//! In-memory vector store.
//!
//! Brute-force cosine scoring over insertion-ordered points. Used by tests
//! and by local runs that do not need persistence.

use std::collections::HashMap;

use async_trait::async_trait;
use log::debug;
use ndarray::ArrayView1;
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::traits::VectorStore;
use crate::types::{ChunkPoint, CollectionStats, PayloadFilter, ScoredPoint};

/// A single collection: fixed dimension, points in insertion order.
struct Collection {
    dimension: usize,
    points: Vec<ChunkPoint>,
}

/// In-memory [`VectorStore`] implementation.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }

        let a = ArrayView1::from(a);
        let b = ArrayView1::from(b);
        let norm_a = a.dot(&a).sqrt();
        let norm_b = b.dot(&b).sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        a.dot(&b) / (norm_a * norm_b)
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn ensure_collection(&self, name: &str, dimension: usize) -> Result<()> {
        let mut collections = self.collections.write().await;
        if let Some(existing) = collections.get(name) {
            if existing.dimension != dimension {
                return Err(StoreError::CollectionSchema(format!(
                    "collection '{name}' has dimension {}, requested {dimension}",
                    existing.dimension
                )));
            }
            return Ok(());
        }

        collections.insert(
            name.to_string(),
            Collection {
                dimension,
                points: Vec::new(),
            },
        );
        debug!("Created collection '{name}' (dimension {dimension})");
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: Vec<ChunkPoint>) -> Result<()> {
        let mut collections = self.collections.write().await;
        let coll = collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::Storage(format!("unknown collection '{collection}'")))?;

        for point in points {
            if point.vector.len() != coll.dimension {
                return Err(StoreError::CollectionSchema(format!(
                    "point vector has dimension {}, collection '{collection}' expects {}",
                    point.vector.len(),
                    coll.dimension
                )));
            }

            match coll.points.iter_mut().find(|p| p.id == point.id) {
                Some(existing) => *existing = point,
                None => coll.points.push(point),
            }
        }

        Ok(())
    }

    async fn delete(&self, collection: &str, ids: &[String]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let coll = collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::Storage(format!("unknown collection '{collection}'")))?;

        coll.points.retain(|p| !ids.contains(&p.id));
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
        score_threshold: Option<f32>,
        filter: Option<&PayloadFilter>,
    ) -> Result<Vec<ScoredPoint>> {
        let collections = self.collections.read().await;
        let coll = collections
            .get(collection)
            .ok_or_else(|| StoreError::Storage(format!("unknown collection '{collection}'")))?;

        let mut scored: Vec<ScoredPoint> = coll
            .points
            .iter()
            .filter(|p| filter.is_none_or(|f| f.matches(&p.payload)))
            .map(|p| ScoredPoint {
                id: p.id.clone(),
                score: Self::cosine_similarity(vector, &p.vector),
                payload: p.payload.clone(),
            })
            .filter(|s| score_threshold.is_none_or(|t| s.score >= t))
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit);
        Ok(scored)
    }

    async fn fetch_by_filter(
        &self,
        collection: &str,
        filter: &PayloadFilter,
        with_vectors: bool,
        limit: usize,
    ) -> Result<Vec<ChunkPoint>> {
        let collections = self.collections.read().await;
        let coll = collections
            .get(collection)
            .ok_or_else(|| StoreError::Storage(format!("unknown collection '{collection}'")))?;

        let points = coll
            .points
            .iter()
            .filter(|p| filter.matches(&p.payload))
            .take(limit)
            .map(|p| ChunkPoint {
                id: p.id.clone(),
                vector: if with_vectors {
                    p.vector.clone()
                } else {
                    Vec::new()
                },
                payload: p.payload.clone(),
            })
            .collect();
        Ok(points)
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections.remove(name);
        Ok(())
    }

    async fn collection_stats(&self, name: &str) -> Result<CollectionStats> {
        let collections = self.collections.read().await;
        let coll = collections
            .get(name)
            .ok_or_else(|| StoreError::Storage(format!("unknown collection '{name}'")))?;

        Ok(CollectionStats {
            points: coll.points.len(),
        })
    }
}
