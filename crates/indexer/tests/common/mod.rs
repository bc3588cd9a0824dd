//! Shared fixtures: a deterministic stub embedder and vault scaffolding.
#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use vault_indexer::{VaultConfig, VaultIndexer};
use vault_store::{Embedder, MemoryStore, StoreError, VectorStore};

/// Files containing this marker make the stub embedder fail.
pub const FAIL_MARKER: &str = "EMBEDFAIL";

pub const DIM: usize = 8;

/// Content-hash based embedder: equal text maps to equal vectors, all
/// components positive, unit norm.
pub struct StubEmbedder;

pub fn embed_text(text: &str) -> Vec<f32> {
    let hash = blake3::hash(text.as_bytes());
    let mut vector: Vec<f32> = hash.as_bytes()[..DIM]
        .iter()
        .map(|b| f32::from(*b) + 1.0)
        .collect();
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    for x in &mut vector {
        *x /= norm;
    }
    vector
}

#[async_trait]
impl Embedder for StubEmbedder {
    fn model_name(&self) -> &str {
        "stub-model"
    }

    fn dimension(&self) -> usize {
        DIM
    }

    async fn embed_batch(
        &self,
        texts: &[String],
        _batch_size: usize,
    ) -> Result<Vec<Vec<f32>>, StoreError> {
        texts
            .iter()
            .map(|text| {
                if text.contains(FAIL_MARKER) {
                    Err(StoreError::Embedding("marker text rejected".to_string()))
                } else {
                    Ok(embed_text(text))
                }
            })
            .collect()
    }
}

pub fn test_config(vault: &Path) -> VaultConfig {
    VaultConfig {
        vault_path: vault.to_path_buf(),
        collection_name: "test-vault".to_string(),
        model_name: "stub-model".to_string(),
        model_dimensions: DIM,
        ..VaultConfig::default()
    }
}

pub fn make_indexer(vault: &Path, store: Arc<MemoryStore>) -> VaultIndexer {
    VaultIndexer::new(test_config(vault), Arc::new(StubEmbedder), store).unwrap()
}

pub fn write_note(vault: &Path, relative: &str, content: &str) {
    let path = vault.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// Count the points stored for one vault-relative path.
pub async fn points_for(store: &MemoryStore, path: &str) -> usize {
    store
        .fetch_by_filter(
            "test-vault",
            &vault_store::PayloadFilter::by_path(path),
            false,
            1000,
        )
        .await
        .unwrap()
        .len()
}
