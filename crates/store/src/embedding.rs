//! Local embedding via the `fastembed` ONNX models.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use log::info;
use tokio::task::spawn_blocking;

use crate::error::{Result, StoreError};
use crate::traits::Embedder;

/// [`Embedder`] backed by a locally-run fastembed model.
///
/// Inference is CPU-bound, so batches run on the blocking pool. The model is
/// loaded eagerly at construction; there is no lifecycle management beyond
/// that.
pub struct FastembedEmbedder {
    model: Arc<Mutex<TextEmbedding>>,
    model_name: String,
    dimension: usize,
}

impl FastembedEmbedder {
    /// Load `model_name` and verify it against the expected `dimension`.
    pub fn new(model_name: &str, dimension: usize) -> Result<Self> {
        let model_id = resolve_model(model_name)?;
        info!("Loading embedding model '{model_name}'");

        let model = TextEmbedding::try_new(
            InitOptions::new(model_id).with_show_download_progress(false),
        )
        .map_err(|e| StoreError::Embedding(format!("failed to load '{model_name}': {e}")))?;

        Ok(Self {
            model: Arc::new(Mutex::new(model)),
            model_name: model_name.to_string(),
            dimension,
        })
    }
}

/// Map a configured model name onto a bundled fastembed model.
///
/// Accepts both bare names and hub-style `org/name` identifiers.
fn resolve_model(name: &str) -> Result<EmbeddingModel> {
    let short = name.rsplit('/').next().unwrap_or(name);
    match short {
        "all-MiniLM-L6-v2" => Ok(EmbeddingModel::AllMiniLML6V2),
        "all-MiniLM-L12-v2" => Ok(EmbeddingModel::AllMiniLML12V2),
        "bge-small-en-v1.5" => Ok(EmbeddingModel::BGESmallENV15),
        "bge-base-en-v1.5" => Ok(EmbeddingModel::BGEBaseENV15),
        "bge-large-en-v1.5" => Ok(EmbeddingModel::BGELargeENV15),
        "nomic-embed-text-v1.5" => Ok(EmbeddingModel::NomicEmbedTextV15),
        other => Err(StoreError::Embedding(format!(
            "unsupported embedding model '{other}'"
        ))),
    }
}

#[async_trait]
impl Embedder for FastembedEmbedder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_batch(&self, texts: &[String], batch_size: usize) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = Arc::clone(&self.model);
        let owned = texts.to_vec();
        let batch = batch_size.max(1);

        let vectors = spawn_blocking(move || {
            let mut guard = model
                .lock()
                .map_err(|_| StoreError::Embedding("embedding model lock poisoned".to_string()))?;
            guard
                .embed(owned, Some(batch))
                .map_err(|e| StoreError::Embedding(e.to_string()))
        })
        .await
        .map_err(|e| StoreError::Embedding(format!("embedding task failed: {e}")))??;

        if let Some(first) = vectors.first() {
            if first.len() != self.dimension {
                return Err(StoreError::Embedding(format!(
                    "model '{}' produced dimension {}, configured {}",
                    self.model_name,
                    first.len(),
                    self.dimension
                )));
            }
        }

        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_model_names_resolve() {
        assert!(resolve_model("all-MiniLM-L6-v2").is_ok());
        assert!(resolve_model("sentence-transformers/all-MiniLM-L6-v2").is_ok());
        assert!(resolve_model("BAAI/bge-small-en-v1.5").is_ok());
    }

    #[test]
    fn test_unknown_model_name_is_rejected() {
        assert!(resolve_model("made-up-model").is_err());
    }
}
