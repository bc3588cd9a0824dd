//! # Vault Store
//!
//! Embedding and vector storage collaborators for the vault indexer.
//!
//! The crate is split along the engine's two seams:
//!
//! - [`Embedder`]: text to vector. Implemented by [`FastembedEmbedder`]
//!   for local ONNX inference.
//! - [`VectorStore`]: collection and point operations. Implemented by
//!   [`QdrantStore`] (REST) and [`MemoryStore`] (in-process, used by tests
//!   and local runs).
//!
//! Both traits are object-safe; the engine holds them behind `Arc<dyn _>`.

mod embedding;
mod error;
mod memory;
mod qdrant;
mod traits;
mod types;

pub use embedding::FastembedEmbedder;
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use qdrant::QdrantStore;
pub use traits::{Embedder, VectorStore};
pub use types::{ChunkPayload, ChunkPoint, CollectionStats, PayloadFilter, ScoredPoint};
