use thiserror::Error;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors from embedding and vector storage collaborators
#[derive(Error, Debug)]
pub enum StoreError {
    /// Existing collection is incompatible with the requested schema
    #[error("Collection schema mismatch: {0}")]
    CollectionSchema(String),

    /// Embedding generation failed
    #[error("Embedding failed: {0}")]
    Embedding(String),

    /// Storage backend rejected or failed an operation
    #[error("Storage operation failed: {0}")]
    Storage(String),

    /// HTTP transport error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("Serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}
