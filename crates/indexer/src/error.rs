use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexerError>;

/// Errors from the indexing engine and its collaborators.
///
/// Config and collection-schema problems are fatal for a run; everything
/// file-scoped is caught per file and reported without aborting the run.
#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Chunker error: {0}")]
    Chunker(#[from] vault_chunker::ChunkerError),

    #[error("Store error: {0}")]
    Store(#[from] vault_store::StoreError),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("{0}")]
    Other(String),
}
