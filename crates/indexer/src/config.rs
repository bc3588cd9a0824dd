use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use vault_chunker::ChunkerConfig;

use crate::error::{IndexerError, Result};

const STATE_FILE_NAME: &str = ".vault-embedder-state.json";
const CONFIG_ENV_VAR: &str = "VAULT_EMBEDDER_CONFIG";
const LOCAL_CONFIG_NAME: &str = "vault-embedder.toml";

/// Vault indexing configuration, loaded from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Root of the markdown vault
    pub vault_path: PathBuf,

    /// Target collection in the vector store
    pub collection_name: String,

    /// Qdrant base URL
    pub qdrant_url: String,

    /// Optional Qdrant API key
    pub qdrant_api_key: Option<String>,

    /// Embedding model identifier
    pub model_name: String,

    /// Vector dimension the model produces
    pub model_dimensions: usize,

    /// File extensions to index (leading dot optional, case-insensitive)
    pub include_extensions: Vec<String>,

    /// Exclusion patterns in gitignore dialect, unioned with the vault's
    /// own `.gitignore`
    pub exclude_patterns: Vec<String>,

    /// Maximum chunk size in characters
    pub chunk_size: usize,

    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,

    /// Minimum chunk size in characters
    pub min_chunk_size: usize,

    /// Ledger location; defaults to `.vault-embedder-state.json` under the
    /// vault root
    pub state_file: Option<PathBuf>,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            vault_path: PathBuf::from("."),
            collection_name: "vault".to_string(),
            qdrant_url: "http://localhost:6333".to_string(),
            qdrant_api_key: None,
            model_name: "all-MiniLM-L6-v2".to_string(),
            model_dimensions: 384,
            include_extensions: vec![".md".to_string()],
            exclude_patterns: vec![
                ".*".to_string(),
                "_*".to_string(),
                "node_modules".to_string(),
            ],
            chunk_size: 1000,
            chunk_overlap: 200,
            min_chunk_size: 100,
            state_file: None,
        }
    }
}

impl VaultConfig {
    /// Resolved ledger path
    #[must_use]
    pub fn state_path(&self) -> PathBuf {
        self.state_file
            .clone()
            .unwrap_or_else(|| self.vault_path.join(STATE_FILE_NAME))
    }

    /// Chunker settings derived from this config
    #[must_use]
    pub fn chunker_config(&self) -> ChunkerConfig {
        ChunkerConfig {
            max_chunk_chars: self.chunk_size,
            overlap_chars: self.chunk_overlap,
            min_chunk_chars: self.min_chunk_size,
        }
    }
}

/// Load configuration from the first available source.
///
/// Resolution order: explicit path, `VAULT_EMBEDDER_CONFIG` env var,
/// `./vault-embedder.toml`, `$HOME/.config/vault-embedder/config.toml`.
/// An explicitly named file that cannot be read is an error; so is finding
/// no file at all.
pub fn load_config(path: Option<&Path>) -> Result<VaultConfig> {
    let explicit = path
        .map(Path::to_path_buf)
        .or_else(|| env::var_os(CONFIG_ENV_VAR).map(PathBuf::from));
    if let Some(path) = explicit {
        return read_config(&path);
    }

    let candidates = [
        Some(PathBuf::from(LOCAL_CONFIG_NAME)),
        home_config_path(),
    ];
    for candidate in candidates.into_iter().flatten() {
        if candidate.exists() {
            return read_config(&candidate);
        }
    }

    Err(IndexerError::Config(format!(
        "no configuration found; create {LOCAL_CONFIG_NAME} or set {CONFIG_ENV_VAR}"
    )))
}

fn home_config_path() -> Option<PathBuf> {
    env::var_os("HOME").map(|home| {
        PathBuf::from(home)
            .join(".config")
            .join("vault-embedder")
            .join("config.toml")
    })
}

fn read_config(path: &Path) -> Result<VaultConfig> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        IndexerError::Config(format!("cannot read config {}: {e}", path.display()))
    })?;
    toml::from_str(&text)
        .map_err(|e| IndexerError::Config(format!("invalid config {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = VaultConfig::default();
        assert_eq!(config.collection_name, "vault");
        assert_eq!(config.model_dimensions, 384);
        assert_eq!(config.include_extensions, vec![".md".to_string()]);
        assert_eq!(config.chunker_config().max_chunk_chars, 1000);
    }

    #[test]
    fn test_state_path_defaults_under_vault_root() {
        let config = VaultConfig {
            vault_path: PathBuf::from("/data/vault"),
            ..VaultConfig::default()
        };
        assert_eq!(
            config.state_path(),
            PathBuf::from("/data/vault/.vault-embedder-state.json")
        );

        let explicit = VaultConfig {
            state_file: Some(PathBuf::from("/tmp/state.json")),
            ..config
        };
        assert_eq!(explicit.state_path(), PathBuf::from("/tmp/state.json"));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: VaultConfig = toml::from_str(
            r#"
            vault_path = "/data/notes"
            collection_name = "notes"
            "#,
        )
        .unwrap();
        assert_eq!(config.vault_path, PathBuf::from("/data/notes"));
        assert_eq!(config.collection_name, "notes");
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.qdrant_url, "http://localhost:6333");
    }

    #[test]
    fn test_explicit_missing_config_is_an_error() {
        let err = load_config(Some(Path::new("/nonexistent/config.toml"))).unwrap_err();
        assert!(matches!(err, IndexerError::Config(_)));
    }
}
