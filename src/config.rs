//! Configuration module for codectx.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//! - CLI argument overrides (applied by the binary)
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `CODECTX_` and use double
//! underscores to separate nested levels:
//! - `CODECTX_INDEXING__WORKERS=8` sets `indexing.workers`
//! - `CODECTX_EMBEDDING__PROVIDER=voyage` sets `embedding.provider`
//! - `CODECTX_EMBEDDING__OLLAMA__HOST=http://gpu-box:11434` sets `embedding.ollama.host`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory holding the settings file and, by default, the database.
pub const CONFIG_DIR: &str = ".codectx";

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "CODECTX_";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Path to the embeddings database
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Global debug mode (debug-level logs)
    #[serde(default)]
    pub debug: bool,

    /// Indexing configuration
    #[serde(default)]
    pub indexing: IndexingConfig,

    /// Embedding provider settings
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Query settings
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct IndexingConfig {
    /// Number of worker threads embedding files
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Capacity of the path queue between the walker and the workers
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Name of the per-directory ignore file (gitignore syntax)
    #[serde(default = "default_ignore_file")]
    pub ignore_file: String,

    /// Extra glob patterns to exclude
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider to use: "ollama" or "voyage"
    #[serde(default = "default_provider")]
    pub provider: String,

    /// HTTP timeout for a single embedding request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub ollama: OllamaConfig,

    #[serde(default)]
    pub voyage: VoyageConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct OllamaConfig {
    /// Base URL of the Ollama server
    #[serde(default = "default_ollama_host")]
    pub host: String,

    /// Embedding model served by Ollama
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct VoyageConfig {
    /// Base URL of the Voyage API
    #[serde(default = "default_voyage_base_url")]
    pub base_url: String,

    /// Voyage embedding model
    #[serde(default = "default_voyage_model")]
    pub model: String,

    /// Environment variable holding the API key
    #[serde(default = "default_voyage_api_key_env")]
    pub api_key_env: String,

    /// File containing the API key (takes precedence over the env var)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SearchConfig {
    /// Number of results to return
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Search breadth of the HNSW graph (raised to at least `limit`)
    #[serde(default = "default_ef")]
    pub ef: usize,
}

// Default value functions
fn default_db_path() -> PathBuf {
    PathBuf::from(CONFIG_DIR).join("embeddings.db")
}
fn default_workers() -> usize {
    4
}
fn default_queue_capacity() -> usize {
    5
}
fn default_ignore_file() -> String {
    ".astignore".to_string()
}
fn default_provider() -> String {
    "ollama".to_string()
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_ollama_host() -> String {
    "http://127.0.0.1:11434".to_string()
}
fn default_ollama_model() -> String {
    "unclemusclez/jina-embeddings-v2-base-code".to_string()
}
fn default_voyage_base_url() -> String {
    "https://api.voyageai.com/v1".to_string()
}
fn default_voyage_model() -> String {
    "voyage-code-3".to_string()
}
fn default_voyage_api_key_env() -> String {
    "VOYAGE_API_KEY".to_string()
}
fn default_limit() -> usize {
    5
}
fn default_ef() -> usize {
    crate::vector::DEFAULT_EF
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            debug: false,
            indexing: IndexingConfig::default(),
            embedding: EmbeddingConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
            ignore_file: default_ignore_file(),
            ignore_patterns: vec![
                "target/**".to_string(),
                "node_modules/**".to_string(),
                ".git/**".to_string(),
                format!("{CONFIG_DIR}/**"),
            ],
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            timeout_secs: default_timeout_secs(),
            ollama: OllamaConfig::default(),
            voyage: VoyageConfig::default(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: default_ollama_host(),
            model: default_ollama_model(),
        }
    }
}

impl Default for VoyageConfig {
    fn default() -> Self {
        Self {
            base_url: default_voyage_base_url(),
            model: default_voyage_model(),
            api_key_env: default_voyage_api_key_env(),
            api_key_file: None,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            ef: default_ef(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    ///
    /// Looks for `.codectx/settings.toml` from the current directory upwards.
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("settings.toml"));
        Self::layered(&config_path, ENV_PREFIX)
    }

    /// Load configuration from a specific file (plus env overrides)
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Self::layered(path.as_ref(), ENV_PREFIX)
    }

    /// Defaults, then the TOML file if it exists, then `env_prefix` variables.
    fn layered(config_path: &Path, env_prefix: &str) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_path))
            // Double underscore separates nested levels; single underscores stay
            .merge(Env::prefixed(env_prefix).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)
    }

    /// Find the workspace config by looking for a `.codectx` directory
    /// from the current directory up to root
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(CONFIG_DIR);
            if config_dir.is_dir() {
                return Some(config_dir.join("settings.toml"));
            }
        }

        None
    }
}
