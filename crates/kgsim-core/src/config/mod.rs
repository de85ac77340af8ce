//! Configuration management for the similarity explorer.
//!
//! Configuration is loaded in order: `config/default.toml`,
//! `config/{KGSIM_ENV}.toml`, then environment variables with the `KGSIM`
//! prefix (`KGSIM__API__SEARCH_ENDPOINT=...`). Every field has a default so
//! an empty configuration is a working one.

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::types::{default_embedding_types, EmbeddingType};

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub comparison: ComparisonConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Embedding types offered for scoring, in display/CSV column order.
    /// The first entry is the default sort key.
    #[serde(default = "default_embedding_types")]
    pub embedding_types: Vec<EmbeddingType>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            comparison: ComparisonConfig::default(),
            logging: LoggingConfig::default(),
            embedding_types: default_embedding_types(),
        }
    }
}

/// Endpoints and fixed request parameters for the two external services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Entity search endpoint.
    #[serde(default = "default_search_endpoint")]
    pub search_endpoint: String,
    /// Pairwise similarity endpoint.
    #[serde(default = "default_similarity_endpoint")]
    pub similarity_endpoint: String,
    /// Transport-level request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Search match type (`type` query parameter).
    #[serde(default = "default_match_type")]
    pub match_type: String,
    /// Search result language (`language` query parameter).
    #[serde(default = "default_language")]
    pub language: String,
    /// Item kind to search for (`item` query parameter).
    #[serde(default = "default_item")]
    pub item: String,
    /// Request extended entity records (`extra_info` query parameter).
    #[serde(default = "default_extra_info")]
    pub extra_info: bool,
}

fn default_search_endpoint() -> String {
    "https://kgtk.isi.edu/api".to_string()
}

fn default_similarity_endpoint() -> String {
    "https://kgtk.isi.edu/similarity_api".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_match_type() -> String {
    "ngram".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_item() -> String {
    "qnode".to_string()
}

fn default_extra_info() -> bool {
    true
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            search_endpoint: default_search_endpoint(),
            similarity_endpoint: default_similarity_endpoint(),
            timeout_secs: default_timeout_secs(),
            match_type: default_match_type(),
            language: default_language(),
            item: default_item(),
            extra_info: default_extra_info(),
        }
    }
}

/// Timing and buffering knobs for the two controllers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonConfig {
    /// Quiet period before a search query is dispatched, in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Delay between consecutive per-node refresh batches after a subject
    /// change, in milliseconds. Node k's batch starts at `k * stagger_ms`.
    #[serde(default = "default_stagger_ms")]
    pub stagger_ms: u64,
    /// Capacity of each controller's command channel.
    #[serde(default = "default_command_buffer")]
    pub command_buffer: usize,
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_stagger_ms() -> u64 {
    1000
}

fn default_command_buffer() -> usize {
    64
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            stagger_ms: default_stagger_ms(),
            command_buffer: default_command_buffer(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from files and environment.
    pub fn load() -> SimResult<Self> {
        let env = std::env::var("KGSIM_ENV").unwrap_or_else(|_| "development".to_string());

        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            .add_source(config::Environment::with_prefix("KGSIM").separator("__"));

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &std::path::Path) -> SimResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SimError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| SimError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> SimResult<()> {
        if self.api.search_endpoint.is_empty() {
            return Err(SimError::Config(
                "api.search_endpoint cannot be empty".into(),
            ));
        }
        if self.api.similarity_endpoint.is_empty() {
            return Err(SimError::Config(
                "api.similarity_endpoint cannot be empty".into(),
            ));
        }
        if self.api.timeout_secs == 0 {
            return Err(SimError::Config(
                "api.timeout_secs must be greater than 0".into(),
            ));
        }
        if self.comparison.command_buffer == 0 {
            return Err(SimError::Config(
                "comparison.command_buffer must be greater than 0".into(),
            ));
        }
        if self.embedding_types.is_empty() {
            return Err(SimError::Config(
                "embedding_types must contain at least one entry".into(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for embedding_type in &self.embedding_types {
            if embedding_type.value.is_empty() {
                return Err(SimError::Config(
                    "embedding_types entries must have a non-empty value".into(),
                ));
            }
            if !seen.insert(embedding_type.value.as_str()) {
                return Err(SimError::Config(format!(
                    "duplicate embedding type value: {}",
                    embedding_type.value
                )));
            }
        }

        Ok(())
    }
}
