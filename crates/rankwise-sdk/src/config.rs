//! Engine configuration
//!
//! Loaded from, in increasing priority: built-in defaults, an optional
//! `config/rankwise.{toml,yaml,json}` file, and `RANKWISE_*` environment
//! variables (nested keys use `__`, e.g. `RANKWISE_REPOSITORY__SOURCE=filesystem`).
//! A `.env` file is read first when present.

use crate::error::{Result, SdkError};
use rankwise_repository::RepositoryConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_CONFIG_FILE: &str = "config/rankwise";
const ENV_PREFIX: &str = "RANKWISE";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

/// Main engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Where catalogs and versions are persisted
    pub repository: RepositoryConfig,

    /// Make each newly ingested version the active one for its config
    pub activate_on_ingest: bool,

    /// Save ingested versions to the repository before committing them
    pub persist_on_ingest: bool,

    /// Default filter directive when `RUST_LOG` is unset
    pub log_level: String,

    pub log_format: LogFormat,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            repository: RepositoryConfig::memory(),
            activate_on_ingest: true,
            persist_on_ingest: true,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl EngineConfig {
    /// Create a new engine configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from `.env`, `config/rankwise.*` and `RANKWISE_*` variables
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::load_from(DEFAULT_CONFIG_FILE, false)
    }

    /// Load from a specific file (extension optional) plus the environment
    pub fn load_from(path: impl AsRef<Path>, required: bool) -> Result<Self> {
        let path = path.as_ref().to_string_lossy().to_string();
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&path).required(required))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| SdkError::ConfigError(format!("Failed to read config: {}", e)))?;

        let config: Self = settings
            .try_deserialize()
            .map_err(|e| SdkError::ConfigError(format!("Failed to deserialize config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.repository
            .validate()
            .map_err(|e| SdkError::ConfigError(e.to_string()))?;
        if self.log_level.trim().is_empty() {
            return Err(SdkError::ConfigError("log_level must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn with_repository(mut self, repository: RepositoryConfig) -> Self {
        self.repository = repository;
        self
    }

    pub fn with_activate_on_ingest(mut self, activate: bool) -> Self {
        self.activate_on_ingest = activate;
        self
    }

    pub fn with_persist_on_ingest(mut self, persist: bool) -> Self {
        self.persist_on_ingest = persist;
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }
}
