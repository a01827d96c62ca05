//! Repository configuration types
//!
//! Selects where catalogs and versions are persisted.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Repository source type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositorySource {
    /// Keep everything in process memory
    Memory,
    /// JSON documents on disk
    #[serde(alias = "file_system")]
    FileSystem,
    /// PostgreSQL database
    Database,
}

impl Default for RepositorySource {
    fn default() -> Self {
        Self::Memory
    }
}

/// Repository configuration
///
/// # Examples
///
/// ```rust
/// use rankwise_repository::RepositoryConfig;
///
/// let config = RepositoryConfig::file_system("config-data");
/// let config = RepositoryConfig::database("postgresql://localhost/rankwise");
/// let config = RepositoryConfig::memory();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Configuration source type
    #[serde(default)]
    pub source: RepositorySource,

    /// Root directory (required for FileSystem source)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,

    /// Database connection URL (required for Database source)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,

    /// Connection pool size for the Database source
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self::memory()
    }
}

impl RepositoryConfig {
    pub fn file_system(path: impl Into<String>) -> Self {
        Self {
            source: RepositorySource::FileSystem,
            base_path: Some(path.into()),
            database_url: None,
            max_connections: default_max_connections(),
        }
    }

    pub fn database(url: impl Into<String>) -> Self {
        Self {
            source: RepositorySource::Database,
            base_path: None,
            database_url: Some(url.into()),
            max_connections: default_max_connections(),
        }
    }

    pub fn memory() -> Self {
        Self {
            source: RepositorySource::Memory,
            base_path: None,
            database_url: None,
            max_connections: default_max_connections(),
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Validate the configuration
    ///
    /// Returns an error if required fields are missing for the selected source.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.source {
            RepositorySource::FileSystem => {
                if self.base_path.as_deref().map_or(true, str::is_empty) {
                    return Err(ConfigError::MissingField {
                        backend: "FileSystem".to_string(),
                        field: "base_path".to_string(),
                    });
                }
            }
            RepositorySource::Database => {
                if self.database_url.as_deref().map_or(true, str::is_empty) {
                    return Err(ConfigError::MissingField {
                        backend: "Database".to_string(),
                        field: "database_url".to_string(),
                    });
                }
                if self.max_connections == 0 {
                    return Err(ConfigError::InvalidValue {
                        field: "max_connections".to_string(),
                        reason: "must be at least 1".to_string(),
                    });
                }
            }
            RepositorySource::Memory => {}
        }
        Ok(())
    }
}

/// Configuration error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required field is missing for the selected source
    #[error("{backend} source requires {field} to be set")]
    MissingField { backend: String, field: String },

    #[error("Invalid {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}
