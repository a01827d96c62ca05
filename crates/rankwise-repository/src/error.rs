//! Error types for the repository layer

use crate::config::ConfigError;
use rankwise_core::CoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Errors that can occur during repository operations
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Nothing is stored under the requested key
    #[error("Not found: {what}")]
    NotFound { what: String },

    /// Versions are immutable; saving over one is refused
    #[error("Already exists: {what}")]
    AlreadyExists { what: String },

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored document could not be (de)serialized
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid path provided
    #[error("Invalid path: {path}")]
    InvalidPath { path: PathBuf },

    /// Config name unusable as a storage key
    #[error("Invalid config name: {name:?}")]
    InvalidName { name: String },

    /// Stored data violates a core invariant
    #[error("Corrupt stored data: {0}")]
    Core(#[from] CoreError),

    /// Database error (when database feature is enabled)
    #[cfg(feature = "postgres")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Generic error
    #[error("Repository error: {0}")]
    Other(String),
}
