//! SDK error types

use rankwise_core::CoreError;
use rankwise_parser::ParseError;
use rankwise_repository::RepositoryError;
use rankwise_runtime::{LoadError, ResolveError};
use thiserror::Error;

/// SDK error type
#[derive(Error, Debug)]
pub enum SdkError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Catalog or fact coercion error
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Malformed bundle
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Bundle rejected by validation
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Query failed
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Storage backend error
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Subscriber could not be installed
    #[error("Telemetry error: {0}")]
    Telemetry(String),
}

impl SdkError {
    /// Stable machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            SdkError::ConfigError(_) => "config_error",
            SdkError::Core(e) => LoadError::Core(e.clone()).kind(),
            SdkError::Parse(_) => "parse_error",
            SdkError::Load(e) => e.kind(),
            SdkError::Resolve(e) => e.kind(),
            SdkError::Repository(RepositoryError::NotFound { .. }) => "storage_not_found",
            SdkError::Repository(RepositoryError::AlreadyExists { .. }) => "storage_conflict",
            SdkError::Repository(_) => "storage_error",
            SdkError::Telemetry(_) => "telemetry_error",
        }
    }
}

/// Result type for SDK operations
pub type Result<T> = std::result::Result<T, SdkError>;
