//! Parser error types

use thiserror::Error;

/// Parser error
#[derive(Error, Debug)]
pub enum ParseError {
    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Bundle carries no config entries
    #[error("Bundle contains no configs")]
    EmptyBundle,

    /// Missing required field
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// Two config entries share a name
    #[error("Duplicate config name in bundle: {name}")]
    DuplicateConfig { name: String },

    /// Rank below 1
    #[error("Config '{config}': rank must be >= 1 (found {rank})")]
    InvalidRank { config: String, rank: i64 },

    /// Match type other than 0 or 1
    #[error("Config '{config}': match type must be 0 or 1 (found {value} for '{attr}' at rank {rank})")]
    InvalidMatchType {
        config: String,
        rank: i64,
        attr: String,
        value: u8,
    },
}

/// Result type for parser operations
pub type Result<T> = std::result::Result<T, ParseError>;
