//! Error types for Rankwise Core

use crate::types::{DataType, Role};
use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Duplicate attribute: {name}")]
    DuplicateAttribute { name: String },

    #[error("Unknown attribute: {name}")]
    UnknownAttribute { name: String },

    #[error("Type mismatch for attribute '{attr}': expected {expected}, found {found}")]
    TypeMismatch {
        attr: String,
        expected: DataType,
        found: DataType,
    },

    #[error("Role mismatch for attribute '{attr}': expected {expected}, found {found}")]
    RoleMismatch {
        attr: String,
        expected: Role,
        found: Role,
    },

    #[error("Cardinality violation for attribute '{attr}': {reason}")]
    CardinalityViolation { attr: String, reason: String },

    #[error("Invalid {data_type} literal '{raw}': {reason}")]
    InvalidLiteral {
        data_type: DataType,
        raw: String,
        reason: String,
    },

    #[error("Unknown data type: {0}")]
    UnknownDataType(String),

    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Invalid match type {0}: expected 0 (wildcard) or 1 (literal)")]
    InvalidMatchType(u8),

    #[error("Invalid facts: {0}")]
    InvalidFacts(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
