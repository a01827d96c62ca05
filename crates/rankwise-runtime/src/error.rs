//! Runtime error types
//!
//! [`LoadError`] covers everything that can reject a submission; none of these
//! touch already committed versions. [`ResolveError`] covers query-time
//! failures, which never affect shared state.

use rankwise_core::{AttrId, ConfigId, ConfigVersionId, CoreError, VersionKey};
use rankwise_parser::ParseError;
use thiserror::Error;

/// Validation-time error
#[derive(Error, Debug)]
pub enum LoadError {
    /// Catalog, typing, or cardinality error
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Malformed serialized bundle
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Duplicate version: {key}")]
    DuplicateVersion { key: VersionKey },

    #[error("{key}: rank {rank} has no precedence rule for {attr}")]
    IncompleteRankError {
        key: VersionKey,
        rank: u32,
        attr: AttrId,
    },

    #[error("{key}: duplicate precedence rule for {attr} at rank {rank}")]
    DuplicateRankAttr {
        key: VersionKey,
        rank: u32,
        attr: AttrId,
    },

    #[error("{key}: rows {first} and {second} share a fingerprint and literals at rank {rank}")]
    DuplicateFingerprint {
        key: VersionKey,
        rank: u32,
        first: usize,
        second: usize,
    },

    #[error("{key}: row {row} has no value for match attribute {attr}")]
    MissingMatchValue {
        key: VersionKey,
        row: usize,
        attr: AttrId,
    },

    #[error("{key}: row {row} repeats attribute '{attr}'")]
    DuplicateRowAttr {
        key: VersionKey,
        row: usize,
        attr: String,
    },

    #[error("{key}: rank {rank} references {attr}, which is not a match attribute of any row")]
    UnusedRankAttr {
        key: VersionKey,
        rank: u32,
        attr: AttrId,
    },

    #[error("{key}: ranks must be contiguous from 1 (expected {expected}, found {found})")]
    NonContiguousRanks {
        key: VersionKey,
        expected: u32,
        found: u32,
    },

    #[error("Rank must be >= 1 (found {0})")]
    InvalidRank(i64),

    #[error("{0}: version has no rows")]
    EmptyVersion(VersionKey),

    #[error("{0}: version has no precedence rules")]
    EmptyPrecedence(VersionKey),

    #[error("{0}: precedence rules are already set")]
    RulesAlreadySet(VersionKey),

    #[error("Unknown version id: {0}")]
    UnknownVersionId(ConfigVersionId),

    #[error("Internal consistency failure: {0}")]
    Internal(String),
}

impl LoadError {
    /// Stable machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            LoadError::Core(e) => match e {
                CoreError::DuplicateAttribute { .. } => "duplicate_attribute",
                CoreError::UnknownAttribute { .. } => "unknown_attribute",
                CoreError::TypeMismatch { .. } => "type_mismatch",
                CoreError::RoleMismatch { .. } => "role_mismatch",
                CoreError::CardinalityViolation { .. } => "cardinality_violation",
                CoreError::InvalidLiteral { .. } => "invalid_literal",
                CoreError::UnknownDataType(_) => "unknown_data_type",
                CoreError::UnknownRole(_) => "unknown_role",
                CoreError::InvalidMatchType(_) => "invalid_match_type",
                CoreError::InvalidFacts(_) => "invalid_facts",
            },
            LoadError::Parse(_) => "parse_error",
            LoadError::DuplicateVersion { .. } => "duplicate_version",
            LoadError::IncompleteRankError { .. } => "incomplete_rank",
            LoadError::DuplicateRankAttr { .. } => "duplicate_rank_attr",
            LoadError::DuplicateFingerprint { .. } => "duplicate_fingerprint",
            LoadError::MissingMatchValue { .. } => "missing_match_value",
            LoadError::DuplicateRowAttr { .. } => "duplicate_row_attr",
            LoadError::UnusedRankAttr { .. } => "unused_rank_attr",
            LoadError::NonContiguousRanks { .. } => "non_contiguous_ranks",
            LoadError::InvalidRank(_) => "invalid_rank",
            LoadError::EmptyVersion(_) => "empty_version",
            LoadError::EmptyPrecedence(_) => "empty_precedence",
            LoadError::RulesAlreadySet(_) => "rules_already_set",
            LoadError::UnknownVersionId(_) => "unknown_version_id",
            LoadError::Internal(_) => "internal",
        }
    }
}

/// Query-time error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    #[error("Version not found: {key}")]
    VersionNotFound { key: VersionKey },

    #[error("No active version for config '{config_id}'")]
    NoActiveVersion { config_id: ConfigId },

    #[error("{key}: version has no precedence table")]
    MissingPrecedence { key: VersionKey },

    #[error("{key}: no rank produced a matching row")]
    NotFound { key: VersionKey },

    /// Indicates a validation gap upstream
    #[error("{key}: ambiguous match at rank {rank} (rows {rows:?})")]
    AmbiguousMatch {
        key: VersionKey,
        rank: u32,
        rows: Vec<usize>,
    },

    #[error("Internal consistency failure: {0}")]
    Internal(String),
}

impl ResolveError {
    /// Stable machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            ResolveError::VersionNotFound { .. } => "version_not_found",
            ResolveError::NoActiveVersion { .. } => "no_active_version",
            ResolveError::MissingPrecedence { .. } => "missing_precedence",
            ResolveError::NotFound { .. } => "not_found",
            ResolveError::AmbiguousMatch { .. } => "ambiguous_match",
            ResolveError::Internal(_) => "internal",
        }
    }
}
