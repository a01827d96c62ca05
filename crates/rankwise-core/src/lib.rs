//! Rankwise Core - Core types for the Rankwise configuration resolver
//!
//! This crate provides the fundamental types shared across the Rankwise ecosystem:
//! - Typed values and data types for attribute values
//! - The append-only attribute catalog
//! - Configuration rows, fingerprints, and precedence rules
//! - Query facts
//! - Error types

pub mod error;
pub mod model;
pub mod types;

// Re-export commonly used types
pub use error::{CoreError, Result};
pub use model::{
    ConfigId, ConfigRow, ConfigVersionId, Facts, Fingerprint, Mask, MatchType, PrecedenceRule,
    Slot, SlotPattern, VersionKey, VersionMeta,
};
pub use types::{
    AttrId, Attribute, AttributeCatalog, DataType, MatchValue, Role, TypedValue, ValueColumns,
    WILDCARD_MARKER,
};
