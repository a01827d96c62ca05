//! Configuration data model
//!
//! This module contains:
//! - Config and version identity
//! - Configuration rows and their wildcard/literal fingerprints
//! - Precedence rules
//! - Query facts

pub mod facts;
pub mod row;
pub mod rule;
pub mod version;

pub use facts::Facts;
pub use row::{ConfigRow, Fingerprint, Mask, Slot, SlotPattern};
pub use rule::{MatchType, PrecedenceRule};
pub use version::{ConfigId, ConfigVersionId, VersionKey, VersionMeta};
