//! Rankwise Runtime - precedence-based configuration resolution
//!
//! This crate holds the in-memory engine:
//! - [`VersionStore`]: append-only arena of immutable config versions with an
//!   atomically swapped snapshot and per-config active version
//! - [`PrecedenceTable`]: per-version ordered ranks and their masks
//! - [`Resolver`]: "most specific match wins" resolution of a query against a
//!   version
//! - [`Loader`]: typing and validation of ingested bundles before activation
//! - [`export`]: serialization of committed versions back into bundles
//!
//! Resolution is a pure read over immutable data. The only mutation is the
//! publication of a new store snapshot, so readers never block.

pub mod error;
pub mod export;
pub mod loader;
pub mod precedence;
pub mod resolver;
pub mod store;
pub mod version;

pub use error::{LoadError, ResolveError};
pub use loader::{Loader, ValidatedBundle, ValidationReport, ValidationWarning, VersionDraft};
pub use precedence::{PrecedenceTable, RankGroup};
pub use resolver::{RankStep, Resolution, ResolutionTrace, Resolver};
pub use store::{StoreSnapshot, VersionEntry, VersionStore};
pub use version::ConfigVersion;
