//! Rankwise SDK
//!
//! High-level API for ingesting precedence-ranked configuration bundles and
//! resolving queries against them.
//!
//! ```rust,ignore
//! use rankwise_sdk::{ConfigEngineBuilder, DataType, Facts, Role};
//!
//! let engine = ConfigEngineBuilder::new()
//!     .with_attribute("customer", Role::Match, DataType::Str)
//!     .with_attribute("discount_pct", Role::Param, DataType::Dec)
//!     .build()
//!     .await?;
//!
//! engine.ingest_json(&bundle_json).await?;
//! let resolution = engine.resolve_active("discounts", &Facts::new().with("customer", "ACME"))?;
//! ```

pub mod builder;
pub mod config;
pub mod engine;
pub mod error;
pub mod telemetry;

pub use builder::ConfigEngineBuilder;
pub use config::{EngineConfig, LogFormat};
pub use engine::{ConfigEngine, Explanation, IngestReport};
pub use error::{Result, SdkError};

// Re-export commonly used types from dependencies
pub use rankwise_core::{DataType, Facts, Role, TypedValue, VersionKey};
pub use rankwise_parser::BundleDocument;
pub use rankwise_repository::{RepositoryConfig, RepositorySource};
pub use rankwise_runtime::{Resolution, ResolutionTrace, ValidationWarning};
