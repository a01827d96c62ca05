//! Rankwise Parser - ingestion format for configuration bundles
//!
//! This crate converts serialized configuration bundles (JSON, or YAML as an
//! authoring convenience) into [`BundleDocument`] structures and back. It only
//! checks structure; typing values against the attribute catalog and validating
//! precedence tables happens in the runtime loader.
//!
//! ```json
//! {
//!   "config_id": 7,
//!   "name": "pricing",
//!   "version": 3,
//!   "updated_by": "ops",
//!   "update_date": "2025-08-01",
//!   "configs": [{
//!     "name": "discounts",
//!     "rows": [{
//!       "match":  [{ "key": "customer", "type": "str", "value": "ALL" }],
//!       "params": [{ "key": "discount_pct", "type": "dec", "value": "0.125" }]
//!     }],
//!     "precedence_rank": [{ "rank": 1, "customer": 1 }, { "rank": 2, "customer": 0 }]
//!   }]
//! }
//! ```

pub mod bundle_parser;
pub mod document;
pub mod error;

pub use bundle_parser::BundleParser;
pub use document::{BundleDocument, ConfigEntry, RankEntry, RowEntry, ValueEntry};
pub use error::{ParseError, Result};
