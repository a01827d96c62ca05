//! Type system for Rankwise
//!
//! This module contains the attribute type system including:
//! - Typed values and the wildcard marker
//! - Attribute definitions and the attribute catalog

pub mod attribute;
pub mod value;

pub use attribute::{AttrId, Attribute, AttributeCatalog, Role};
pub use value::{DataType, MatchValue, TypedValue, ValueColumns, WILDCARD_MARKER};
