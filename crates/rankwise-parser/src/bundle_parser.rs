//! Bundle parser
//!
//! Parses serialized bundles and applies the structural checks that need no
//! attribute catalog.

use crate::document::BundleDocument;
use crate::error::{ParseError, Result};
use std::collections::HashSet;

/// Bundle parser
pub struct BundleParser;

impl BundleParser {
    /// Parse a JSON bundle
    pub fn parse_json(json: &str) -> Result<BundleDocument> {
        let doc: BundleDocument = serde_json::from_str(json)?;
        Self::check(&doc)?;
        Ok(doc)
    }

    /// Parse a YAML bundle
    pub fn parse_yaml(yaml: &str) -> Result<BundleDocument> {
        let doc: BundleDocument = serde_yaml::from_str(yaml)?;
        Self::check(&doc)?;
        Ok(doc)
    }

    /// Parse a JSON value already in memory
    pub fn from_value(value: serde_json::Value) -> Result<BundleDocument> {
        let doc: BundleDocument = serde_json::from_value(value)?;
        Self::check(&doc)?;
        Ok(doc)
    }

    /// Serialize a bundle as pretty-printed JSON
    pub fn to_json_pretty(doc: &BundleDocument) -> Result<String> {
        Ok(serde_json::to_string_pretty(doc)?)
    }

    /// Structural checks shared by every input format
    pub fn check(doc: &BundleDocument) -> Result<()> {
        if doc.configs.is_empty() {
            return Err(ParseError::EmptyBundle);
        }

        let mut names = HashSet::new();
        for (i, config) in doc.configs.iter().enumerate() {
            if config.name.trim().is_empty() {
                return Err(ParseError::MissingField {
                    field: format!("configs[{}].name", i),
                });
            }
            if !names.insert(config.name.as_str()) {
                return Err(ParseError::DuplicateConfig {
                    name: config.name.clone(),
                });
            }

            for (r, row) in config.rows.iter().enumerate() {
                for entry in row.matches.iter().chain(row.params.iter()) {
                    if entry.key.is_empty() {
                        return Err(ParseError::MissingField {
                            field: format!("configs[{}].rows[{}].key", i, r),
                        });
                    }
                }
            }

            for entry in &config.precedence_rank {
                if entry.rank < 1 {
                    return Err(ParseError::InvalidRank {
                        config: config.name.clone(),
                        rank: entry.rank,
                    });
                }
                if let Some((attr, value)) = entry.attrs.iter().find(|(_, v)| **v > 1) {
                    return Err(ParseError::InvalidMatchType {
                        config: config.name.clone(),
                        rank: entry.rank,
                        attr: attr.clone(),
                        value: *value,
                    });
                }
            }
        }

        Ok(())
    }
}
