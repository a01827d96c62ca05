//! Serialized bundle document types

use rankwise_core::DataType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One configuration bundle submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleDocument {
    pub config_id: i64,
    pub name: String,
    /// Version number given to every config in the bundle
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_date: Option<String>,
    pub configs: Vec<ConfigEntry>,
}

/// One named configuration table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub name: String,
    #[serde(default)]
    pub rows: Vec<RowEntry>,
    #[serde(default)]
    pub precedence_rank: Vec<RankEntry>,
}

/// One row: match pattern plus output params
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowEntry {
    #[serde(rename = "match", default)]
    pub matches: Vec<ValueEntry>,
    #[serde(default)]
    pub params: Vec<ValueEntry>,
}

/// A typed `{key, type, value}` entry
///
/// `value` stays untyped here; the loader checks it against `data_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueEntry {
    pub key: String,
    #[serde(rename = "type")]
    pub data_type: DataType,
    pub value: serde_json::Value,
}

impl ValueEntry {
    pub fn new(key: impl Into<String>, data_type: DataType, value: serde_json::Value) -> Self {
        Self {
            key: key.into(),
            data_type,
            value,
        }
    }
}

/// Matrix-style precedence row: `{ "rank": 1, "customer": 1, "state": 0 }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankEntry {
    pub rank: i64,
    #[serde(flatten)]
    pub attrs: BTreeMap<String, u8>,
}

impl RankEntry {
    pub fn new(rank: i64) -> Self {
        Self {
            rank,
            attrs: BTreeMap::new(),
        }
    }

    pub fn with(mut self, attr: impl Into<String>, match_type: u8) -> Self {
        self.attrs.insert(attr.into(), match_type);
        self
    }
}
