//! Persisted shapes

use rankwise_core::{ConfigRow, PrecedenceRule, VersionKey, VersionMeta};
use serde::{Deserialize, Serialize};

/// One version as storage sees it: rows and tall precedence rules
///
/// Rows keep their order; row indices reported by the resolver refer to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredVersion {
    pub key: VersionKey,
    #[serde(default)]
    pub meta: VersionMeta,
    pub rows: Vec<ConfigRow>,
    pub rules: Vec<PrecedenceRule>,
}

impl StoredVersion {
    pub fn new(key: VersionKey, meta: VersionMeta, rows: Vec<ConfigRow>, rules: Vec<PrecedenceRule>) -> Self {
        Self {
            key,
            meta,
            rows,
            rules,
        }
    }
}
