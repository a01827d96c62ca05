//! Config and version identity

use serde::{Deserialize, Serialize};
use std::fmt;

/// Configuration identifier (the config table's name)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigId(pub String);

impl ConfigId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConfigId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ConfigId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Handle of a committed version in the version arena
///
/// Id 0 marks a version that has been validated but not yet committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigVersionId(pub u32);

impl ConfigVersionId {
    pub const UNASSIGNED: ConfigVersionId = ConfigVersionId(0);

    pub fn is_assigned(&self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for ConfigVersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cv#{}", self.0)
    }
}

/// Unique key of a version: `(config_id, version_num)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VersionKey {
    pub config_id: ConfigId,
    pub version_num: u32,
}

impl VersionKey {
    pub fn new(config_id: impl Into<ConfigId>, version_num: u32) -> Self {
        Self {
            config_id: config_id.into(),
            version_num,
        }
    }
}

impl fmt::Display for VersionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@v{}", self.config_id, self.version_num)
    }
}

/// Bundle metadata recorded with every version created from a submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionMeta {
    /// `config_id` of the submitted bundle
    pub bundle_id: i64,
    /// `name` of the submitted bundle
    pub bundle_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_date: Option<String>,
}
