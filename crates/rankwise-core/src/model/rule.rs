//! Precedence rules (tall form)

use crate::error::{CoreError, Result};
use crate::model::row::Slot;
use crate::model::version::ConfigVersionId;
use crate::types::AttrId;
use serde::{Deserialize, Serialize};

/// Requirement a rank places on one match attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum MatchType {
    /// 0: the row must hold the wildcard
    Wildcard,
    /// 1: the row must hold a literal equal to the fact
    Literal,
}

impl MatchType {
    pub fn as_u8(&self) -> u8 {
        match self {
            MatchType::Wildcard => 0,
            MatchType::Literal => 1,
        }
    }

    pub fn slot(&self) -> Slot {
        match self {
            MatchType::Wildcard => Slot::Wildcard,
            MatchType::Literal => Slot::Literal,
        }
    }
}

impl TryFrom<u8> for MatchType {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(MatchType::Wildcard),
            1 => Ok(MatchType::Literal),
            other => Err(CoreError::InvalidMatchType(other)),
        }
    }
}

impl From<MatchType> for u8 {
    fn from(value: MatchType) -> Self {
        value.as_u8()
    }
}

/// One `(rank, attribute)` requirement of a version's precedence table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrecedenceRule {
    pub config_version_id: ConfigVersionId,
    /// 1 is the highest priority
    pub rank: u32,
    pub attr_id: AttrId,
    pub match_type: MatchType,
}

impl PrecedenceRule {
    pub fn new(rank: u32, attr_id: AttrId, match_type: MatchType) -> Self {
        Self {
            config_version_id: ConfigVersionId::UNASSIGNED,
            rank,
            attr_id,
            match_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_type_from_u8() {
        assert_eq!(MatchType::try_from(0).unwrap(), MatchType::Wildcard);
        assert_eq!(MatchType::try_from(1).unwrap(), MatchType::Literal);
        assert_eq!(MatchType::try_from(2).unwrap_err(), CoreError::InvalidMatchType(2));
    }

    #[test]
    fn test_rule_serde() {
        let rule = PrecedenceRule::new(5, AttrId(2), MatchType::Wildcard);
        let json = serde_json::to_string(&rule).unwrap();
        assert!(json.contains("\"match_type\":0"));
        let back: PrecedenceRule = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rule);
    }
}
