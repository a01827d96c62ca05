//! Immutable configuration versions

use crate::error::LoadError;
use rankwise_core::{
    AttrId, ConfigId, ConfigRow, ConfigVersionId, CoreError, DataType, MatchValue, TypedValue,
    VersionKey, VersionMeta, WILDCARD_MARKER,
};
use std::collections::BTreeSet;

/// An immutable snapshot of one `(config, version)`
///
/// Every row carries a value for every match attribute of the version, so each
/// row's fingerprint is defined over the same attribute set as every rank mask.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigVersion {
    id: ConfigVersionId,
    key: VersionKey,
    meta: VersionMeta,
    rows: Vec<ConfigRow>,
    match_attrs: BTreeSet<AttrId>,
}

impl ConfigVersion {
    /// Build an uncommitted version from finished rows
    pub fn new(key: VersionKey, meta: VersionMeta, rows: Vec<ConfigRow>) -> Result<Self, LoadError> {
        if rows.is_empty() {
            return Err(LoadError::EmptyVersion(key));
        }

        let match_attrs: BTreeSet<AttrId> = rows.iter().flat_map(|row| row.match_attrs()).collect();
        for (index, row) in rows.iter().enumerate() {
            // The marker string would read back as a wildcard
            let marker = row.matches.values().any(|value| {
                matches!(value, MatchValue::Literal(TypedValue::Str(s)) if s == WILDCARD_MARKER)
            });
            if marker {
                return Err(CoreError::InvalidLiteral {
                    data_type: DataType::Str,
                    raw: WILDCARD_MARKER.to_string(),
                    reason: format!("{} row {} uses the wildcard marker as a literal", key, index),
                }
                .into());
            }
            if let Some(attr) = match_attrs.iter().find(|a| row.match_value(**a).is_none()) {
                return Err(LoadError::MissingMatchValue {
                    key,
                    row: index,
                    attr: *attr,
                });
            }
        }

        Ok(Self {
            id: ConfigVersionId::UNASSIGNED,
            key,
            meta,
            rows,
            match_attrs,
        })
    }

    pub(crate) fn with_id(mut self, id: ConfigVersionId) -> Self {
        self.id = id;
        self
    }

    pub fn id(&self) -> ConfigVersionId {
        self.id
    }

    pub fn key(&self) -> &VersionKey {
        &self.key
    }

    pub fn config_id(&self) -> &ConfigId {
        &self.key.config_id
    }

    pub fn version_num(&self) -> u32 {
        self.key.version_num
    }

    pub fn meta(&self) -> &VersionMeta {
        &self.meta
    }

    pub fn rows(&self) -> &[ConfigRow] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&ConfigRow> {
        self.rows.get(index)
    }

    /// Match attributes used by the rows, in id order
    pub fn match_attrs(&self) -> &BTreeSet<AttrId> {
        &self.match_attrs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rankwise_core::MatchValue;

    #[test]
    fn test_new_collects_match_attrs() {
        let rows = vec![
            ConfigRow::new()
                .with_match(AttrId(1), MatchValue::All)
                .with_match(AttrId(2), "AZ"),
            ConfigRow::new()
                .with_match(AttrId(1), "ACME")
                .with_match(AttrId(2), "AZ"),
        ];
        let version = ConfigVersion::new(VersionKey::new("d", 1), VersionMeta::default(), rows).unwrap();
        assert_eq!(version.match_attrs().len(), 2);
        assert!(!version.id().is_assigned());
    }

    #[test]
    fn test_new_rejects_empty() {
        let err = ConfigVersion::new(VersionKey::new("d", 1), VersionMeta::default(), vec![]).unwrap_err();
        assert!(matches!(err, LoadError::EmptyVersion(_)));
    }

    #[test]
    fn test_new_rejects_marker_literal() {
        let rows = vec![ConfigRow::new().with_match(AttrId(1), WILDCARD_MARKER)];
        let err = ConfigVersion::new(VersionKey::new("d", 1), VersionMeta::default(), rows).unwrap_err();
        assert_eq!(err.kind(), "invalid_literal");

        let rows = vec![ConfigRow::new().with_match(AttrId(1), "all")];
        assert!(ConfigVersion::new(VersionKey::new("d", 1), VersionMeta::default(), rows).is_ok());
    }

    #[test]
    fn test_new_rejects_missing_match_value() {
        let rows = vec![
            ConfigRow::new()
                .with_match(AttrId(1), "ACME")
                .with_match(AttrId(2), "AZ"),
            ConfigRow::new().with_match(AttrId(1), MatchValue::All),
        ];
        let err = ConfigVersion::new(VersionKey::new("d", 1), VersionMeta::default(), rows).unwrap_err();
        assert!(matches!(
            err,
            LoadError::MissingMatchValue {
                row: 1,
                attr: AttrId(2),
                ..
            }
        ));
    }
}
