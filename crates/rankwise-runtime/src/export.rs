//! Export of versions back into bundle documents
//!
//! Loading an exported bundle against the same catalog reproduces the
//! original rows and precedence table.

use crate::error::LoadError;
use crate::loader::VersionDraft;
use crate::precedence::PrecedenceTable;
use crate::store::VersionEntry;
use crate::version::ConfigVersion;
use rankwise_core::{AttrId, Attribute, AttributeCatalog, MatchType, Slot, VersionMeta};
use rankwise_parser::{BundleDocument, ConfigEntry, ParseError, RankEntry, RowEntry, ValueEntry};
use std::sync::Arc;

/// Bundle holding committed versions that share one version number
pub fn to_bundle(catalog: &AttributeCatalog, entries: &[Arc<VersionEntry>]) -> Result<BundleDocument, LoadError> {
    let pairs = entries
        .iter()
        .map(|entry| {
            let table = entry.precedence().ok_or_else(|| {
                LoadError::Internal(format!("{} has no precedence table to export", entry.key()))
            })?;
            Ok((entry.version().as_ref(), table.as_ref()))
        })
        .collect::<Result<Vec<_>, LoadError>>()?;
    assemble(catalog, &pairs)
}

/// Bundle holding validated drafts
pub fn drafts_to_bundle(catalog: &AttributeCatalog, drafts: &[VersionDraft]) -> Result<BundleDocument, LoadError> {
    let pairs: Vec<_> = drafts.iter().map(|d| (d.version(), d.table())).collect();
    assemble(catalog, &pairs)
}

/// One config entry in ingestion form
pub fn export_config(
    catalog: &AttributeCatalog,
    version: &ConfigVersion,
    table: &PrecedenceTable,
) -> Result<ConfigEntry, LoadError> {
    let rows = version
        .rows()
        .iter()
        .map(|row| {
            let matches = row
                .matches
                .iter()
                .map(|(attr, value)| {
                    let attr = attribute(catalog, *attr)?;
                    Ok(ValueEntry::new(attr.name.clone(), attr.data_type, value.to_json()))
                })
                .collect::<Result<Vec<_>, LoadError>>()?;
            let params = row
                .params
                .iter()
                .map(|(attr, value)| {
                    let attr = attribute(catalog, *attr)?;
                    Ok(ValueEntry::new(attr.name.clone(), attr.data_type, value.to_json()))
                })
                .collect::<Result<Vec<_>, LoadError>>()?;
            Ok(RowEntry { matches, params })
        })
        .collect::<Result<Vec<_>, LoadError>>()?;

    let mut precedence_rank = Vec::with_capacity(table.rank_count());
    for group in table.ranks_ascending() {
        let mut entry = RankEntry::new(i64::from(group.rank()));
        for (attr, slot) in group.mask().iter() {
            let match_type = match slot {
                Slot::Wildcard => MatchType::Wildcard,
                Slot::Literal => MatchType::Literal,
            };
            entry = entry.with(attribute(catalog, attr)?.name.clone(), match_type.as_u8());
        }
        precedence_rank.push(entry);
    }

    Ok(ConfigEntry {
        name: version.config_id().to_string(),
        rows,
        precedence_rank,
    })
}

fn assemble(
    catalog: &AttributeCatalog,
    versions: &[(&ConfigVersion, &PrecedenceTable)],
) -> Result<BundleDocument, LoadError> {
    let (first, _) = versions.first().ok_or(ParseError::EmptyBundle)?;
    let version_num = first.version_num();
    let meta: &VersionMeta = first.meta();

    let mut configs = Vec::with_capacity(versions.len());
    for (version, table) in versions {
        if version.version_num() != version_num {
            return Err(LoadError::Internal(format!(
                "cannot export {} with v{} in one bundle",
                version.key(),
                version_num
            )));
        }
        configs.push(export_config(catalog, version, table)?);
    }

    Ok(BundleDocument {
        config_id: meta.bundle_id,
        name: meta.bundle_name.clone(),
        version: version_num,
        updated_by: meta.updated_by.clone(),
        update_date: meta.update_date.clone(),
        configs,
    })
}

fn attribute(catalog: &AttributeCatalog, id: AttrId) -> Result<&Attribute, LoadError> {
    catalog
        .get(id)
        .ok_or_else(|| LoadError::Internal(format!("{} is absent from the catalog", id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::Loader;
    use crate::store::VersionStore;
    use rankwise_core::{DataType, Role};
    use rankwise_parser::BundleParser;

    const BUNDLE: &str = r#"{
        "config_id": 3,
        "name": "fees",
        "version": 2,
        "updated_by": "ops",
        "configs": [{
            "name": "late_fee",
            "rows": [
                { "match": [{ "key": "region", "type": "str", "value": "ALL" }],
                  "params": [{ "key": "fee", "type": "dec", "value": "5.00" },
                             { "key": "waivable", "type": "bool", "value": true }] },
                { "match": [{ "key": "region", "type": "str", "value": "EU" }],
                  "params": [{ "key": "fee", "type": "dec", "value": "4.50" },
                             { "key": "waivable", "type": "bool", "value": false }] }
            ],
            "precedence_rank": [
                { "rank": 1, "region": 1 },
                { "rank": 2, "region": 0 }
            ]
        }]
    }"#;

    fn catalog() -> AttributeCatalog {
        let mut catalog = AttributeCatalog::new();
        catalog.define("region", Role::Match, DataType::Str).unwrap();
        catalog.define("fee", Role::Param, DataType::Dec).unwrap();
        catalog.define("waivable", Role::Param, DataType::Bool).unwrap();
        catalog
    }

    #[test]
    fn test_drafts_round_trip() {
        let catalog = catalog();
        let loader = Loader::new(&catalog);
        let original = loader.load_json(BUNDLE).unwrap();

        let doc = drafts_to_bundle(&catalog, &original.drafts).unwrap();
        assert_eq!(doc.version, 2);
        assert_eq!(doc.updated_by.as_deref(), Some("ops"));
        assert_eq!(doc.configs[0].rows[0].matches[0].value, serde_json::json!("ALL"));

        let json = BundleParser::to_json_pretty(&doc).unwrap();
        let reloaded = loader.load_json(&json).unwrap();
        assert_eq!(reloaded.drafts, original.drafts);
        assert_eq!(reloaded.meta, original.meta);
    }

    #[test]
    fn test_committed_entries_export() {
        let catalog = catalog();
        let store = VersionStore::new();
        Loader::install(&store, Loader::new(&catalog).load_json(BUNDLE).unwrap()).unwrap();

        let snapshot = store.snapshot();
        let entries: Vec<_> = snapshot.iter().cloned().collect();
        let doc = to_bundle(&catalog, &entries).unwrap();
        assert_eq!(doc.configs[0].name, "late_fee");
        assert_eq!(doc.configs[0].precedence_rank[1], RankEntry::new(2).with("region", 0));
    }

    #[test]
    fn test_empty_export_rejected() {
        let err = to_bundle(&catalog(), &[]).unwrap_err();
        assert_eq!(err.kind(), "parse_error");
    }
}
