//! Bundle loading and validation
//!
//! A bundle is lowered against the attribute catalog into typed
//! [`VersionDraft`]s and fully validated before anything reaches a
//! [`VersionStore`]. A rejected bundle leaves the store untouched.
//!
//! Checks, in order of discovery:
//! - attribute existence and role (`UnknownAttribute`, `RoleMismatch`)
//! - declared entry type against the catalog (`TypeMismatch`)
//! - literal parsing (`InvalidLiteral`) and wildcard params (`CardinalityViolation`)
//! - rows repeating an attribute (`DuplicateRowAttr`) or missing a match
//!   attribute (`MissingMatchValue`)
//! - precedence completeness and uniqueness (see [`PrecedenceTable::build`])

use crate::error::LoadError;
use crate::precedence::PrecedenceTable;
use crate::store::VersionStore;
use crate::version::ConfigVersion;
use rankwise_core::{
    Attribute, AttributeCatalog, ConfigRow, ConfigVersionId, CoreError, DataType, MatchType,
    MatchValue, PrecedenceRule, Role, TypedValue, VersionKey, VersionMeta,
};
use rankwise_parser::{BundleDocument, BundleParser, ConfigEntry, RankEntry, RowEntry, ValueEntry};
use std::collections::HashSet;
use std::fmt;

/// A validated version and its precedence table, not yet committed
#[derive(Debug, Clone, PartialEq)]
pub struct VersionDraft {
    version: ConfigVersion,
    table: PrecedenceTable,
}

impl VersionDraft {
    /// Validate `rules` against `version`
    pub fn from_parts(version: ConfigVersion, rules: Vec<PrecedenceRule>) -> Result<Self, LoadError> {
        let table = PrecedenceTable::build(&version, rules)?;
        Ok(Self { version, table })
    }

    pub fn key(&self) -> &VersionKey {
        self.version.key()
    }

    pub fn version(&self) -> &ConfigVersion {
        &self.version
    }

    pub fn table(&self) -> &PrecedenceTable {
        &self.table
    }

    pub fn into_parts(self) -> (ConfigVersion, PrecedenceTable) {
        (self.version, self.table)
    }
}

/// Non-fatal findings about a valid draft
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
    /// The row is eligible at no rank and can never be returned
    UnreachableRow { key: VersionKey, row: usize },
    /// The rank repeats an earlier rank's mask and never decides a query
    ShadowedRank {
        key: VersionKey,
        rank: u32,
        shadowed_by: u32,
    },
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationWarning::UnreachableRow { key, row } => {
                write!(f, "{}: row {} is eligible at no rank", key, row)
            }
            ValidationWarning::ShadowedRank {
                key,
                rank,
                shadowed_by,
            } => write!(
                f,
                "{}: rank {} repeats the mask of rank {}",
                key, rank, shadowed_by
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Result of a successful [`Loader::load`]
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedBundle {
    pub meta: VersionMeta,
    pub drafts: Vec<VersionDraft>,
    pub report: ValidationReport,
}

impl ValidatedBundle {
    pub fn keys(&self) -> Vec<VersionKey> {
        self.drafts.iter().map(|d| d.key().clone()).collect()
    }
}

/// Lowers bundle documents against an attribute catalog
pub struct Loader<'a> {
    catalog: &'a AttributeCatalog,
}

impl<'a> Loader<'a> {
    pub fn new(catalog: &'a AttributeCatalog) -> Self {
        Self { catalog }
    }

    pub fn load_json(&self, json: &str) -> Result<ValidatedBundle, LoadError> {
        let doc = BundleParser::parse_json(json)?;
        self.load(&doc)
    }

    pub fn load_yaml(&self, yaml: &str) -> Result<ValidatedBundle, LoadError> {
        let doc = BundleParser::parse_yaml(yaml)?;
        self.load(&doc)
    }

    /// Lower and validate every config of `doc`
    pub fn load(&self, doc: &BundleDocument) -> Result<ValidatedBundle, LoadError> {
        BundleParser::check(doc)?;

        let meta = VersionMeta {
            bundle_id: doc.config_id,
            bundle_name: doc.name.clone(),
            updated_by: doc.updated_by.clone(),
            update_date: doc.update_date.clone(),
        };

        let mut drafts = Vec::with_capacity(doc.configs.len());
        let mut report = ValidationReport::default();
        for entry in &doc.configs {
            let draft = self.lower_config(entry, doc.version, &meta)?;
            for warning in review(&draft) {
                tracing::warn!("{}", warning);
                report.warnings.push(warning);
            }
            drafts.push(draft);
        }

        tracing::info!(
            "Validated bundle '{}' v{}: {} config(s), {} warning(s)",
            doc.name,
            doc.version,
            drafts.len(),
            report.warnings.len()
        );
        Ok(ValidatedBundle {
            meta,
            drafts,
            report,
        })
    }

    /// Commit every draft of `bundle`; nothing is committed if any key exists
    pub fn install(store: &VersionStore, bundle: ValidatedBundle) -> Result<Vec<ConfigVersionId>, LoadError> {
        store.commit_all(bundle.drafts)
    }

    fn lower_config(
        &self,
        entry: &ConfigEntry,
        version_num: u32,
        meta: &VersionMeta,
    ) -> Result<VersionDraft, LoadError> {
        let key = VersionKey::new(entry.name.as_str(), version_num);
        let rows = entry
            .rows
            .iter()
            .enumerate()
            .map(|(index, row)| self.lower_row(&key, index, row))
            .collect::<Result<Vec<_>, _>>()?;
        let (declared, rules) = self.rules_from_matrix(&entry.precedence_rank)?;

        let version = ConfigVersion::new(key, meta.clone(), rows)?;
        let table = PrecedenceTable::build_with_ranks(&version, declared, rules)?;
        Ok(VersionDraft { version, table })
    }

    fn lower_row(&self, key: &VersionKey, index: usize, entry: &RowEntry) -> Result<ConfigRow, LoadError> {
        let mut seen = HashSet::new();
        let mut row = ConfigRow::new();

        for value in entry.matches.iter().chain(&entry.params) {
            if !seen.insert(value.key.as_str()) {
                return Err(LoadError::DuplicateRowAttr {
                    key: key.clone(),
                    row: index,
                    attr: value.key.clone(),
                });
            }
        }

        for value in &entry.matches {
            let attr = self.typed_attr(value, Role::Match)?;
            let literal = MatchValue::from_json(attr.data_type, &value.value)?;
            row.matches.insert(attr.id, literal);
        }

        for value in &entry.params {
            let attr = self.typed_attr(value, Role::Param)?;
            if MatchValue::is_wildcard_json(&value.value) {
                return Err(CoreError::CardinalityViolation {
                    attr: attr.name.clone(),
                    reason: "param values must be literal".to_string(),
                }
                .into());
            }
            let literal = TypedValue::from_json(attr.data_type, &value.value)?;
            row.params.insert(attr.id, literal);
        }

        Ok(row)
    }

    /// Catalog attribute for `entry`, checked for role and declared type
    fn typed_attr(&self, entry: &ValueEntry, role: Role) -> Result<&'a Attribute, LoadError> {
        let attr = self.catalog.require(&entry.key, role)?;
        check_type(attr, entry.data_type)?;
        Ok(attr)
    }

    /// Convert `{rank, attr: 0|1, ...}` entries into declared rank numbers and
    /// tall rules
    fn rules_from_matrix(&self, ranks: &[RankEntry]) -> Result<(Vec<u32>, Vec<PrecedenceRule>), LoadError> {
        let mut declared = Vec::with_capacity(ranks.len());
        let mut rules = Vec::new();
        for entry in ranks {
            let rank = u32::try_from(entry.rank)
                .ok()
                .filter(|r| *r >= 1)
                .ok_or(LoadError::InvalidRank(entry.rank))?;
            declared.push(rank);
            for (name, raw) in &entry.attrs {
                let attr = self.catalog.require(name, Role::Match)?;
                let match_type = MatchType::try_from(*raw)?;
                rules.push(PrecedenceRule::new(rank, attr.id, match_type));
            }
        }
        Ok((declared, rules))
    }
}

fn check_type(attr: &Attribute, declared: DataType) -> Result<(), CoreError> {
    if attr.data_type != declared {
        return Err(CoreError::TypeMismatch {
            attr: attr.name.clone(),
            expected: attr.data_type,
            found: declared,
        });
    }
    Ok(())
}

/// Warnings for rows and ranks that validate but can never take effect
pub fn review(draft: &VersionDraft) -> Vec<ValidationWarning> {
    let key = draft.key();
    let mut warnings: Vec<ValidationWarning> = draft
        .table
        .unreachable_rows(&draft.version)
        .into_iter()
        .map(|row| ValidationWarning::UnreachableRow {
            key: key.clone(),
            row,
        })
        .collect();
    warnings.extend(
        draft
            .table
            .shadowed_ranks()
            .into_iter()
            .map(|(rank, shadowed_by)| ValidationWarning::ShadowedRank {
                key: key.clone(),
                rank,
                shadowed_by,
            }),
    );
    warnings
}
