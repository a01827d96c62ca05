//! Most-specific-match resolution
//!
//! Ranks are walked in ascending order. At each rank only the rows whose
//! fingerprint equals the rank's mask are considered, and of those only the
//! ones whose literals equal the query facts at every literal position of the
//! mask survive. The first rank with exactly one survivor wins.

use crate::error::ResolveError;
use crate::precedence::PrecedenceTable;
use crate::store::VersionEntry;
use crate::version::ConfigVersion;
use rankwise_core::{
    AttrId, AttributeCatalog, ConfigId, ConfigRow, Facts, MatchValue, TypedValue, VersionKey,
};
use std::collections::{BTreeMap, HashMap};

/// The winning row of a resolution
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub key: VersionKey,
    pub rank: u32,
    pub row_index: usize,
    /// Param values keyed by attribute name
    pub params: BTreeMap<String, TypedValue>,
}

impl Resolution {
    pub fn config_id(&self) -> &ConfigId {
        &self.key.config_id
    }

    pub fn version_num(&self) -> u32 {
        self.key.version_num
    }

    pub fn param(&self, name: &str) -> Option<&TypedValue> {
        self.params.get(name)
    }

    /// Params as a JSON object
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.params
                .iter()
                .map(|(name, value)| (name.clone(), value.to_json()))
                .collect(),
        )
    }
}

/// What happened at one consulted rank
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankStep {
    pub rank: u32,
    /// Rows whose fingerprint equals the rank's mask
    pub eligible: usize,
    /// Eligible rows whose literals matched the facts
    pub survivors: Vec<usize>,
}

/// Ranks consulted by a resolution, in order; stops at the deciding rank
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionTrace {
    pub steps: Vec<RankStep>,
}

impl ResolutionTrace {
    pub fn consulted_ranks(&self) -> Vec<u32> {
        self.steps.iter().map(|s| s.rank).collect()
    }

    /// Rank that produced a single survivor, if any
    pub fn winning_rank(&self) -> Option<u32> {
        self.steps
            .last()
            .filter(|s| s.survivors.len() == 1)
            .map(|s| s.rank)
    }
}

/// Resolves queries against versions whose attributes live in `catalog`
pub struct Resolver<'a> {
    catalog: &'a AttributeCatalog,
}

impl<'a> Resolver<'a> {
    pub fn new(catalog: &'a AttributeCatalog) -> Self {
        Self { catalog }
    }

    pub fn resolve(
        &self,
        version: &ConfigVersion,
        table: &PrecedenceTable,
        facts: &Facts,
    ) -> Result<Resolution, ResolveError> {
        self.run(version, table, facts, None)
    }

    /// Resolve against a committed store entry
    pub fn resolve_entry(&self, entry: &VersionEntry, facts: &Facts) -> Result<Resolution, ResolveError> {
        let table = entry.require_precedence()?;
        self.resolve(entry.version(), table, facts)
    }

    /// Resolve and record every consulted rank
    pub fn resolve_traced(
        &self,
        version: &ConfigVersion,
        table: &PrecedenceTable,
        facts: &Facts,
    ) -> (Result<Resolution, ResolveError>, ResolutionTrace) {
        let mut trace = ResolutionTrace::default();
        let result = self.run(version, table, facts, Some(&mut trace));
        (result, trace)
    }

    /// Facts keyed by the version's match attribute ids; absent facts stay absent
    fn bind_facts<'f>(
        &self,
        version: &ConfigVersion,
        facts: &'f Facts,
    ) -> Result<HashMap<AttrId, &'f TypedValue>, ResolveError> {
        let mut bound = HashMap::with_capacity(version.match_attrs().len());
        for attr in version.match_attrs() {
            let name = self.catalog.name_of(*attr).ok_or_else(|| {
                ResolveError::Internal(format!(
                    "{}: match attribute {} is absent from the catalog",
                    version.key(),
                    attr
                ))
            })?;
            if let Some(value) = facts.get(name) {
                bound.insert(*attr, value);
            }
        }
        Ok(bound)
    }

    fn run(
        &self,
        version: &ConfigVersion,
        table: &PrecedenceTable,
        facts: &Facts,
        mut trace: Option<&mut ResolutionTrace>,
    ) -> Result<Resolution, ResolveError> {
        if !table.fits(version) {
            return Err(ResolveError::Internal(format!(
                "precedence table of {} applied to {}",
                table.key(),
                version.key()
            )));
        }

        let bound = self.bind_facts(version, facts)?;
        let rows = version.rows();

        for group in table.ranks_ascending() {
            let survivors: Vec<usize> = group
                .eligible_rows()
                .iter()
                .copied()
                .filter(|&index| {
                    rows.get(index).is_some_and(|row| {
                        group
                            .mask()
                            .literal_attrs()
                            .all(|attr| literal_matches(row, attr, &bound))
                    })
                })
                .collect();

            tracing::debug!(
                config = %version.config_id(),
                version = version.version_num(),
                rank = group.rank(),
                eligible = group.eligible_rows().len(),
                candidates = ?survivors,
                "rank {} mask {}",
                group.rank(),
                group.mask()
            );
            if let Some(trace) = trace.as_deref_mut() {
                trace.steps.push(RankStep {
                    rank: group.rank(),
                    eligible: group.eligible_rows().len(),
                    survivors: survivors.clone(),
                });
            }

            match survivors.as_slice() {
                [] => continue,
                [index] => {
                    let row = rows.get(*index).ok_or_else(|| {
                        ResolveError::Internal(format!("{}: row {} out of range", version.key(), index))
                    })?;
                    return Ok(Resolution {
                        key: version.key().clone(),
                        rank: group.rank(),
                        row_index: *index,
                        params: self.named_params(version, row)?,
                    });
                }
                _ => {
                    tracing::error!(
                        config = %version.config_id(),
                        version = version.version_num(),
                        rank = group.rank(),
                        candidates = ?survivors,
                        "Data integrity: ambiguous match in {}",
                        version.key()
                    );
                    return Err(ResolveError::AmbiguousMatch {
                        key: version.key().clone(),
                        rank: group.rank(),
                        rows: survivors,
                    });
                }
            }
        }

        Err(ResolveError::NotFound {
            key: version.key().clone(),
        })
    }

    fn named_params(
        &self,
        version: &ConfigVersion,
        row: &ConfigRow,
    ) -> Result<BTreeMap<String, TypedValue>, ResolveError> {
        row.params
            .iter()
            .map(|(attr, value)| {
                let name = self.catalog.name_of(*attr).ok_or_else(|| {
                    ResolveError::Internal(format!(
                        "{}: param attribute {} is absent from the catalog",
                        version.key(),
                        attr
                    ))
                })?;
                Ok((name.to_string(), value.clone()))
            })
            .collect()
    }
}

fn literal_matches(row: &ConfigRow, attr: AttrId, bound: &HashMap<AttrId, &TypedValue>) -> bool {
    match (row.match_value(attr), bound.get(&attr)) {
        (Some(MatchValue::Literal(literal)), Some(fact)) => literal.equals(fact),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rankwise_core::{DataType, Mask, MatchType, PrecedenceRule, Role, Slot, VersionMeta};

    fn catalog() -> AttributeCatalog {
        let mut catalog = AttributeCatalog::new();
        catalog.define("customer", Role::Match, DataType::Str).unwrap();
        catalog.define("state", Role::Match, DataType::Str).unwrap();
        catalog.define("discount_pct", Role::Param, DataType::Dec).unwrap();
        catalog
    }

    fn fixture(catalog: &AttributeCatalog) -> (ConfigVersion, PrecedenceTable) {
        let customer = catalog.lookup("customer").unwrap().id;
        let state = catalog.lookup("state").unwrap().id;
        let pct = catalog.lookup("discount_pct").unwrap().id;

        let version = ConfigVersion::new(
            VersionKey::new("discounts", 1),
            VersionMeta::default(),
            vec![
                ConfigRow::new()
                    .with_match(customer, MatchValue::All)
                    .with_match(state, "AZ")
                    .with_param(pct, TypedValue::dec("0.125").unwrap()),
                ConfigRow::new()
                    .with_match(customer, "ACME")
                    .with_match(state, "AZ")
                    .with_param(pct, TypedValue::dec("0.150").unwrap()),
            ],
        )
        .unwrap();
        let rules = vec![
            PrecedenceRule::new(1, customer, MatchType::Literal),
            PrecedenceRule::new(1, state, MatchType::Literal),
            PrecedenceRule::new(2, customer, MatchType::Wildcard),
            PrecedenceRule::new(2, state, MatchType::Literal),
        ];
        let table = PrecedenceTable::build(&version, rules).unwrap();
        (version, table)
    }

    #[test]
    fn test_most_specific_row_wins() {
        let catalog = catalog();
        let (version, table) = fixture(&catalog);
        let resolver = Resolver::new(&catalog);

        let facts = Facts::new().with("customer", "ACME").with("state", "AZ");
        let hit = resolver.resolve(&version, &table, &facts).unwrap();
        assert_eq!(hit.rank, 1);
        assert_eq!(hit.row_index, 1);
        assert_eq!(hit.param("discount_pct"), Some(&TypedValue::dec("0.15").unwrap()));
    }

    #[test]
    fn test_falls_through_to_wildcard_rank() {
        let catalog = catalog();
        let (version, table) = fixture(&catalog);
        let resolver = Resolver::new(&catalog);

        let facts = Facts::new().with("customer", "OTHERCO").with("state", "AZ");
        let (result, trace) = resolver.resolve_traced(&version, &table, &facts);
        let hit = result.unwrap();
        assert_eq!(hit.row_index, 0);
        assert_eq!(trace.consulted_ranks(), vec![1, 2]);
        assert_eq!(trace.winning_rank(), Some(2));
        assert!(trace.steps[0].survivors.is_empty());
    }

    #[test]
    fn test_missing_fact_eliminates_literal_rows() {
        let catalog = catalog();
        let (version, table) = fixture(&catalog);
        let resolver = Resolver::new(&catalog);

        let err = resolver
            .resolve(&version, &table, &Facts::new().with("customer", "ACME"))
            .unwrap_err();
        assert!(matches!(err, ResolveError::NotFound { .. }));
    }

    #[test]
    fn test_mismatched_fact_type_never_matches() {
        let catalog = catalog();
        let (version, table) = fixture(&catalog);
        let resolver = Resolver::new(&catalog);

        let facts = Facts::new().with("customer", "ACME").with("state", 7i64);
        let err = resolver.resolve(&version, &table, &facts).unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[test]
    fn test_foreign_table_is_internal_error() {
        let catalog = catalog();
        let (version, _) = fixture(&catalog);
        let state = catalog.lookup("state").unwrap().id;
        let customer = catalog.lookup("customer").unwrap().id;

        let other = ConfigVersion::new(
            VersionKey::new("discounts", 2),
            VersionMeta::default(),
            version.rows().to_vec(),
        )
        .unwrap();
        let table = PrecedenceTable::build(
            &other,
            vec![
                PrecedenceRule::new(1, customer, MatchType::Literal),
                PrecedenceRule::new(1, state, MatchType::Literal),
            ],
        )
        .unwrap();

        let err = Resolver::new(&catalog)
            .resolve(&version, &table, &Facts::new())
            .unwrap_err();
        assert_eq!(err.kind(), "internal");
    }

    #[test]
    fn test_table_from_other_rows_is_internal_error() {
        let catalog = catalog();
        let (version, table) = fixture(&catalog);
        let customer = catalog.lookup("customer").unwrap().id;
        let state = catalog.lookup("state").unwrap().id;

        let shorter = ConfigVersion::new(
            version.key().clone(),
            VersionMeta::default(),
            vec![ConfigRow::new()
                .with_match(customer, "ACME")
                .with_match(state, "AZ")],
        )
        .unwrap();

        let facts = Facts::new().with("customer", "OTHERCO").with("state", "AZ");
        let err = Resolver::new(&catalog)
            .resolve(&shorter, &table, &facts)
            .unwrap_err();
        assert!(matches!(err, ResolveError::Internal(_)));
    }

    #[test]
    fn test_two_survivors_are_ambiguous() {
        let catalog = catalog();
        let customer = catalog.lookup("customer").unwrap().id;
        let state = catalog.lookup("state").unwrap().id;
        let pct = catalog.lookup("discount_pct").unwrap().id;

        let acme = |value: &str| {
            ConfigRow::new()
                .with_match(customer, "ACME")
                .with_match(state, "AZ")
                .with_param(pct, TypedValue::dec(value).unwrap())
        };
        let version = ConfigVersion::new(
            VersionKey::new("discounts", 1),
            VersionMeta::default(),
            vec![
                acme("0.10"),
                acme("0.20"),
                ConfigRow::new()
                    .with_match(customer, MatchValue::All)
                    .with_match(state, "AZ")
                    .with_param(pct, TypedValue::dec("0.05").unwrap()),
            ],
        )
        .unwrap();

        let literal: Mask = [(customer, Slot::Literal), (state, Slot::Literal)].into_iter().collect();
        let fallback: Mask = [(customer, Slot::Wildcard), (state, Slot::Literal)].into_iter().collect();
        let table = PrecedenceTable::unchecked(&version, vec![(1, literal), (2, fallback)]);

        let facts = Facts::new().with("customer", "ACME").with("state", "AZ");
        let (result, trace) = Resolver::new(&catalog).resolve_traced(&version, &table, &facts);
        assert_eq!(
            result.unwrap_err(),
            ResolveError::AmbiguousMatch {
                key: VersionKey::new("discounts", 1),
                rank: 1,
                rows: vec![0, 1],
            }
        );
        assert_eq!(trace.consulted_ranks(), vec![1]);
        assert_eq!(trace.winning_rank(), None);
    }
}
