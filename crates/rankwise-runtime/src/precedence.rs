//! Precedence tables
//!
//! A precedence table orders a version's ranks. Each rank's mask assigns every
//! match attribute either "require literal" or "require wildcard"; a row is
//! eligible at a rank iff its fingerprint equals the mask.
//!
//! The table is built once per version and never changes afterwards, so the
//! ascending rank list and each rank's eligible rows are computed at build
//! time and reused by every resolution.

use crate::error::LoadError;
use crate::version::ConfigVersion;
use rankwise_core::{
    ConfigRow, ConfigVersionId, Fingerprint, Mask, PrecedenceRule, VersionKey,
};
use std::collections::{BTreeMap, HashMap};

/// One rank: its number, mask, and the rows whose fingerprint equals the mask
#[derive(Debug, Clone, PartialEq)]
pub struct RankGroup {
    rank: u32,
    mask: Mask,
    eligible_rows: Vec<usize>,
}

impl RankGroup {
    pub fn rank(&self) -> u32 {
        self.rank
    }

    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    /// Row indices eligible at this rank, ascending
    pub fn eligible_rows(&self) -> &[usize] {
        &self.eligible_rows
    }
}

/// Validated, ordered precedence rules of one version
#[derive(Debug, Clone, PartialEq)]
pub struct PrecedenceTable {
    config_version_id: ConfigVersionId,
    key: VersionKey,
    rules: Vec<PrecedenceRule>,
    ranks: Vec<RankGroup>,
    /// Row count of the version the table was built from
    row_count: usize,
}

impl PrecedenceTable {
    /// Validate `rules` against `version` and build the table
    ///
    /// Rules are re-tagged with the version's id. Fails when:
    /// - a `(rank, attr)` pair repeats (`DuplicateRankAttr`)
    /// - a rank lacks a rule for a match attribute (`IncompleteRankError`)
    /// - a rule names an attribute the rows do not match on (`UnusedRankAttr`)
    /// - ranks are not exactly `1..=n` (`NonContiguousRanks`)
    /// - two rows eligible at the same rank carry identical literals at the
    ///   rank's literal positions (`DuplicateFingerprint`)
    pub fn build(version: &ConfigVersion, rules: Vec<PrecedenceRule>) -> Result<Self, LoadError> {
        Self::build_with_ranks(version, std::iter::empty(), rules)
    }

    /// Like [`build`](Self::build), with rank numbers declared independently of
    /// their rules
    ///
    /// A declared rank without rules is incomplete rather than absent.
    pub fn build_with_ranks(
        version: &ConfigVersion,
        declared: impl IntoIterator<Item = u32>,
        mut rules: Vec<PrecedenceRule>,
    ) -> Result<Self, LoadError> {
        let key = version.key().clone();

        let mut masks: BTreeMap<u32, Mask> = BTreeMap::new();
        for rank in declared {
            if rank == 0 {
                return Err(LoadError::InvalidRank(0));
            }
            masks.entry(rank).or_default();
        }
        if rules.is_empty() && masks.is_empty() {
            return Err(LoadError::EmptyPrecedence(key));
        }

        for rule in &rules {
            if rule.rank == 0 {
                return Err(LoadError::InvalidRank(0));
            }
            if !version.match_attrs().contains(&rule.attr_id) {
                return Err(LoadError::UnusedRankAttr {
                    key,
                    rank: rule.rank,
                    attr: rule.attr_id,
                });
            }
            let mask = masks.entry(rule.rank).or_default();
            if mask.insert(rule.attr_id, rule.match_type.slot()).is_some() {
                return Err(LoadError::DuplicateRankAttr {
                    key,
                    rank: rule.rank,
                    attr: rule.attr_id,
                });
            }
        }

        for (expected, rank) in (1u32..).zip(masks.keys()) {
            if *rank != expected {
                return Err(LoadError::NonContiguousRanks {
                    key,
                    expected,
                    found: *rank,
                });
            }
        }

        for (rank, mask) in &masks {
            if let Some(attr) = version.match_attrs().iter().find(|a| mask.get(**a).is_none()) {
                return Err(LoadError::IncompleteRankError {
                    key,
                    rank: *rank,
                    attr: *attr,
                });
            }
        }

        let fingerprints: Vec<Fingerprint> = version.rows().iter().map(ConfigRow::fingerprint).collect();
        let mut ranks = Vec::with_capacity(masks.len());
        for (rank, mask) in masks {
            let eligible_rows: Vec<usize> = fingerprints
                .iter()
                .enumerate()
                .filter(|(_, fp)| **fp == mask)
                .map(|(i, _)| i)
                .collect();

            let mut seen: HashMap<Vec<String>, usize> = HashMap::new();
            for &row in &eligible_rows {
                let literals = version.rows()[row].literal_key(&mask);
                if let Some(&first) = seen.get(&literals) {
                    return Err(LoadError::DuplicateFingerprint {
                        key,
                        rank,
                        first,
                        second: row,
                    });
                }
                seen.insert(literals, row);
            }

            ranks.push(RankGroup {
                rank,
                mask,
                eligible_rows,
            });
        }

        for rule in &mut rules {
            rule.config_version_id = version.id();
        }
        rules.sort_by_key(|r| (r.rank, r.attr_id));

        Ok(Self {
            config_version_id: version.id(),
            key,
            rules,
            ranks,
            row_count: version.rows().len(),
        })
    }

    /// Table with the given masks and no uniqueness check, for exercising the
    /// resolver's ambiguity path
    #[cfg(test)]
    pub(crate) fn unchecked(version: &ConfigVersion, masks: Vec<(u32, Mask)>) -> Self {
        let ranks = masks
            .into_iter()
            .map(|(rank, mask)| RankGroup {
                rank,
                eligible_rows: version
                    .rows()
                    .iter()
                    .enumerate()
                    .filter(|(_, row)| row.fingerprint() == mask)
                    .map(|(i, _)| i)
                    .collect(),
                mask,
            })
            .collect();
        Self {
            config_version_id: version.id(),
            key: version.key().clone(),
            rules: Vec::new(),
            ranks,
            row_count: version.rows().len(),
        }
    }

    pub(crate) fn with_version_id(mut self, id: ConfigVersionId) -> Self {
        self.config_version_id = id;
        for rule in &mut self.rules {
            rule.config_version_id = id;
        }
        self
    }

    pub fn config_version_id(&self) -> ConfigVersionId {
        self.config_version_id
    }

    pub fn key(&self) -> &VersionKey {
        &self.key
    }

    /// Ranks in ascending numeric order (rank 1 first)
    pub fn ranks_ascending(&self) -> &[RankGroup] {
        &self.ranks
    }

    /// Rules in tall form, ordered by `(rank, attr_id)`
    pub fn rules(&self) -> &[PrecedenceRule] {
        &self.rules
    }

    /// Whether the table's cached row indices apply to `version`
    pub fn fits(&self, version: &ConfigVersion) -> bool {
        self.key == *version.key()
            && self.config_version_id == version.id()
            && self.row_count == version.rows().len()
    }

    pub fn rank_count(&self) -> usize {
        self.ranks.len()
    }

    pub fn mask(&self, rank: u32) -> Option<&Mask> {
        self.ranks.iter().find(|g| g.rank == rank).map(RankGroup::mask)
    }

    /// Rows eligible at no rank; these can never be returned
    pub fn unreachable_rows(&self, version: &ConfigVersion) -> Vec<usize> {
        let mut reachable = vec![false; version.rows().len()];
        for group in &self.ranks {
            for &row in &group.eligible_rows {
                reachable[row] = true;
            }
        }
        reachable
            .iter()
            .enumerate()
            .filter(|(_, r)| !**r)
            .map(|(i, _)| i)
            .collect()
    }

    /// `(rank, shadowed_by)` pairs for ranks whose mask repeats an earlier rank's
    pub fn shadowed_ranks(&self) -> Vec<(u32, u32)> {
        let mut first_seen: HashMap<&Mask, u32> = HashMap::new();
        let mut shadowed = Vec::new();
        for group in &self.ranks {
            match first_seen.get(&group.mask) {
                Some(&earlier) => shadowed.push((group.rank, earlier)),
                None => {
                    first_seen.insert(&group.mask, group.rank);
                }
            }
        }
        shadowed
    }
}
