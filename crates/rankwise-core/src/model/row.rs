//! Configuration rows and wildcard/literal patterns

use crate::types::{AttrId, MatchValue, TypedValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Wildcard or literal status of one match attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    Wildcard,
    Literal,
}

/// Mapping from match attribute to [`Slot`]
///
/// Used both as a row's fingerprint and as a rank's mask; a row is eligible
/// at a rank iff the two patterns are equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotPattern(BTreeMap<AttrId, Slot>);

/// The pattern a row's match values form
pub type Fingerprint = SlotPattern;

/// The pattern a rank requires
pub type Mask = SlotPattern;

impl SlotPattern {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, attr: AttrId, slot: Slot) -> Option<Slot> {
        self.0.insert(attr, slot)
    }

    pub fn get(&self, attr: AttrId) -> Option<Slot> {
        self.0.get(&attr).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AttrId, Slot)> + '_ {
        self.0.iter().map(|(a, s)| (*a, *s))
    }

    pub fn attrs(&self) -> impl Iterator<Item = AttrId> + '_ {
        self.0.keys().copied()
    }

    /// Attributes that require a literal
    pub fn literal_attrs(&self) -> impl Iterator<Item = AttrId> + '_ {
        self.iter()
            .filter(|(_, slot)| *slot == Slot::Literal)
            .map(|(attr, _)| attr)
    }
}

impl FromIterator<(AttrId, Slot)> for SlotPattern {
    fn from_iter<I: IntoIterator<Item = (AttrId, Slot)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for SlotPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (attr, slot)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            let mark = match slot {
                Slot::Wildcard => "*",
                Slot::Literal => "=",
            };
            write!(f, "{}: {}", attr, mark)?;
        }
        f.write_str("}")
    }
}

/// One configuration row: a match pattern and its output params
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRow {
    pub matches: BTreeMap<AttrId, MatchValue>,
    pub params: BTreeMap<AttrId, TypedValue>,
}

impl ConfigRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_match(mut self, attr: AttrId, value: impl Into<MatchValue>) -> Self {
        self.matches.insert(attr, value.into());
        self
    }

    pub fn with_param(mut self, attr: AttrId, value: impl Into<TypedValue>) -> Self {
        self.params.insert(attr, value.into());
        self
    }

    pub fn match_value(&self, attr: AttrId) -> Option<&MatchValue> {
        self.matches.get(&attr)
    }

    pub fn param(&self, attr: AttrId) -> Option<&TypedValue> {
        self.params.get(&attr)
    }

    pub fn match_attrs(&self) -> impl Iterator<Item = AttrId> + '_ {
        self.matches.keys().copied()
    }

    /// Wildcard/literal status of every match attribute. Derived, never stored.
    pub fn fingerprint(&self) -> Fingerprint {
        self.matches
            .iter()
            .map(|(attr, value)| (*attr, value.slot()))
            .collect()
    }

    /// Canonical keys of the row's literals at the mask's literal positions
    ///
    /// Two rows eligible at the same rank with equal keys would both survive
    /// the same query.
    pub fn literal_key(&self, mask: &Mask) -> Vec<String> {
        mask.literal_attrs()
            .map(|attr| {
                self.match_value(attr)
                    .and_then(MatchValue::as_literal)
                    .map(TypedValue::canonical)
                    .unwrap_or_default()
            })
            .collect()
    }
}
