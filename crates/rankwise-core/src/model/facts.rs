//! Query facts

use crate::error::{CoreError, Result};
use crate::types::{AttributeCatalog, Role, TypedValue};
use std::collections::BTreeMap;

/// Runtime input for a resolution: match attribute name to literal value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Facts {
    values: BTreeMap<String, TypedValue>,
}

impl Facts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<TypedValue>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<TypedValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&TypedValue> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TypedValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Coerce a JSON object into facts using the catalog's data types
    ///
    /// Keys that are not match attributes, `null` values, and values that do not
    /// fit their attribute's type are skipped. A skipped fact matches no literal,
    /// so rows requiring it are eliminated during resolution.
    pub fn from_json(catalog: &AttributeCatalog, value: &serde_json::Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| CoreError::InvalidFacts("expected a JSON object".to_string()))?;

        let mut facts = Facts::new();
        for (name, raw) in object {
            if raw.is_null() {
                continue;
            }
            let Ok(attr) = catalog.lookup(name) else {
                continue;
            };
            if attr.role != Role::Match {
                continue;
            }
            if let Ok(value) = TypedValue::from_json(attr.data_type, raw) {
                facts.insert(name.clone(), value);
            }
        }
        Ok(facts)
    }
}

impl<K: Into<String>, V: Into<TypedValue>> FromIterator<(K, V)> for Facts {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
