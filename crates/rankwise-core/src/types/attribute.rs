//! Attribute definitions and the attribute catalog
//!
//! The catalog is reference data: attributes are appended once and never
//! updated or deleted, so ids and names stay stable across every version that
//! references them.

use crate::error::{CoreError, Result};
use crate::types::value::DataType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Attribute identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttrId(pub u32);

impl fmt::Display for AttrId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attr#{}", self.0)
    }
}

/// Attribute role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Usable as a filter key in a row's pattern
    Match,
    /// Usable only as an output value
    Param,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Match => "match",
            Role::Param => "param",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "match" => Ok(Role::Match),
            "param" => Ok(Role::Param),
            other => Err(CoreError::UnknownRole(other.to_string())),
        }
    }
}

/// A catalog attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub id: AttrId,
    pub name: String,
    pub role: Role,
    pub data_type: DataType,
}

/// Append-only attribute catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Attribute>", into = "Vec<Attribute>")]
pub struct AttributeCatalog {
    attributes: Vec<Attribute>,
    by_name: HashMap<String, usize>,
    by_id: HashMap<AttrId, usize>,
}

impl AttributeCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from previously persisted attributes
    pub fn from_attributes(attributes: Vec<Attribute>) -> Result<Self> {
        let mut catalog = Self::new();
        for attr in attributes {
            catalog.insert(attr)?;
        }
        Ok(catalog)
    }

    /// Define a new attribute, assigning the next free id
    pub fn define(
        &mut self,
        name: impl Into<String>,
        role: Role,
        data_type: DataType,
    ) -> Result<&Attribute> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(CoreError::DuplicateAttribute { name });
        }
        let id = self.next_id();
        self.push(Attribute {
            id,
            name,
            role,
            data_type,
        });
        Ok(&self.attributes[self.attributes.len() - 1])
    }

    /// Insert an attribute with an existing id
    pub fn insert(&mut self, attr: Attribute) -> Result<()> {
        if self.by_name.contains_key(&attr.name) || self.by_id.contains_key(&attr.id) {
            return Err(CoreError::DuplicateAttribute { name: attr.name });
        }
        self.push(attr);
        Ok(())
    }

    fn push(&mut self, attr: Attribute) {
        let index = self.attributes.len();
        self.by_name.insert(attr.name.clone(), index);
        self.by_id.insert(attr.id, index);
        self.attributes.push(attr);
    }

    /// Look up an attribute by name
    pub fn lookup(&self, name: &str) -> Result<&Attribute> {
        self.by_name
            .get(name)
            .map(|&i| &self.attributes[i])
            .ok_or_else(|| CoreError::UnknownAttribute {
                name: name.to_string(),
            })
    }

    /// Look up an attribute by name and check its role
    pub fn require(&self, name: &str, role: Role) -> Result<&Attribute> {
        let attr = self.lookup(name)?;
        if attr.role != role {
            return Err(CoreError::RoleMismatch {
                attr: attr.name.clone(),
                expected: role,
                found: attr.role,
            });
        }
        Ok(attr)
    }

    /// Look up an attribute by id
    pub fn get(&self, id: AttrId) -> Option<&Attribute> {
        self.by_id.get(&id).map(|&i| &self.attributes[i])
    }

    pub fn name_of(&self, id: AttrId) -> Option<&str> {
        self.get(id).map(|a| a.name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Attributes in definition order
    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// The id the next `define` call will assign
    pub fn next_id(&self) -> AttrId {
        AttrId(self.by_id.keys().map(|id| id.0).max().unwrap_or(0) + 1)
    }
}

impl TryFrom<Vec<Attribute>> for AttributeCatalog {
    type Error = CoreError;

    fn try_from(attributes: Vec<Attribute>) -> Result<Self> {
        Self::from_attributes(attributes)
    }
}

impl From<AttributeCatalog> for Vec<Attribute> {
    fn from(catalog: AttributeCatalog) -> Self {
        catalog.attributes
    }
}
