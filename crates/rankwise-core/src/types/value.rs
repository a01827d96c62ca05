//! Typed attribute values
//!
//! A `TypedValue` holds exactly one literal of one of the five supported data
//! types. The wildcard is not a value: match positions use [`MatchValue`],
//! which adds the `All` marker, while param positions hold a bare `TypedValue`
//! and therefore can never be wildcards.

use crate::error::{CoreError, Result};
use crate::model::Slot;
use crate::types::attribute::Attribute;
use bigdecimal::BigDecimal;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Serialized form of the wildcard marker in match positions
pub const WILDCARD_MARKER: &str = "ALL";

/// Attribute data type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// 64-bit signed integer
    Int,
    /// Arbitrary precision decimal
    Dec,
    /// UTF-8 string
    Str,
    /// Boolean
    Bool,
    /// Timestamp (an unambiguous instant)
    Dt,
}

impl DataType {
    /// Wire name of the data type
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Int => "int",
            DataType::Dec => "dec",
            DataType::Str => "str",
            DataType::Bool => "bool",
            DataType::Dt => "dt",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "int" => Ok(DataType::Int),
            "dec" => Ok(DataType::Dec),
            "str" => Ok(DataType::Str),
            "bool" => Ok(DataType::Bool),
            "dt" => Ok(DataType::Dt),
            other => Err(CoreError::UnknownDataType(other.to_string())),
        }
    }
}

/// A literal attribute value
///
/// Equality is only meaningful between values of the same variant; values of
/// different types are never equal. Decimal equality is numeric, so `0.10`
/// equals `0.1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum TypedValue {
    Int(i64),
    Dec(BigDecimal),
    Str(String),
    Bool(bool),
    Dt(DateTime<Utc>),
}

impl TypedValue {
    /// Parse a raw literal as the given data type
    ///
    /// Timestamps must be RFC 3339 instants with an explicit offset; naive
    /// timestamps are rejected as ambiguous.
    pub fn parse(data_type: DataType, raw: &str) -> Result<Self> {
        let invalid = |reason: String| CoreError::InvalidLiteral {
            data_type,
            raw: raw.to_string(),
            reason,
        };

        match data_type {
            DataType::Int => raw
                .trim()
                .parse::<i64>()
                .map(TypedValue::Int)
                .map_err(|e| invalid(e.to_string())),
            DataType::Dec => BigDecimal::from_str(raw.trim())
                .map(TypedValue::Dec)
                .map_err(|e| invalid(e.to_string())),
            DataType::Str => Ok(TypedValue::Str(raw.to_string())),
            DataType::Bool => match raw.trim() {
                "true" => Ok(TypedValue::Bool(true)),
                "false" => Ok(TypedValue::Bool(false)),
                _ => Err(invalid("expected 'true' or 'false'".to_string())),
            },
            DataType::Dt => DateTime::parse_from_rfc3339(raw.trim())
                .map(|dt| TypedValue::Dt(dt.with_timezone(&Utc)))
                .map_err(|e| invalid(e.to_string())),
        }
    }

    /// Build a value of the given type from a JSON scalar
    ///
    /// Strings are parsed with [`TypedValue::parse`]; numbers are accepted for
    /// `int` and `dec`, booleans for `bool`.
    pub fn from_json(data_type: DataType, value: &serde_json::Value) -> Result<Self> {
        let invalid = |reason: &str| CoreError::InvalidLiteral {
            data_type,
            raw: value.to_string(),
            reason: reason.to_string(),
        };

        match (data_type, value) {
            (_, serde_json::Value::String(s)) => Self::parse(data_type, s),
            (DataType::Int, serde_json::Value::Number(n)) => n
                .as_i64()
                .map(TypedValue::Int)
                .ok_or_else(|| invalid("not a 64-bit integer")),
            (DataType::Dec, serde_json::Value::Number(n)) => Self::parse(data_type, &n.to_string()),
            (DataType::Bool, serde_json::Value::Bool(b)) => Ok(TypedValue::Bool(*b)),
            _ => Err(invalid("JSON value kind does not match the data type")),
        }
    }

    /// Convenience constructor for decimals
    pub fn dec(raw: &str) -> Result<Self> {
        Self::parse(DataType::Dec, raw)
    }

    /// Convenience constructor for timestamps
    pub fn dt(raw: &str) -> Result<Self> {
        Self::parse(DataType::Dt, raw)
    }

    /// The data type of the populated variant
    pub fn data_type(&self) -> DataType {
        match self {
            TypedValue::Int(_) => DataType::Int,
            TypedValue::Dec(_) => DataType::Dec,
            TypedValue::Str(_) => DataType::Str,
            TypedValue::Bool(_) => DataType::Bool,
            TypedValue::Dt(_) => DataType::Dt,
        }
    }

    /// Typed equality; `false` across mismatched types
    pub fn equals(&self, other: &TypedValue) -> bool {
        self.data_type() == other.data_type() && self == other
    }

    /// Type-tagged canonical key. Two values have the same key iff they are equal.
    pub fn canonical(&self) -> String {
        match self {
            TypedValue::Int(v) => format!("int:{}", v),
            TypedValue::Dec(v) => format!("dec:{}", v.normalized()),
            TypedValue::Str(v) => format!("str:{}", v),
            TypedValue::Bool(v) => format!("bool:{}", v),
            TypedValue::Dt(v) => format!("dt:{}", v.to_rfc3339_opts(SecondsFormat::Nanos, true)),
        }
    }

    /// JSON form used by the ingestion format
    ///
    /// Decimals and timestamps are emitted as strings to preserve precision.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            TypedValue::Int(v) => serde_json::Value::from(*v),
            TypedValue::Bool(v) => serde_json::Value::Bool(*v),
            other => serde_json::Value::String(other.to_string()),
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::Int(v) => write!(f, "{}", v),
            TypedValue::Dec(v) => write!(f, "{}", v),
            TypedValue::Str(v) => f.write_str(v),
            TypedValue::Bool(v) => write!(f, "{}", v),
            TypedValue::Dt(v) => f.write_str(&v.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        }
    }
}

impl From<i64> for TypedValue {
    fn from(v: i64) -> Self {
        TypedValue::Int(v)
    }
}

impl From<i32> for TypedValue {
    fn from(v: i32) -> Self {
        TypedValue::Int(i64::from(v))
    }
}

impl From<bool> for TypedValue {
    fn from(v: bool) -> Self {
        TypedValue::Bool(v)
    }
}

impl From<&str> for TypedValue {
    fn from(v: &str) -> Self {
        TypedValue::Str(v.to_string())
    }
}

impl From<String> for TypedValue {
    fn from(v: String) -> Self {
        TypedValue::Str(v)
    }
}

impl From<BigDecimal> for TypedValue {
    fn from(v: BigDecimal) -> Self {
        TypedValue::Dec(v)
    }
}

impl From<DateTime<Utc>> for TypedValue {
    fn from(v: DateTime<Utc>) -> Self {
        TypedValue::Dt(v)
    }
}

/// A value in a match position: a literal or the wildcard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchValue {
    /// Wildcard; accepts any input for the attribute
    All,
    /// Literal that must equal the input exactly
    Literal(TypedValue),
}

impl MatchValue {
    pub fn is_wildcard(&self) -> bool {
        matches!(self, MatchValue::All)
    }

    pub fn as_literal(&self) -> Option<&TypedValue> {
        match self {
            MatchValue::All => None,
            MatchValue::Literal(v) => Some(v),
        }
    }

    /// Wildcard or literal status of this value
    pub fn slot(&self) -> Slot {
        match self {
            MatchValue::All => Slot::Wildcard,
            MatchValue::Literal(_) => Slot::Literal,
        }
    }

    /// Whether a serialized value is the wildcard marker (`"ALL"` or `null`)
    pub fn is_wildcard_json(value: &serde_json::Value) -> bool {
        value.is_null() || value.as_str() == Some(WILDCARD_MARKER)
    }

    /// Build a match value from its serialized form
    pub fn from_json(data_type: DataType, value: &serde_json::Value) -> Result<Self> {
        if Self::is_wildcard_json(value) {
            return Ok(MatchValue::All);
        }
        TypedValue::from_json(data_type, value).map(MatchValue::Literal)
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            MatchValue::All => serde_json::Value::String(WILDCARD_MARKER.to_string()),
            MatchValue::Literal(v) => v.to_json(),
        }
    }
}

impl fmt::Display for MatchValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchValue::All => f.write_str(WILDCARD_MARKER),
            MatchValue::Literal(v) => write!(f, "{}", v),
        }
    }
}

macro_rules! impl_match_literal_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for MatchValue {
                fn from(v: $ty) -> Self {
                    MatchValue::Literal(TypedValue::from(v))
                }
            }
        )*
    };
}

impl_match_literal_from!(i64, i32, bool, &str, String, BigDecimal, DateTime<Utc>);

impl From<TypedValue> for MatchValue {
    fn from(v: TypedValue) -> Self {
        MatchValue::Literal(v)
    }
}

/// The typed columns of one persisted value row
///
/// Storage keeps one nullable column per data type plus a wildcard flag.
/// Converting back into a value enforces that exactly one column is populated
/// and that its type agrees with the owning attribute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueColumns {
    pub is_all: bool,
    pub int_value: Option<i64>,
    pub dec_value: Option<BigDecimal>,
    pub str_value: Option<String>,
    pub bool_value: Option<bool>,
    pub dt_value: Option<DateTime<Utc>>,
}

impl ValueColumns {
    pub fn from_typed(value: &TypedValue) -> Self {
        let mut cols = Self::default();
        match value {
            TypedValue::Int(v) => cols.int_value = Some(*v),
            TypedValue::Dec(v) => cols.dec_value = Some(v.clone()),
            TypedValue::Str(v) => cols.str_value = Some(v.clone()),
            TypedValue::Bool(v) => cols.bool_value = Some(*v),
            TypedValue::Dt(v) => cols.dt_value = Some(*v),
        }
        cols
    }

    pub fn from_match(value: &MatchValue) -> Self {
        match value {
            MatchValue::All => Self {
                is_all: true,
                ..Self::default()
            },
            MatchValue::Literal(v) => Self::from_typed(v),
        }
    }

    /// Decode a param value
    pub fn into_typed(self, attr: &Attribute) -> Result<TypedValue> {
        if self.is_all {
            return Err(CoreError::CardinalityViolation {
                attr: attr.name.clone(),
                reason: "param values cannot be wildcards".to_string(),
            });
        }
        self.into_literal(attr)
    }

    /// Decode a match value
    pub fn into_match(self, attr: &Attribute) -> Result<MatchValue> {
        if self.is_all {
            let populated = self.populated_count();
            if populated != 0 {
                return Err(CoreError::CardinalityViolation {
                    attr: attr.name.clone(),
                    reason: format!("wildcard carries {} typed value(s)", populated),
                });
            }
            return Ok(MatchValue::All);
        }
        self.into_literal(attr).map(MatchValue::Literal)
    }

    fn populated_count(&self) -> usize {
        [
            self.int_value.is_some(),
            self.dec_value.is_some(),
            self.str_value.is_some(),
            self.bool_value.is_some(),
            self.dt_value.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count()
    }

    fn into_literal(self, attr: &Attribute) -> Result<TypedValue> {
        let populated = self.populated_count();
        let value = match (
            self.int_value,
            self.dec_value,
            self.str_value,
            self.bool_value,
            self.dt_value,
        ) {
            (Some(v), None, None, None, None) => TypedValue::Int(v),
            (None, Some(v), None, None, None) => TypedValue::Dec(v),
            (None, None, Some(v), None, None) => TypedValue::Str(v),
            (None, None, None, Some(v), None) => TypedValue::Bool(v),
            (None, None, None, None, Some(v)) => TypedValue::Dt(v),
            _ => {
                return Err(CoreError::CardinalityViolation {
                    attr: attr.name.clone(),
                    reason: format!("expected exactly one typed value, found {}", populated),
                })
            }
        };

        if value.data_type() != attr.data_type {
            return Err(CoreError::TypeMismatch {
                attr: attr.name.clone(),
                expected: attr.data_type,
                found: value.data_type(),
            });
        }
        Ok(value)
    }
}
