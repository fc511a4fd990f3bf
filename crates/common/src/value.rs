//! Tagged attribute values
//!
//! Raw API records arrive as JSON. Every value is decoded once into an
//! [`AttributeValue`], and all default comparisons and formatting dispatch on
//! the tag rather than on runtime type inspection.
//!
//! ## Numbers
//!
//! Generic JSON decoders may hand back integers as floating point. The single
//! rule used everywhere (records and catalog defaults alike) is: a number
//! decodes to [`AttributeValue::Integer`] when it is an `i64`, a `u64` that
//! fits in `i64`, or an `f64` with no fractional part that fits in `i64`.
//! Anything else is [`AttributeValue::Float`]. Because defaults go through the
//! same decoder, `25` and `25.0` compare equal.

use crate::catalog::AttributeKind;
use indexmap::IndexMap;
use serde_json::Value;

/// A decoded attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    String(String),
    Integer(i64),
    Boolean(bool),
    Object(IndexMap<String, AttributeValue>),
    /// Non-integral number; no catalog kind accepts it
    Float(f64),
    /// JSON array; no catalog kind accepts it
    List(Vec<AttributeValue>),
    Null,
}

impl AttributeValue {
    /// Decode a JSON value
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => AttributeValue::Null,
            Value::Bool(b) => AttributeValue::Boolean(*b),
            Value::String(s) => AttributeValue::String(s.clone()),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    AttributeValue::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    integral(f)
                        .map(AttributeValue::Integer)
                        .unwrap_or(AttributeValue::Float(f))
                } else {
                    AttributeValue::Null
                }
            }
            Value::Array(items) => {
                AttributeValue::List(items.iter().map(AttributeValue::from_json).collect())
            }
            Value::Object(map) => AttributeValue::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), AttributeValue::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// The catalog kind this value satisfies, if any
    pub fn kind(&self) -> Option<AttributeKind> {
        match self {
            AttributeValue::String(_) => Some(AttributeKind::String),
            AttributeValue::Integer(_) => Some(AttributeKind::Integer),
            AttributeValue::Boolean(_) => Some(AttributeKind::Boolean),
            AttributeValue::Object(_) => Some(AttributeKind::Object),
            AttributeValue::Float(_) | AttributeValue::List(_) | AttributeValue::Null => None,
        }
    }

    /// Short name of the value's shape, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            AttributeValue::String(_) => "string",
            AttributeValue::Integer(_) => "integer",
            AttributeValue::Boolean(_) => "boolean",
            AttributeValue::Object(_) => "object",
            AttributeValue::Float(_) => "float",
            AttributeValue::List(_) => "list",
            AttributeValue::Null => "null",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Render a scalar as a path identifier value
    ///
    /// Strings are used as-is; integers and booleans are stringified. Other
    /// shapes cannot identify an object.
    pub fn as_identifier(&self) -> Option<String> {
        match self {
            AttributeValue::String(s) => Some(s.clone()),
            AttributeValue::Integer(i) => Some(i.to_string()),
            AttributeValue::Boolean(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

fn integral(f: f64) -> Option<i64> {
    // i64::MAX is not exactly representable; 2^63 is the first value out of range
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if f.is_finite() && f.fract() == 0.0 && f >= -LIMIT && f < LIMIT {
        Some(f as i64)
    } else {
        None
    }
}
