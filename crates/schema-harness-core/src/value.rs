//! Document value model and type tags.
//!
//! Upstream extractors hand us JSON-like documents of unknown shape. The
//! profiler walks them as a [`Value`] tree and classifies every visited
//! node into one [`TypeTag`] from a fixed vocabulary.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A semi-structured document node.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
    Integer(i64),
    Number(f64),
    String(String),
    Boolean(bool),
}

impl Value {
    /// Classify this node. Precedence is fixed: null, array, object,
    /// whole number, other number, then the remaining scalar kinds.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Null => TypeTag::Null,
            Value::Array(_) => TypeTag::Array,
            Value::Object(_) => TypeTag::Object,
            Value::Integer(_) => TypeTag::Integer,
            Value::Number(n) if n.is_finite() && n.fract() == 0.0 => TypeTag::Integer,
            Value::Number(_) => TypeTag::Number,
            Value::String(_) => TypeTag::String,
            Value::Boolean(_) => TypeTag::Boolean,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(value: &serde_json::Value) -> Self {
        Value::from(value.clone())
    }
}

/// Type tag vocabulary.
///
/// Variants are declared in alphabetical order of their names so the
/// derived `Ord` sorts tag lists the same way a string sort would.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    Array,
    Boolean,
    Integer,
    Null,
    Number,
    Object,
    String,
}

impl TypeTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::Array => "array",
            TypeTag::Boolean => "boolean",
            TypeTag::Integer => "integer",
            TypeTag::Null => "null",
            TypeTag::Number => "number",
            TypeTag::Object => "object",
            TypeTag::String => "string",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
