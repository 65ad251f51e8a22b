//! Document value model
//!
//! A single closed value type represents both the documents being mapped and
//! the specifications that drive the mapping. `Absent` marks a lookup that
//! did not resolve and is kept distinct from an explicit `null`.
//!
//! Copyright (c) 2025 Treeform Team
//! Licensed under the Apache-2.0 license

use indexmap::IndexMap;
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Number;
use std::fmt;

/// Insertion-ordered mapping used for document objects
pub type Mapping = IndexMap<String, Value>;

/// Leaf values of a document
///
/// Besides the JSON scalars, a document handed over by a host connector may
/// carry values JSON cannot represent directly. Those are kept as-is until
/// they reach the output, where [`Scalar::coerce`] decides their fate.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    /// Raw binary payload
    Bytes(Vec<u8>),
    /// Unordered collection of hashable scalars
    Set(Vec<Scalar>),
    /// Complex number
    Complex { re: f64, im: f64 },
}

/// A node of a document or specification tree
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// The lookup that produced this value did not resolve
    #[default]
    Absent,
    Scalar(Scalar),
    Sequence(Vec<Value>),
    Mapping(Mapping),
}

impl Scalar {
    /// Whether the scalar has a direct JSON representation
    pub fn is_json(&self) -> bool {
        !matches!(self, Scalar::Bytes(_) | Scalar::Set(_) | Scalar::Complex { .. })
    }

    /// Convert to the nearest JSON-representable value
    ///
    /// Binary payloads become strings when they are valid UTF-8. Sets become
    /// sequences sorted by their canonical JSON text with duplicates removed.
    /// Complex numbers have no unambiguous representation. `None` means the
    /// value cannot be represented and should degrade to `Absent`.
    pub fn coerce(&self) -> Option<Value> {
        match self {
            Scalar::Bytes(bytes) => std::str::from_utf8(bytes)
                .ok()
                .map(|s| Value::Scalar(Scalar::String(s.to_string()))),
            Scalar::Set(members) => {
                let mut rendered = Vec::with_capacity(members.len());
                for member in members {
                    let value = if member.is_json() {
                        Value::Scalar(member.clone())
                    } else {
                        member.coerce()?
                    };
                    let key = serde_json::to_string(&value).ok()?;
                    rendered.push((key, value));
                }
                rendered.sort_by(|a, b| a.0.cmp(&b.0));
                rendered.dedup_by(|a, b| a.0 == b.0);
                Some(Value::Sequence(rendered.into_iter().map(|(_, v)| v).collect()))
            }
            Scalar::Complex { .. } => None,
            other => Some(Value::Scalar(other.clone())),
        }
    }

    /// Render the scalar as plain text, if it has a textual form
    pub fn as_text(&self) -> Option<String> {
        match self {
            Scalar::String(s) => Some(s.clone()),
            Scalar::Number(n) => Some(n.to_string()),
            Scalar::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

impl Value {
    /// An explicit `null`
    pub fn null() -> Self {
        Value::Scalar(Scalar::Null)
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value::Scalar(Scalar::String(s.into()))
    }

    pub fn empty_sequence() -> Self {
        Value::Sequence(Vec::new())
    }

    pub fn empty_mapping() -> Self {
        Value::Mapping(Mapping::new())
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    /// Anything that resolved, including an explicit `null`
    pub fn is_present(&self) -> bool {
        !self.is_absent()
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Scalar(Scalar::Null))
    }

    /// Absent or explicitly `null`
    pub fn is_nullish(&self) -> bool {
        self.is_absent() || self.is_null()
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Scalar(Scalar::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Scalar(Scalar::Number(n)) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a key when this value is a mapping
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_mapping().and_then(|map| map.get(key))
    }

    /// Short name of the variant, used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Absent => "absent",
            Value::Scalar(Scalar::Null) => "null",
            Value::Scalar(Scalar::Bool(_)) => "boolean",
            Value::Scalar(Scalar::Number(_)) => "number",
            Value::Scalar(Scalar::String(_)) => "string",
            Value::Scalar(Scalar::Bytes(_)) => "bytes",
            Value::Scalar(Scalar::Set(_)) => "set",
            Value::Scalar(Scalar::Complex { .. }) => "complex",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
        }
    }

    /// JSON truthiness: absent, null, false, zero, and empty containers are falsy
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Absent => false,
            Value::Scalar(Scalar::Null) => false,
            Value::Scalar(Scalar::Bool(b)) => *b,
            Value::Scalar(Scalar::Number(n)) => n.as_f64().map_or(true, |f| f != 0.0),
            Value::Scalar(Scalar::String(s)) => !s.is_empty(),
            Value::Scalar(Scalar::Bytes(b)) => !b.is_empty(),
            Value::Scalar(Scalar::Set(members)) => !members.is_empty(),
            Value::Scalar(Scalar::Complex { re, im }) => *re != 0.0 || *im != 0.0,
            Value::Sequence(items) => !items.is_empty(),
            Value::Mapping(map) => !map.is_empty(),
        }
    }

    /// Convert into a `serde_json::Value`; absent and unrepresentable values become `null`
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Absent => serde_json::Value::Null,
            Value::Scalar(scalar) => scalar_to_json(scalar),
            Value::Sequence(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Mapping(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

fn scalar_to_json(scalar: &Scalar) -> serde_json::Value {
    match scalar {
        Scalar::Null => serde_json::Value::Null,
        Scalar::Bool(b) => serde_json::Value::Bool(*b),
        Scalar::Number(n) => serde_json::Value::Number(n.clone()),
        Scalar::String(s) => serde_json::Value::String(s.clone()),
        foreign => foreign
            .coerce()
            .map(|v| v.to_json())
            .unwrap_or(serde_json::Value::Null),
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::null(),
            serde_json::Value::Bool(b) => Value::Scalar(Scalar::Bool(b)),
            serde_json::Value::Number(n) => Value::Scalar(Scalar::Number(n)),
            serde_json::Value::String(s) => Value::Scalar(Scalar::String(s)),
            serde_json::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Mapping(
                map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            ),
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(value: &serde_json::Value) -> Self {
        Value::from(value.clone())
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        value.to_json()
    }
}

impl From<Scalar> for Value {
    fn from(scalar: Scalar) -> Self {
        Value::Scalar(scalar)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Scalar(Scalar::Bool(b))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Scalar(Scalar::Number(n.into()))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Sequence(items)
    }
}

impl From<Mapping> for Value {
    fn from(map: Mapping) -> Self {
        Value::Mapping(map)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Absent => serializer.serialize_unit(),
            Value::Scalar(scalar) => scalar.serialize(serializer),
            Value::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Mapping(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
        }
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Scalar::Null => serializer.serialize_unit(),
            Scalar::Bool(b) => serializer.serialize_bool(*b),
            Scalar::Number(n) => n.serialize(serializer),
            Scalar::String(s) => serializer.serialize_str(s),
            foreign => match foreign.coerce() {
                Some(value) => value.serialize(serializer),
                None => serializer.serialize_unit(),
            },
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Absent => write!(f, "<absent>"),
            other => write!(f, "{}", other.to_json()),
        }
    }
}
