//! Field paths and anchored resolution
//!
//! Field references are dotted key paths (`address.city`). An anchor is a
//! path prefix that every lookup in a specification branch is relative to.
//! Resolution only ever descends through mappings one key at a time; it
//! never fans out over sequences.
//!
//! Copyright (c) 2025 Treeform Team
//! Licensed under the Apache-2.0 license

use crate::value::Value;
use std::fmt;
use std::str::FromStr;

/// Separator between segments in dotted notation
pub const FIELD_SEPARATOR: char = '.';

/// An ordered chain of mapping keys
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// The empty path, which resolves to the node it starts from
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse dotted notation; the empty string is the root path
    pub fn parse(dotted: &str) -> Self {
        if dotted.is_empty() {
            return Self::root();
        }
        Self {
            segments: dotted.split(FIELD_SEPARATOR).map(str::to_string).collect(),
        }
    }

    /// Build a path from chained segments, each of which may itself be dotted
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        segments
            .into_iter()
            .fold(Self::root(), |path, segment| path.join(&Self::parse(segment.as_ref())))
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Concatenate two paths; `self` comes first
    pub fn join(&self, other: &FieldPath) -> FieldPath {
        let mut segments = Vec::with_capacity(self.segments.len() + other.segments.len());
        segments.extend(self.segments.iter().cloned());
        segments.extend(other.segments.iter().cloned());
        FieldPath { segments }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl FromStr for FieldPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for FieldPath {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

/// Descend from `node` along `path`
///
/// Returns `None` when a segment is missing, when a key lookup meets
/// anything other than a mapping, or when the path lands on `Absent`.
pub fn lookup<'a>(node: &'a Value, path: &FieldPath) -> Option<&'a Value> {
    let mut current = node;
    for segment in path.segments() {
        current = current.as_mapping()?.get(segment)?;
    }
    if current.is_absent() {
        None
    } else {
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> Value {
        Value::from(json!({
            "level1": {
                "level2": {
                    "level3": "value"
                },
                "items": [{"name": "first"}]
            },
            "empty": ""
        }))
    }

    #[test]
    fn test_parse_dotted() {
        let path = FieldPath::parse("a.b.c");
        assert_eq!(path.segments(), &["a", "b", "c"]);
        assert_eq!(path.to_string(), "a.b.c");
        assert!(FieldPath::parse("").is_root());
    }

    #[test]
    fn test_from_segments_splits_dotted_segments() {
        let chained = FieldPath::from_segments(["a.b", "c"]);
        assert_eq!(chained, FieldPath::parse("a.b.c"));
    }

    #[test]
    fn test_lookup_nested() {
        let data = doc();
        assert_eq!(
            lookup(&data, &"level1.level2.level3".into()),
            Some(&Value::string("value"))
        );
        assert_eq!(
            lookup(&data, &"level1.level2".into()).map(|v| v.to_json()),
            Some(json!({"level3": "value"}))
        );
        assert_eq!(lookup(&data, &"nonexistent".into()), None);
        assert_eq!(lookup(&data, &"level1.nonexistent".into()), None);
        assert_eq!(lookup(&data, &"level1.level2.nonexistent".into()), None);
    }

    #[test]
    fn test_lookup_does_not_descend_into_sequences() {
        let data = doc();
        assert_eq!(lookup(&data, &"level1.items.name".into()), None);
        assert_eq!(lookup(&data, &"level1.items.0".into()), None);
        assert!(lookup(&data, &"level1.items".into()).is_some());
    }

    #[test]
    fn test_lookup_through_scalar_is_a_miss() {
        let data = doc();
        assert_eq!(lookup(&data, &"level1.level2.level3.deeper".into()), None);
    }

    #[test]
    fn test_empty_string_value_is_present() {
        let data = doc();
        assert_eq!(lookup(&data, &"empty".into()), Some(&Value::string("")));
    }

    #[test]
    fn test_lookup_joined_anchor() {
        let data = doc();
        let anchor = FieldPath::parse("level1.level2");
        assert_eq!(
            lookup(&data, &anchor.join(&"level3".into())),
            Some(&Value::string("value"))
        );
        assert_eq!(
            lookup(&data, &FieldPath::parse("missing.anchor").join(&"level3".into())),
            None
        );
    }

    #[test]
    fn test_deep_document() {
        let mut data = json!("bottom");
        for _ in 0..100 {
            data = json!({ "nested": data });
        }
        let data = Value::from(data);
        let path = FieldPath::from_segments(std::iter::repeat("nested").take(100));
        assert_eq!(lookup(&data, &path), Some(&Value::string("bottom")));
    }
}
