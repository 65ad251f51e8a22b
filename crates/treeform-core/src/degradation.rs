//! Degradation policy and reporting
//!
//! Every recoverable problem met while mapping (a missing field, a malformed
//! directive, a value JSON cannot carry) resolves to a fixed fallback in the
//! output instead of an error. This module names those conditions, records
//! them in a [`DegradationReport`], and contains the foreign-scalar rules.
//!
//! Copyright (c) 2025 Treeform Team
//! Licensed under the Apache-2.0 license

use crate::value::{Scalar, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Root of every output and specification path
pub const ROOT_PATH: &str = "$";

/// Conditions the engine absorbs instead of failing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DegradationCode {
    /// A field path, anchor, or iteration target did not resolve
    ResolutionMiss,
    /// `$array` or `$object` with the wrong arity or payload types
    MalformedDirective,
    /// A document value with no JSON representation
    UnsupportedValueType,
    /// A field specification that is not a recognized form
    InvalidFieldSpec,
    /// An `$on` declaration that is not a path
    InvalidAnchor,
    /// A function or predicate name missing from the registry
    UnknownFunction,
    /// A node rejected by `$filter`
    FilteredOut,
}

impl DegradationCode {
    /// Whether the condition points at a broken specification rather than missing data
    pub fn is_spec_problem(&self) -> bool {
        matches!(
            self,
            DegradationCode::MalformedDirective
                | DegradationCode::InvalidFieldSpec
                | DegradationCode::InvalidAnchor
                | DegradationCode::UnknownFunction
        )
    }
}

impl fmt::Display for DegradationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DegradationCode::ResolutionMiss => "ResolutionMiss",
            DegradationCode::MalformedDirective => "MalformedDirective",
            DegradationCode::UnsupportedValueType => "UnsupportedValueType",
            DegradationCode::InvalidFieldSpec => "InvalidFieldSpec",
            DegradationCode::InvalidAnchor => "InvalidAnchor",
            DegradationCode::UnknownFunction => "UnknownFunction",
            DegradationCode::FilteredOut => "FilteredOut",
        };
        write!(f, "{}", name)
    }
}

/// A single absorbed condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Degradation {
    pub code: DegradationCode,
    /// Output location (during mapping) or specification location (when compiling)
    pub path: String,
    pub message: String,
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.path, self.message)
    }
}

/// Summary statistics for a report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DegradationSummary {
    pub total_items: usize,
    pub by_code: BTreeMap<String, usize>,
}

/// Everything absorbed during one mapping call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DegradationReport {
    pub items: Vec<Degradation>,
    pub summary: DegradationSummary,
}

impl DegradationReport {
    pub fn from_items(items: Vec<Degradation>) -> Self {
        let mut by_code = BTreeMap::new();
        for item in &items {
            *by_code.entry(item.code.to_string()).or_insert(0) += 1;
        }
        Self {
            summary: DegradationSummary {
                total_items: items.len(),
                by_code,
            },
            items,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Number of entries with the given code
    pub fn count(&self, code: DegradationCode) -> usize {
        self.items.iter().filter(|item| item.code == code).count()
    }

    /// Entries with the given code, in the order they were recorded
    pub fn with_code(&self, code: DegradationCode) -> impl Iterator<Item = &Degradation> {
        self.items.iter().filter(move |item| item.code == code)
    }

    /// Whether any entry points at a broken specification
    pub fn has_spec_problems(&self) -> bool {
        self.items.iter().any(|item| item.code.is_spec_problem())
    }
}

/// Collects degradations while a specification is compiled or evaluated
///
/// Every recorded condition is logged. Items are only retained when the
/// caller asked for a report.
#[derive(Debug, Default)]
pub struct DegradationTracker {
    items: Vec<Degradation>,
    collect: bool,
}

impl DegradationTracker {
    /// A tracker that logs and keeps every item
    pub fn collecting() -> Self {
        Self {
            items: Vec::new(),
            collect: true,
        }
    }

    /// A tracker that only logs
    pub fn logging_only() -> Self {
        Self::default()
    }

    pub fn record(&mut self, code: DegradationCode, path: &str, message: impl Into<String>) {
        let message = message.into();
        if code.is_spec_problem() {
            tracing::warn!(code = %code, path = path, "{}", message);
        } else {
            tracing::debug!(code = %code, path = path, "{}", message);
        }
        if self.collect {
            self.items.push(Degradation {
                code,
                path: path.to_string(),
                message,
            });
        }
    }

    pub fn items(&self) -> &[Degradation] {
        &self.items
    }

    pub fn finish(self) -> DegradationReport {
        DegradationReport::from_items(self.items)
    }
}

/// Path of a mapping key below `parent`
pub fn child_path(parent: &str, key: &str) -> String {
    format!("{}.{}", parent, key)
}

/// Path of a sequence element below `parent`
pub fn index_path(parent: &str, index: usize) -> String {
    format!("{}[{}]", parent, index)
}

/// Whether a value contains scalars JSON cannot represent
pub fn has_foreign(value: &Value) -> bool {
    match value {
        Value::Scalar(scalar) => !scalar.is_json(),
        Value::Sequence(items) => items.iter().any(has_foreign),
        Value::Mapping(map) => map.values().any(has_foreign),
        Value::Absent => false,
    }
}

/// Replace foreign scalars with their representable form, or `Absent`
///
/// Values without foreign scalars are returned unchanged.
pub fn contain_foreign(value: Value, path: &str, tracker: &mut DegradationTracker) -> Value {
    if !has_foreign(&value) {
        return value;
    }
    match value {
        Value::Scalar(scalar) => contain_scalar(scalar, path, tracker),
        Value::Sequence(items) => Value::Sequence(
            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| contain_foreign(item, &index_path(path, i), tracker))
                .collect(),
        ),
        Value::Mapping(map) => Value::Mapping(
            map.into_iter()
                .map(|(k, v)| {
                    let contained = contain_foreign(v, &child_path(path, &k), tracker);
                    (k, contained)
                })
                .collect(),
        ),
        Value::Absent => Value::Absent,
    }
}

fn contain_scalar(scalar: Scalar, path: &str, tracker: &mut DegradationTracker) -> Value {
    match scalar.coerce() {
        Some(value) => value,
        None => {
            tracker.record(
                DegradationCode::UnsupportedValueType,
                path,
                format!("{} value has no JSON representation", Value::Scalar(scalar).kind()),
            );
            Value::Absent
        }
    }
}
