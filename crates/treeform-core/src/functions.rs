//! Named transform functions and filter predicates
//!
//! A field chain of the form `["", name, args...]` or `[source, name, args...]`
//! calls a function from a [`FunctionRegistry`]. Functions are plain `fn`
//! pointers; they receive the resolved subject and the literal arguments and
//! never fail: anything they cannot handle is `Absent`.
//!
//! Copyright (c) 2025 Treeform Team
//! Licensed under the Apache-2.0 license

use crate::value::{Scalar, Value};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, OnceLock};

/// Separator used by `concatenate_list`
pub const LIST_SEPARATOR: &str = " , ";

/// Strings accepted as true by `is_true`, compared case-insensitively
pub const ALLOWED_TRUE_VALUES: [&str; 4] = ["true", "t", "yes", "y"];

/// Compiled `matches` patterns are kept up to this many distinct texts
const MAX_CACHED_PATTERNS: usize = 256;

/// Pattern text to compiled regex; `None` marks an invalid pattern
static PATTERN_CACHE: OnceLock<Mutex<HashMap<String, Option<Regex>>>> = OnceLock::new();

/// Arguments passed to a transform function
#[derive(Debug, Clone, Copy)]
pub struct CallContext<'a> {
    /// The resolved source value, `Absent` when it did not resolve
    pub subject: &'a Value,
    /// Literal arguments following the subject
    pub args: &'a [Value],
}

impl<'a> CallContext<'a> {
    pub fn new(subject: &'a Value, args: &'a [Value]) -> Self {
        Self { subject, args }
    }

    /// Literal argument at `index`
    pub fn arg(&self, index: usize) -> Option<&'a Value> {
        self.args.get(index)
    }
}

/// A function that can transform a document value
pub type TransformFn = fn(&CallContext<'_>) -> Value;

/// Name to function lookup used while evaluating field chains and filters
#[derive(Debug, Clone)]
pub struct FunctionRegistry {
    functions: BTreeMap<String, TransformFn>,
}

impl FunctionRegistry {
    /// A registry with no functions
    pub fn empty() -> Self {
        Self {
            functions: BTreeMap::new(),
        }
    }

    /// A registry with every built-in transform and predicate
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry
            .register("default_to", default_to)
            .register("prefix_with", prefix_with)
            .register("format_date", format_date)
            .register("concatenate_list", concatenate_list)
            .register("equals", equals)
            .register("not_equals", not_equals)
            .register("greater_than", greater_than)
            .register("at_least", at_least)
            .register("less_than", less_than)
            .register("at_most", at_most)
            .register("matches", matches)
            .register("is_true", is_true);
        registry
    }

    /// Register a function, replacing any previous one with the same name
    pub fn register(&mut self, name: impl Into<String>, function: TransformFn) -> &mut Self {
        self.functions.insert(name.into(), function);
        self
    }

    /// Builder form of [`FunctionRegistry::register`]
    pub fn with_function(mut self, name: impl Into<String>, function: TransformFn) -> Self {
        self.register(name, function);
        self
    }

    pub fn get(&self, name: &str) -> Option<TransformFn> {
        self.functions.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    /// Call a registered function; `None` when the name is unknown
    pub fn call(&self, name: &str, ctx: &CallContext<'_>) -> Option<Value> {
        self.get(name).map(|function| function(ctx))
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// The subject when present and not null, else the first argument
pub fn default_to(ctx: &CallContext<'_>) -> Value {
    if !ctx.subject.is_nullish() {
        return ctx.subject.clone();
    }
    ctx.arg(0).cloned().unwrap_or(Value::Absent)
}

pub fn prefix_with(ctx: &CallContext<'_>) -> Value {
    let prefix = ctx.arg(0).and_then(text_of);
    match (prefix, text_of(ctx.subject)) {
        (Some(prefix), Some(text)) => Value::string(format!("{}{}", prefix, text)),
        _ => Value::Absent,
    }
}

/// Date portion (`YYYY-MM-DD`) of an ISO-8601 date or date-time
pub fn format_date(ctx: &CallContext<'_>) -> Value {
    let Some(text) = ctx.subject.as_str().filter(|s| !s.is_empty()) else {
        return Value::Absent;
    };
    let date = DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.date_naive())
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.date()))
        .or_else(|_| NaiveDate::parse_from_str(text, "%Y-%m-%d"));
    match date {
        Ok(date) => Value::string(date.format("%Y-%m-%d").to_string()),
        Err(_) => text
            .split('T')
            .next()
            .filter(|head| !head.is_empty())
            .map_or(Value::Absent, Value::string),
    }
}

pub fn concatenate_list(ctx: &CallContext<'_>) -> Value {
    let Some(items) = ctx.subject.as_sequence().filter(|items| !items.is_empty()) else {
        return Value::Absent;
    };
    let parts: Option<Vec<String>> = items.iter().map(text_of).collect();
    parts.map_or(Value::Absent, |parts| Value::string(parts.join(LIST_SEPARATOR)))
}

pub fn equals(ctx: &CallContext<'_>) -> Value {
    match ctx.arg(0) {
        Some(expected) => Value::from(values_equal(ctx.subject, expected)),
        None => Value::Absent,
    }
}

pub fn not_equals(ctx: &CallContext<'_>) -> Value {
    match ctx.arg(0) {
        Some(expected) => Value::from(!values_equal(ctx.subject, expected)),
        None => Value::Absent,
    }
}

pub fn greater_than(ctx: &CallContext<'_>) -> Value {
    compare_with(ctx, |ordering| ordering == Ordering::Greater)
}

pub fn at_least(ctx: &CallContext<'_>) -> Value {
    compare_with(ctx, |ordering| ordering != Ordering::Less)
}

pub fn less_than(ctx: &CallContext<'_>) -> Value {
    compare_with(ctx, |ordering| ordering == Ordering::Less)
}

pub fn at_most(ctx: &CallContext<'_>) -> Value {
    compare_with(ctx, |ordering| ordering != Ordering::Greater)
}

/// Whether the subject's text matches the regular expression argument
pub fn matches(ctx: &CallContext<'_>) -> Value {
    let Some(pattern) = ctx.arg(0).and_then(Value::as_str) else {
        return Value::Absent;
    };
    let Some(text) = text_of(ctx.subject) else {
        return Value::Absent;
    };
    match cached_regex(pattern) {
        Some(regex) => Value::from(regex.is_match(&text)),
        None => Value::Absent,
    }
}

/// Compile `pattern` once per distinct text
fn cached_regex(pattern: &str) -> Option<Regex> {
    let cache = PATTERN_CACHE.get_or_init(|| Mutex::new(HashMap::new()));
    if let Some(entry) = cache.lock().ok().and_then(|guard| guard.get(pattern).cloned()) {
        return entry;
    }

    let compiled = match Regex::new(pattern) {
        Ok(regex) => Some(regex),
        Err(err) => {
            tracing::debug!(pattern = pattern, error = %err, "invalid pattern in matches");
            None
        }
    };
    if let Ok(mut guard) = cache.lock() {
        if guard.len() >= MAX_CACHED_PATTERNS {
            guard.clear();
        }
        guard.insert(pattern.to_string(), compiled.clone());
    }
    compiled
}

pub fn is_true(ctx: &CallContext<'_>) -> Value {
    let truthy = text_of(ctx.subject)
        .map(|text| ALLOWED_TRUE_VALUES.contains(&text.to_lowercase().as_str()))
        .unwrap_or(false);
    Value::from(truthy)
}

/// Text form of a string, number or boolean
fn text_of(value: &Value) -> Option<String> {
    value.as_scalar().and_then(Scalar::as_text)
}

/// Equality that treats `1` and `1.0` as the same number
fn values_equal(left: &Value, right: &Value) -> bool {
    match (left.as_f64(), right.as_f64()) {
        (Some(l), Some(r)) => l == r,
        _ => left == right,
    }
}

/// Numbers compare numerically and strings lexically; anything else is unordered
fn order(left: &Value, right: &Value) -> Option<Ordering> {
    if let (Some(l), Some(r)) = (left.as_f64(), right.as_f64()) {
        return l.partial_cmp(&r);
    }
    match (left.as_str(), right.as_str()) {
        (Some(l), Some(r)) => Some(l.cmp(r)),
        _ => None,
    }
}

fn compare_with(ctx: &CallContext<'_>, accept: fn(Ordering) -> bool) -> Value {
    ctx.arg(0)
        .and_then(|bound| order(ctx.subject, bound))
        .map_or(Value::Absent, |ordering| Value::from(accept(ordering)))
}
