//! Property-based testing strategies for generating test data
//!
//! This module provides proptest strategies for generating random documents
//! and specifications. Keys are drawn from a small alphabet so that generated
//! field chains actually hit generated documents.

#![cfg(test)]

use proptest::collection::{hash_map, vec};
use proptest::prelude::*;
use serde_json::{json, Value as Json};

/// Strategy for generating mapping keys
pub fn key_strategy() -> &'static str {
    "[a-d]{1,2}"
}

/// Strategy for generating dotted field paths
pub fn path_strategy() -> impl Strategy<Value = String> {
    vec(key_strategy(), 1..4).prop_map(|segments| segments.join("."))
}

/// Strategy for generating JSON scalars
pub fn scalar_strategy() -> impl Strategy<Value = Json> {
    prop_oneof![
        Just(Json::Null),
        any::<bool>().prop_map(Json::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        "[a-zA-Z0-9 ]{0,12}".prop_map(Json::String),
    ]
}

/// Strategy for generating documents with controlled depth
pub fn json_value_strategy() -> impl Strategy<Value = Json> {
    scalar_strategy().prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            vec(inner.clone(), 0..4).prop_map(Json::Array),
            hash_map(key_strategy(), inner, 0..4)
                .prop_map(|m| Json::Object(m.into_iter().collect())),
        ]
    })
}

/// Strategy for generating documents whose root is a mapping
pub fn document_strategy() -> impl Strategy<Value = Json> {
    hash_map(key_strategy(), json_value_strategy(), 0..5)
        .prop_map(|m| Json::Object(m.into_iter().collect()))
}

/// Strategy for generating leaf specification nodes, including malformed ones
pub fn leaf_spec_strategy() -> impl Strategy<Value = Json> {
    prop_oneof![
        path_strategy().prop_map(|path| json!([path])),
        (path_strategy(), scalar_strategy())
            .prop_map(|(path, fallback)| json!(["", "default_to", path, fallback])),
        path_strategy().prop_map(|path| json!([path, "prefix_with", "id-"])),
        path_strategy().prop_map(|path| json!(["", "no_such_function", path])),
        json_value_strategy().prop_map(|literal| json!(["$array", literal])),
        document_strategy().prop_map(|literal| json!(["$object", literal])),
        Just(json!(["$array"])),
        Just(json!(["$object", "not a mapping", true])),
        Just(json!([])),
        scalar_strategy(),
    ]
}

/// Strategy for generating specifications whose root is a mapping without `$on`
pub fn spec_strategy() -> impl Strategy<Value = Json> {
    let node = leaf_spec_strategy().prop_recursive(4, 24, 4, |inner| {
        let fields = hash_map(key_strategy(), inner.clone(), 0..4);
        prop_oneof![
            fields
                .clone()
                .prop_map(|m| Json::Object(m.into_iter().collect())),
            (path_strategy(), fields.clone()).prop_map(|(anchor, m)| {
                let mut spec: serde_json::Map<String, Json> = m.into_iter().collect();
                spec.insert("$on".to_string(), Json::String(anchor));
                json!([Json::Object(spec)])
            }),
            vec(inner, 0..4).prop_map(|templates| json!(["$array", templates, true])),
            fields.prop_map(|m| {
                json!(["$object", Json::Object(m.into_iter().collect()), true])
            }),
        ]
    });
    hash_map(key_strategy(), node, 0..5).prop_map(|m| Json::Object(m.into_iter().collect()))
}
