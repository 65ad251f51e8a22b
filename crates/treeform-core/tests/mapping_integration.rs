//! Integration tests for the mapping engine
//!
//! This file covers:
//! - Field chains, anchors and dotted output keys
//! - `$array` and `$object` directives in literal and complex mode
//! - Iteration, `$filter`, and anchors landing on sequences
//! - The degradation policy and its report
//! - Depth limits


use serde_json::json;
use test_support::{deep_spec, person_document, run, run_on, run_with_report};
use treeform_core::source::{parse_value, Format};
use treeform_core::{
    DegradationCode, Error, FieldPath, Mapper, Mapping, Scalar, Specification, Value,
};

// ============================================================================
// FIELD CHAINS
// ============================================================================

#[test]
fn test_identity_spec_reproduces_fields() {
    let output = run(
        person_document(),
        json!({"id": ["id"], "age": ["age"], "comment": ["comment"], "nickname": ["nickname"]}),
    );
    assert_eq!(
        output,
        json!({"id": "P-001", "age": 34, "comment": "", "nickname": null})
    );
}

#[test]
fn test_dotted_output_key_matches_nested_spec() {
    let document = json!({"person_name": "X"});
    let dotted = run(document.clone(), json!({"person.name": ["person_name"]}));
    let nested = run(document, json!({"person": {"name": ["person_name"]}}));

    assert_eq!(dotted, json!({"person": {"name": "X"}}));
    assert_eq!(dotted, nested);
}

#[test]
fn test_dotted_keys_merge_with_siblings() {
    let output = run(
        person_document(),
        json!({
            "person": {"name": ["person_name"]},
            "person.age": ["age"],
            "person.address.city": ["address.home.city_name"]
        }),
    );
    assert_eq!(
        output,
        json!({"person": {"name": "Ana Lima", "age": 34, "address": {"city": "Metropolis"}}})
    );
}

#[test]
fn test_missing_field_is_null() {
    assert_eq!(run(json!({}), json!({"x": ["nope"]})), json!({"x": null}));
    assert_eq!(
        run(person_document(), json!({"x": ["address.home.nope.deeper"]})),
        json!({"x": null})
    );
}

#[test]
fn test_paths_do_not_index_sequences() {
    let output = run(person_document(), json!({"first": ["contacts.0.value"], "tag": ["tags.type"]}));
    assert_eq!(output, json!({"first": null, "tag": null}));
}

#[test]
fn test_empty_string_is_preserved() {
    let output = run(
        person_document(),
        json!({"comment": ["comment"], "fallback": ["comment", "default_to", "x"]}),
    );
    assert_eq!(output, json!({"comment": "", "fallback": ""}));
}

#[test]
fn test_two_plain_paths_are_not_concatenated() {
    let output = run(person_document(), json!({"both": ["id", "age"]}));
    assert_eq!(output, json!({"both": null}));
}

#[test]
fn test_invalid_field_specs_are_null() {
    let output = run(
        person_document(),
        json!({"empty": [], "number": 5, "non_string": [1], "text": "id"}),
    );
    assert_eq!(
        output,
        json!({"empty": null, "number": null, "non_string": null, "text": null})
    );
}

// ============================================================================
// FUNCTIONS
// ============================================================================

#[test]
fn test_default_to_supplies_fallbacks() {
    let output = run(
        person_document(),
        json!({
            "nick": ["nickname", "default_to", "n/a"],
            "missing": ["nowhere", "default_to", 0],
            "name": ["person_name", "default_to", "n/a"],
            "no_fallback": ["nowhere", "default_to"]
        }),
    );
    assert_eq!(
        output,
        json!({"nick": "n/a", "missing": 0, "name": "Ana Lima", "no_fallback": null})
    );
}

#[test]
fn test_placeholder_default_to_is_literal() {
    let document = json!({"name": "Peter Z", "institution": "Some University"});
    let output = run(
        document,
        json!({
            "label": ["", "default_to", "name"],
            "first": ["", "default_to", "institution", "ignored"],
            "none": ["", "default_to"]
        }),
    );
    assert_eq!(
        output,
        json!({"label": "name", "first": "institution", "none": null})
    );
}

#[test]
fn test_map_with_default_to_labels() {
    let document = json!({
        "name": "Peter Z",
        "institution": "Some University",
        "address": "Some place"
    });
    let templates = json!([
        {"key": ["", "default_to", "name"], "value": ["name"]},
        {"key": ["", "default_to", "institution"], "value": ["institution"]},
        {"key": ["", "default_to", "address"], "value": ["address"]}
    ]);

    let output = run(document, json!({"attributes": ["$array", templates, true]}));

    assert_eq!(
        output,
        json!({"attributes": [
            {"key": "name", "value": "Peter Z"},
            {"key": "institution", "value": "Some University"},
            {"key": "address", "value": "Some place"}
        ]})
    );
}

#[test]
fn test_map_with_array_object_with_spec() {
    let document = json!({"from_key": "from_value"});
    let templates = json!([{"name": ["", "default_to", "name"], "value": ["from_key"]}]);

    let output = run(
        document,
        json!({"metadata": ["$array", templates, true], "empty": ["$array", []]}),
    );

    assert_eq!(output["metadata"], json!([{"name": "name", "value": "from_value"}]));
    assert_eq!(output["empty"], json!([]));
}

#[test]
fn test_piped_functions() {
    let output = run(
        person_document(),
        json!({
            "date": ["signed_up", "format_date"],
            "tags": ["tags", "concatenate_list"],
            "code": ["id", "prefix_with", "#"],
            "nick": ["nickname", "default_to", "none"]
        }),
    );
    assert_eq!(
        output,
        json!({"date": "2019-05-23", "tags": "admin , editor", "code": "#P-001", "nick": "none"})
    );
}

#[test]
fn test_unknown_function_is_null() {
    let outcome = run_with_report(person_document(), json!({"x": ["", "shout", "id"]}));
    assert_eq!(outcome.output.to_json(), json!({"x": null}));
    assert_eq!(outcome.report.count(DegradationCode::UnknownFunction), 1);
}

#[test]
fn test_custom_registry() {
    fn initials(ctx: &treeform_core::CallContext<'_>) -> Value {
        ctx.subject.as_str().map_or(Value::Absent, |name| {
            Value::string(
                name.split_whitespace()
                    .filter_map(|word| word.chars().next())
                    .collect::<String>(),
            )
        })
    }

    let registry = treeform_core::FunctionRegistry::builtin().with_function("initials", initials);
    let mapper = Mapper::new().with_registry(registry);
    let output = mapper
        .map(
            &Value::from(person_document()),
            &Value::from(json!({"initials": ["person_name", "initials"]})),
            None,
        )
        .unwrap();
    assert_eq!(output.to_json(), json!({"initials": "AL"}));
}

// ============================================================================
// ANCHORS
// ============================================================================

#[test]
fn test_anchor_composition() {
    let output = run_on(
        json!({"address": {"home": {"city_name": "Metropolis"}}}),
        json!({"$on": "home", "city": ["city_name"]}),
        Some("address"),
    );
    assert_eq!(output, json!({"city": "Metropolis"}));
}

#[test]
fn test_anchors_are_additive_per_level() {
    let output = run(
        person_document(),
        json!({
            "$on": "address",
            "home": {"$on": "home", "city": ["city_name"]},
            "work_city": ["work.city_name"],
            "plain": {"street": ["home.street"]}
        }),
    );
    assert_eq!(
        output,
        json!({
            "home": {"city": "Metropolis"},
            "work_city": "Gotham",
            "plain": {"street": "Main St 1"}
        })
    );
}

#[test]
fn test_failed_anchor_keeps_structure() {
    let output = run(
        person_document(),
        json!({
            "$on": "nowhere",
            "a": ["a"],
            "inner": {"b": ["b"]},
            "literal": ["$object", {"k": 1}],
            "list": ["$array", [{"c": ["c"]}], true]
        }),
    );
    assert_eq!(
        output,
        json!({"a": null, "inner": {"b": null}, "literal": {"k": 1}, "list": [{"c": null}]})
    );
}

#[test]
fn test_non_string_anchor_resolves_nothing() {
    let outcome = run_with_report(person_document(), json!({"$on": ["address"], "id": ["id"]}));
    assert_eq!(outcome.output.to_json(), json!({"id": null}));
    assert_eq!(outcome.report.count(DegradationCode::InvalidAnchor), 1);
}

#[test]
fn test_anchor_on_sequence_maps_each_element() {
    let output = run(person_document(), json!({"$on": "contacts", "kind": ["type"]}));
    assert_eq!(
        output,
        json!([{"kind": "email"}, {"kind": "phone"}, {"kind": "fax"}])
    );

    let nested = run(
        person_document(),
        json!({"kinds": {"$on": "contacts", "kind": ["type"]}}),
    );
    assert_eq!(nested["kinds"].as_array().map(Vec::len), Some(3));
}

#[test]
fn test_sequence_document_maps_each_entry() {
    let output = run(
        json!([{"n": 1}, {"n": 2}]),
        json!({"number": ["n"]}),
    );
    assert_eq!(output, json!([{"number": 1}, {"number": 2}]));
}

// ============================================================================
// DIRECTIVES
// ============================================================================

#[test]
fn test_array_complex_preserves_order_and_count() {
    let output = run(
        person_document(),
        json!({
            "attributes": ["$array", [
                {"name": ["person_name"]},
                {"name": ["id"]},
                {"value": ["age"]}
            ], true]
        }),
    );
    assert_eq!(
        output,
        json!({"attributes": [{"name": "Ana Lima"}, {"name": "P-001"}, {"value": 34}]})
    );
}

#[test]
fn test_array_complex_accepts_any_node() {
    let output = run(
        person_document(),
        json!({"values": ["$array", [["id"], ["$array", [1, 2]], ["nope"], ["tags", "concatenate_list"]], true]}),
    );
    assert_eq!(
        output,
        json!({"values": ["P-001", [1, 2], null, "admin , editor"]})
    );
}

#[test]
fn test_array_complex_uses_current_anchor() {
    let output = run(
        person_document(),
        json!({"$on": "address.home", "list": ["$array", [{"c": ["city_name"]}], true]}),
    );
    assert_eq!(output, json!({"list": [{"c": "Metropolis"}]}));
}

#[test]
fn test_array_literal_is_copied_verbatim() {
    let output = run(
        person_document(),
        json!({
            "names": ["$array", ["id", "age"]],
            "explicit": ["$array", [{"k": ["id"]}], false],
            "null": ["$array", null]
        }),
    );
    assert_eq!(
        output,
        json!({"names": ["id", "age"], "explicit": [{"k": ["id"]}], "null": []})
    );
}

#[test]
fn test_object_literal_performs_no_resolution() {
    let document = json!({"b": "resolved", "a": "resolved"});
    let output = run(
        document,
        json!({"obj": ["$object", {"a": "b"}], "form": {"$object": {"a": ["b"]}}}),
    );
    assert_eq!(output, json!({"obj": {"a": "b"}, "form": {"a": ["b"]}}));
}

#[test]
fn test_object_complex_is_a_nested_spec() {
    let output = run(
        person_document(),
        json!({
            "summary": ["$object", {
                "name": ["person_name"],
                "city": ["address.home.city_name"],
                "tags": ["$array", ["fixed"]]
            }, true]
        }),
    );
    assert_eq!(
        output,
        json!({"summary": {"name": "Ana Lima", "city": "Metropolis", "tags": ["fixed"]}})
    );
}

#[test]
fn test_malformed_directives_degrade_to_empty_containers() {
    let outcome = run_with_report(
        person_document(),
        json!({
            "a": ["$array"],
            "o": ["$object"],
            "flag": ["$array", [1], "yes"],
            "extra": ["$object", {}, true, 1],
            "complex_scalar": ["$array", "x", true],
            "object_list": ["$object", [1, 2]]
        }),
    );
    assert_eq!(
        outcome.output.to_json(),
        json!({"a": [], "o": {}, "flag": [], "extra": {}, "complex_scalar": [], "object_list": {}})
    );
    assert_eq!(outcome.report.count(DegradationCode::MalformedDirective), 6);
}

// ============================================================================
// ITERATION AND FILTERS
// ============================================================================

#[test]
fn test_iteration_spec_maps_sequence_elements() {
    let output = run(
        person_document(),
        json!({
            "contacts": [{
                "$on": "contacts",
                "kind": ["type"],
                "detail": {"value": ["value"]}
            }]
        }),
    );
    assert_eq!(
        output,
        json!({"contacts": [
            {"kind": "email", "detail": {"value": "ana@example.com"}},
            {"kind": "phone", "detail": {"value": "555-0100"}},
            {"kind": "fax", "detail": {"value": null}}
        ]})
    );
}

#[test]
fn test_iteration_resets_anchor_per_element() {
    let document = json!({
        "groups": [
            {"name": "a", "meta": {"size": 1}},
            {"name": "b", "meta": {"size": 2}}
        ],
        "name": "outer"
    });
    let output = run(
        document,
        json!({"groups": [{"$on": "groups", "name": ["name"], "meta": {"$on": "meta", "size": ["size"]}}]}),
    );
    assert_eq!(
        output,
        json!({"groups": [
            {"name": "a", "meta": {"size": 1}},
            {"name": "b", "meta": {"size": 2}}
        ]})
    );
}

#[test]
fn test_iteration_over_non_sequence_is_null() {
    let output = run(
        person_document(),
        json!({"x": [{"$on": "address", "a": ["a"]}], "y": [{"$on": "missing", "a": ["a"]}]}),
    );
    assert_eq!(output, json!({"x": null, "y": null}));
}

#[test]
fn test_filter_skips_elements() {
    let outcome = run_with_report(
        person_document(),
        json!({"primary": [{"$on": "contacts", "$filter": ["primary", "is_true"], "value": ["value"]}]}),
    );
    assert_eq!(
        outcome.output.to_json(),
        json!({"primary": [{"value": "ana@example.com"}, {"value": null}]})
    );
    assert_eq!(outcome.report.count(DegradationCode::FilteredOut), 1);
    assert_eq!(
        outcome.report.with_code(DegradationCode::FilteredOut).next().map(|d| d.path.as_str()),
        Some("$.primary[1]")
    );
}

#[test]
fn test_filter_on_single_node() {
    let output = run(
        person_document(),
        json!({
            "gotham": {"$on": "address.home", "$filter": ["city_name", "equals", "Gotham"], "city": ["city_name"]},
            "metro": {"$on": "address.home", "$filter": ["city_name", "equals", "Metropolis"], "city": ["city_name"]}
        }),
    );
    assert_eq!(output, json!({"gotham": {}, "metro": {"city": "Metropolis"}}));
}

#[test]
fn test_filter_with_unknown_predicate_rejects() {
    let outcome = run_with_report(
        person_document(),
        json!({"c": [{"$on": "contacts", "$filter": ["type", "is_fancy"], "t": ["type"]}]}),
    );
    assert_eq!(outcome.output.to_json(), json!({"c": []}));
    assert_eq!(outcome.report.count(DegradationCode::UnknownFunction), 3);
}

// ============================================================================
// DEGRADATION
// ============================================================================

#[test]
fn test_foreign_scalars_are_contained() {
    let mut document = Mapping::new();
    document.insert("blob".to_string(), Value::Scalar(Scalar::Bytes(b"abc".to_vec())));
    document.insert("binary".to_string(), Value::Scalar(Scalar::Bytes(vec![0xff, 0xfe])));
    document.insert(
        "set".to_string(),
        Value::Scalar(Scalar::Set(vec![
            Scalar::String("b".to_string()),
            Scalar::String("a".to_string()),
            Scalar::String("b".to_string()),
        ])),
    );
    document.insert("z".to_string(), Value::Scalar(Scalar::Complex { re: 1.0, im: -1.0 }));

    let spec = Value::from(json!({"blob": ["blob"], "binary": ["binary"], "set": ["set"], "z": ["z"]}));
    let outcome = Mapper::new()
        .map_with_report(&Value::Mapping(document), &spec, None)
        .unwrap();

    assert_eq!(
        outcome.output.to_json(),
        json!({"blob": "abc", "binary": null, "set": ["a", "b"], "z": null})
    );
    assert_eq!(outcome.report.count(DegradationCode::UnsupportedValueType), 2);
}

#[test]
fn test_report_locates_misses() {
    let outcome = run_with_report(
        person_document(),
        json!({"a": {"b": ["missing"]}, "list": ["$array", [["id"], ["gone"]], true]}),
    );
    let paths: Vec<_> = outcome
        .report
        .with_code(DegradationCode::ResolutionMiss)
        .map(|d| d.path.clone())
        .collect();
    assert_eq!(paths, vec!["$.a.b", "$.list[1]"]);
    assert_eq!(outcome.report.summary.total_items, 2);
    assert!(!outcome.report.has_spec_problems());
}

#[test]
fn test_depth_limit() {
    let document = Value::empty_mapping();
    assert!(treeform_core::map(&document, &Value::from(deep_spec(64)), None).is_ok());

    let err = treeform_core::map(&document, &Value::from(deep_spec(65)), None).unwrap_err();
    match err {
        Error::StructuralOverflow { depth, limit, .. } => {
            assert_eq!(depth, 65);
            assert_eq!(limit, 64);
        }
        other => panic!("Expected structural overflow, got {:?}", other),
    }

    let relaxed = Mapper::new().with_max_depth(100);
    assert!(relaxed
        .map(&document, &Value::from(deep_spec(65)), None)
        .is_ok());
}

// ============================================================================
// SOURCES AND BATCHES
// ============================================================================

#[test]
fn test_yaml_specification() {
    let yaml = r#"
id: [id]
city:
  $on: address.home
  name: [city_name]
attributes:
  - $array
  - - name: [person_name]
  - true
"#;
    let spec = parse_value(yaml, Format::Yaml).unwrap();
    let output = treeform_core::map(&Value::from(person_document()), &spec, None).unwrap();
    assert_eq!(
        output.to_json(),
        json!({"id": "P-001", "city": {"name": "Metropolis"}, "attributes": [{"name": "Ana Lima"}]})
    );
}

#[test]
fn test_compiled_specification_is_reusable() {
    let mapper = Mapper::new();
    let spec = Specification::compile(&Value::from(json!({"v": ["value"]}))).unwrap();
    let documents: Vec<Value> = (0..5).map(|i| Value::from(json!({"value": i}))).collect();

    let outputs = mapper.map_batch(&documents, &spec, None);
    assert_eq!(outputs.len(), 5);
    assert_eq!(outputs[4].to_json(), json!({"v": 4}));

    let anchored = mapper.map_batch(
        &[Value::from(json!({"inner": {"value": "x"}}))],
        &spec,
        Some(&FieldPath::parse("inner")),
    );
    assert_eq!(anchored[0].to_json(), json!({"v": "x"}));
}
