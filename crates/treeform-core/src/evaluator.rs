//! Recursive evaluation of a compiled specification
//!
//! Evaluation walks the [`SpecNode`] tree alongside the document. The only
//! context carried down is the current node, the value the active anchor
//! resolved to. `None` means the anchor missed: fields under it are `Absent`
//! but every nested structure is still built.
//!
//! Copyright (c) 2025 Treeform Team
//! Licensed under the Apache-2.0 license

use crate::ast::*;
use crate::degradation::{
    child_path, contain_foreign, index_path, DegradationCode, DegradationTracker, ROOT_PATH,
};
use crate::functions::{CallContext, FunctionRegistry};
use crate::path::{lookup, FieldPath};
use crate::value::{Mapping, Value};

/// Value the active anchor points at
type Scope<'d> = Option<&'d Value>;

pub(crate) struct Evaluator<'r> {
    registry: &'r FunctionRegistry,
    tracker: DegradationTracker,
}

impl<'r> Evaluator<'r> {
    pub(crate) fn new(registry: &'r FunctionRegistry, tracker: DegradationTracker) -> Self {
        Self { registry, tracker }
    }

    pub(crate) fn finish(self) -> DegradationTracker {
        self.tracker
    }

    /// Evaluate `spec` against `document`, starting at the anchor `on`
    pub(crate) fn evaluate(&mut self, spec: &Specification, document: &Value, on: &FieldPath) -> Value {
        let scope = lookup(document, on);
        if scope.is_none() {
            self.tracker.record(
                DegradationCode::ResolutionMiss,
                ROOT_PATH,
                format!("anchor '{}' did not resolve", on),
            );
        }
        self.eval_node(spec.root(), scope, ROOT_PATH)
    }

    fn eval_node(&mut self, node: &SpecNode, scope: Scope<'_>, path: &str) -> Value {
        match node {
            SpecNode::Field(FieldRef::Path(field)) => self.eval_path(field, scope, path),
            SpecNode::Field(FieldRef::Call(call)) => self.eval_call(call, scope, path),
            SpecNode::Array(directive) => self.eval_array(directive, scope, path),
            SpecNode::Object(directive) => self.eval_object(directive, scope, path),
            SpecNode::Nested(spec) => self.eval_nested(spec, scope, path),
            SpecNode::Iterate(spec) => self.eval_iterate(spec, scope, path),
            SpecNode::Invalid => {
                self.tracker.record(
                    DegradationCode::InvalidFieldSpec,
                    path,
                    "unrecognized field specification",
                );
                Value::Absent
            }
        }
    }

    fn eval_path(&mut self, field: &FieldPath, scope: Scope<'_>, path: &str) -> Value {
        // a missed anchor was already reported where it was declared
        let Some(node) = scope else {
            return Value::Absent;
        };
        match lookup(node, field) {
            Some(value) => contain_foreign(value.clone(), path, &mut self.tracker),
            None => {
                self.tracker.record(
                    DegradationCode::ResolutionMiss,
                    path,
                    format!("field '{}' did not resolve", field),
                );
                Value::Absent
            }
        }
    }

    fn eval_call(&mut self, call: &FunctionCall, scope: Scope<'_>, path: &str) -> Value {
        // placeholder form has no subject; every argument is literal
        let subject = call
            .source
            .as_ref()
            .and_then(|source| scope.and_then(|node| lookup(node, source)));
        let absent = Value::Absent;
        let ctx = CallContext::new(subject.unwrap_or(&absent), &call.args);

        match self.registry.call(&call.name, &ctx) {
            Some(result) => contain_foreign(result, path, &mut self.tracker),
            None => {
                self.tracker.record(
                    DegradationCode::UnknownFunction,
                    path,
                    format!("function '{}' is not registered", call.name),
                );
                Value::Absent
            }
        }
    }

    fn eval_array(&mut self, directive: &ArrayDirective, scope: Scope<'_>, path: &str) -> Value {
        match directive {
            ArrayDirective::Literal(literal) => contain_foreign(literal.clone(), path, &mut self.tracker),
            ArrayDirective::Templates(templates) => Value::Sequence(
                templates
                    .iter()
                    .enumerate()
                    .map(|(i, template)| self.eval_node(template, scope, &index_path(path, i)))
                    .collect(),
            ),
            ArrayDirective::Malformed => {
                self.tracker.record(
                    DegradationCode::MalformedDirective,
                    path,
                    "malformed $array directive",
                );
                Value::empty_sequence()
            }
        }
    }

    fn eval_object(&mut self, directive: &ObjectDirective, scope: Scope<'_>, path: &str) -> Value {
        match directive {
            ObjectDirective::Literal(literal) => {
                contain_foreign(Value::Mapping(literal.clone()), path, &mut self.tracker)
            }
            ObjectDirective::Template(spec) => self.eval_nested(spec, scope, path),
            ObjectDirective::Malformed => {
                self.tracker.record(
                    DegradationCode::MalformedDirective,
                    path,
                    "malformed $object directive",
                );
                Value::empty_mapping()
            }
        }
    }

    /// Apply the specification's own `$on` to the inherited scope
    fn anchor<'d>(&mut self, spec: &NestedSpec, scope: Scope<'d>, path: &str) -> Scope<'d> {
        match &spec.anchor {
            AnchorDecl::Inherit => scope,
            AnchorDecl::Path(anchor) => {
                let node = scope.and_then(|node| lookup(node, anchor));
                if scope.is_some() && node.is_none() {
                    self.tracker.record(
                        DegradationCode::ResolutionMiss,
                        path,
                        format!("anchor '{}' did not resolve", anchor),
                    );
                }
                node
            }
            AnchorDecl::Invalid => {
                self.tracker.record(
                    DegradationCode::InvalidAnchor,
                    path,
                    "anchor is not a path; nothing below it resolves",
                );
                None
            }
        }
    }

    fn eval_nested(&mut self, spec: &NestedSpec, scope: Scope<'_>, path: &str) -> Value {
        match self.anchor(spec, scope, path) {
            Some(Value::Sequence(elements)) => self.eval_elements(spec, elements, path),
            node => {
                if self.passes_filter(spec, node, path) {
                    Value::Mapping(self.eval_fields(spec, node, path))
                } else {
                    Value::empty_mapping()
                }
            }
        }
    }

    fn eval_iterate(&mut self, spec: &NestedSpec, scope: Scope<'_>, path: &str) -> Value {
        match self.anchor(spec, scope, path) {
            Some(Value::Sequence(elements)) => self.eval_elements(spec, elements, path),
            Some(other) => {
                self.tracker.record(
                    DegradationCode::ResolutionMiss,
                    path,
                    format!("iteration target is a {}, not a sequence", other.kind()),
                );
                Value::Absent
            }
            None => Value::Absent,
        }
    }

    /// Evaluate once per element, each element becoming the document with an empty anchor
    fn eval_elements(&mut self, spec: &NestedSpec, elements: &[Value], path: &str) -> Value {
        let mut results = Vec::with_capacity(elements.len());
        for (i, element) in elements.iter().enumerate() {
            let element_path = index_path(path, i);
            if self.passes_filter(spec, Some(element), &element_path) {
                results.push(Value::Mapping(self.eval_fields(spec, Some(element), &element_path)));
            }
        }
        Value::Sequence(results)
    }

    fn eval_fields(&mut self, spec: &NestedSpec, node: Scope<'_>, path: &str) -> Mapping {
        let mut output = Mapping::new();
        for field in &spec.fields {
            let value = self.eval_node(&field.node, node, &child_path(path, &field.key));
            insert_at(&mut output, &field.segments, value);
        }
        output
    }

    fn passes_filter(&mut self, spec: &NestedSpec, node: Scope<'_>, path: &str) -> bool {
        let passing = match &spec.filter {
            None => return true,
            Some(FilterSpec::Malformed) => false,
            Some(FilterSpec::Predicate {
                field,
                predicate,
                args,
            }) => {
                let value = node.and_then(|node| lookup(node, field));
                match value {
                    None => true,
                    Some(value) if value.is_null() => true,
                    Some(value) => match self.registry.call(predicate, &CallContext::new(value, args)) {
                        Some(result) => result.is_truthy(),
                        None => {
                            self.tracker.record(
                                DegradationCode::UnknownFunction,
                                path,
                                format!("predicate '{}' is not registered", predicate),
                            );
                            false
                        }
                    },
                }
            }
        };
        if !passing {
            self.tracker
                .record(DegradationCode::FilteredOut, path, "node rejected by $filter");
        }
        passing
    }
}

/// Write `value` under a dotted key, creating and merging intermediate mappings
pub(crate) fn insert_at(target: &mut Mapping, segments: &[String], value: Value) {
    match segments {
        [] => {}
        [key] => {
            target.insert(key.clone(), value);
        }
        [head, rest @ ..] => {
            let entry = target.entry(head.clone()).or_insert_with(Value::empty_mapping);
            if !matches!(entry, Value::Mapping(_)) {
                *entry = Value::empty_mapping();
            }
            if let Value::Mapping(inner) = entry {
                insert_at(inner, rest, value);
            }
        }
    }
}
