//! Specification compiler
//!
//! Classifies a specification [`Value`] into the tagged tree of
//! [`crate::ast`]. Compilation never fails on a malformed specification:
//! unrecognized shapes become `Invalid`/`Malformed` nodes and are listed as
//! issues. The only hard failure is nesting beyond the depth limit.
//!
//! Copyright (c) 2025 Treeform Team
//! Licensed under the Apache-2.0 license

use crate::ast::*;
use crate::degradation::{
    child_path, index_path, Degradation, DegradationCode, DegradationTracker, ROOT_PATH,
};
use crate::error::{Error, Result};
use crate::functions::FunctionRegistry;
use crate::mapper::DEFAULT_MAX_DEPTH;
use crate::path::FieldPath;
use crate::value::{Mapping, Value};

impl Specification {
    /// Compile with the default depth limit
    pub fn compile(specification: &Value) -> Result<Self> {
        Self::compile_with_limit(specification, DEFAULT_MAX_DEPTH)
    }

    /// Compile, failing with [`Error::StructuralOverflow`] past `max_depth` nesting levels
    pub fn compile_with_limit(specification: &Value, max_depth: usize) -> Result<Self> {
        let mut compiler = Compiler::new(max_depth);
        let root = compiler.compile_node(specification, ROOT_PATH, 1)?;
        Ok(compiler.finish(root))
    }

    /// Compile-time issues plus every function name missing from `registry`
    pub fn check(&self, registry: &FunctionRegistry) -> Vec<Degradation> {
        let mut issues = self.issues.clone();
        for site in &self.call_sites {
            if !registry.contains(&site.name) {
                issues.push(Degradation {
                    code: DegradationCode::UnknownFunction,
                    path: site.path.clone(),
                    message: format!("function '{}' is not registered", site.name),
                });
            }
        }
        issues
    }
}

struct Compiler {
    max_depth: usize,
    tracker: DegradationTracker,
    depth: usize,
    deepest_path: String,
    call_sites: Vec<CallSite>,
}

impl Compiler {
    fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            tracker: DegradationTracker::collecting(),
            depth: 0,
            deepest_path: ROOT_PATH.to_string(),
            call_sites: Vec::new(),
        }
    }

    fn finish(self, root: SpecNode) -> Specification {
        Specification {
            root,
            issues: self.tracker.finish().items,
            depth: self.depth,
            deepest_path: self.deepest_path,
            call_sites: self.call_sites,
        }
    }

    /// Enter a nesting level, enforcing the limit
    fn descend(&mut self, path: &str, depth: usize) -> Result<()> {
        if depth > self.max_depth {
            return Err(Error::StructuralOverflow {
                depth,
                limit: self.max_depth,
                path: path.to_string(),
            });
        }
        if depth > self.depth {
            self.depth = depth;
            self.deepest_path = path.to_string();
        }
        Ok(())
    }

    fn compile_node(&mut self, value: &Value, path: &str, depth: usize) -> Result<SpecNode> {
        match value {
            Value::Mapping(map) if map.contains_key(SPEC_OBJECT_LITERAL) => {
                Ok(SpecNode::Object(self.compile_object_form(map, path)))
            }
            Value::Mapping(map) => Ok(SpecNode::Nested(self.compile_nested(map, path, depth)?)),
            Value::Sequence(items) => self.compile_sequence(items, path, depth),
            other => {
                self.tracker.record(
                    DegradationCode::InvalidFieldSpec,
                    path,
                    format!("expected a field chain, directive or nested specification, got {}", other.kind()),
                );
                Ok(SpecNode::Invalid)
            }
        }
    }

    fn compile_nested(&mut self, map: &Mapping, path: &str, depth: usize) -> Result<NestedSpec> {
        self.descend(path, depth)?;
        let mut spec = NestedSpec::default();

        for (key, value) in map {
            let key_path = child_path(path, key);
            match key.as_str() {
                SPEC_ANCHOR => spec.anchor = self.compile_anchor(value, &key_path),
                SPEC_FILTER => spec.filter = Some(self.compile_filter(value, &key_path)),
                reserved if reserved.starts_with(KEYWORD_MARKER) => {
                    self.tracker.record(
                        DegradationCode::InvalidFieldSpec,
                        &key_path,
                        format!("unknown reserved key '{}' is ignored", reserved),
                    );
                }
                _ => {
                    let node = self.compile_node(value, &key_path, depth + 1)?;
                    spec.fields.push(OutputField::new(key.clone(), node));
                }
            }
        }

        Ok(spec)
    }

    fn compile_anchor(&mut self, value: &Value, path: &str) -> AnchorDecl {
        match value.as_str() {
            Some(anchor) => AnchorDecl::Path(FieldPath::parse(anchor)),
            None => {
                self.tracker.record(
                    DegradationCode::InvalidAnchor,
                    path,
                    format!("anchor must be a dotted path string, got {}", value.kind()),
                );
                AnchorDecl::Invalid
            }
        }
    }

    fn compile_filter(&mut self, value: &Value, path: &str) -> FilterSpec {
        let parts = value.as_sequence().map(Vec::as_slice).unwrap_or_default();
        match parts {
            [field, predicate, args @ ..] => match (field.as_str(), predicate.as_str()) {
                (Some(field), Some(predicate)) => {
                    self.call_sites.push(CallSite {
                        path: path.to_string(),
                        name: predicate.to_string(),
                    });
                    FilterSpec::Predicate {
                        field: FieldPath::parse(field),
                        predicate: predicate.to_string(),
                        args: args.to_vec(),
                    }
                }
                _ => self.malformed_filter(path),
            },
            _ => self.malformed_filter(path),
        }
    }

    fn malformed_filter(&mut self, path: &str) -> FilterSpec {
        self.tracker.record(
            DegradationCode::MalformedDirective,
            path,
            "filter must be [field, predicate, args...]; every node is rejected",
        );
        FilterSpec::Malformed
    }

    fn compile_sequence(&mut self, items: &[Value], path: &str, depth: usize) -> Result<SpecNode> {
        match items {
            [] => {
                self.tracker
                    .record(DegradationCode::InvalidFieldSpec, path, "empty field chain");
                Ok(SpecNode::Invalid)
            }
            [Value::Mapping(template)] => {
                Ok(SpecNode::Iterate(self.compile_nested(template, path, depth)?))
            }
            [head, rest @ ..] => match head.as_str() {
                Some(SPEC_ARRAY_LITERAL) => Ok(SpecNode::Array(self.compile_array(rest, path, depth)?)),
                Some(SPEC_OBJECT_LITERAL) => {
                    Ok(SpecNode::Object(self.compile_object(rest, path, depth)?))
                }
                Some(first) => Ok(self.compile_field_chain(first, rest, path)),
                None => {
                    self.tracker.record(
                        DegradationCode::InvalidFieldSpec,
                        path,
                        format!("field chain must start with a string, got {}", head.kind()),
                    );
                    Ok(SpecNode::Invalid)
                }
            },
        }
    }

    fn compile_field_chain(&mut self, first: &str, rest: &[Value], path: &str) -> SpecNode {
        let Some((name, args)) = rest.split_first() else {
            return SpecNode::Field(FieldRef::Path(FieldPath::parse(first)));
        };
        let Some(name) = name.as_str() else {
            self.tracker.record(
                DegradationCode::InvalidFieldSpec,
                path,
                format!("function name must be a string, got {}", name.kind()),
            );
            return SpecNode::Invalid;
        };

        self.call_sites.push(CallSite {
            path: path.to_string(),
            name: name.to_string(),
        });
        let source = if first.is_empty() {
            None
        } else {
            Some(FieldPath::parse(first))
        };
        SpecNode::Field(FieldRef::Call(FunctionCall {
            name: name.to_string(),
            source,
            args: args.to_vec(),
        }))
    }

    /// Split `[payload, flag?]` into the payload and a strict boolean flag
    fn directive_parts<'v>(
        &mut self,
        keyword: &str,
        rest: &'v [Value],
        path: &str,
    ) -> Option<(&'v Value, bool)> {
        let parsed = match rest {
            [payload] => Some((payload, false)),
            [payload, flag] => flag.as_bool().map(|complex| (payload, complex)),
            _ => None,
        };
        if parsed.is_none() {
            self.tracker.record(
                DegradationCode::MalformedDirective,
                path,
                format!("expected [\"{}\", payload, complex?] with a boolean flag", keyword),
            );
        }
        parsed
    }

    fn compile_array(&mut self, rest: &[Value], path: &str, depth: usize) -> Result<ArrayDirective> {
        let Some((payload, complex)) = self.directive_parts(SPEC_ARRAY_LITERAL, rest, path) else {
            return Ok(ArrayDirective::Malformed);
        };

        if !complex {
            return Ok(if payload.is_null() {
                ArrayDirective::Literal(Value::empty_sequence())
            } else {
                ArrayDirective::Literal(payload.clone())
            });
        }

        let Some(entries) = payload.as_sequence() else {
            self.tracker.record(
                DegradationCode::MalformedDirective,
                path,
                format!("complex array payload must be a sequence, got {}", payload.kind()),
            );
            return Ok(ArrayDirective::Malformed);
        };

        self.descend(path, depth)?;
        let mut templates = Vec::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            templates.push(self.compile_node(entry, &index_path(path, i), depth + 1)?);
        }
        Ok(ArrayDirective::Templates(templates))
    }

    fn compile_object(&mut self, rest: &[Value], path: &str, depth: usize) -> Result<ObjectDirective> {
        let Some((payload, complex)) = self.directive_parts(SPEC_OBJECT_LITERAL, rest, path) else {
            return Ok(ObjectDirective::Malformed);
        };

        let Some(map) = payload.as_mapping() else {
            self.tracker.record(
                DegradationCode::MalformedDirective,
                path,
                format!("object payload must be a mapping, got {}", payload.kind()),
            );
            return Ok(ObjectDirective::Malformed);
        };

        if complex {
            Ok(ObjectDirective::Template(self.compile_nested(map, path, depth)?))
        } else {
            Ok(ObjectDirective::Literal(map.clone()))
        }
    }

    /// `{"$object": mapping}`, always a literal
    fn compile_object_form(&mut self, map: &Mapping, path: &str) -> ObjectDirective {
        for key in map.keys().filter(|key| key.as_str() != SPEC_OBJECT_LITERAL) {
            self.tracker.record(
                DegradationCode::InvalidFieldSpec,
                &child_path(path, key),
                format!("key is ignored next to '{}'", SPEC_OBJECT_LITERAL),
            );
        }
        match map.get(SPEC_OBJECT_LITERAL) {
            Some(Value::Mapping(literal)) => ObjectDirective::Literal(literal.clone()),
            other => {
                self.tracker.record(
                    DegradationCode::MalformedDirective,
                    &child_path(path, SPEC_OBJECT_LITERAL),
                    format!(
                        "object payload must be a mapping, got {}",
                        other.map_or("absent", Value::kind)
                    ),
                );
                ObjectDirective::Malformed
            }
        }
    }
}
