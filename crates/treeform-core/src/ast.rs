//! Compiled specification tree
//!
//! A specification arrives as a plain [`Value`] tree. Before anything is
//! evaluated it is classified once into these tagged nodes, so the evaluator
//! dispatches on a variant instead of re-inspecting value shapes.
//!
//! Copyright (c) 2025 Treeform Team
//! Licensed under the Apache-2.0 license

use crate::degradation::Degradation;
use crate::path::FieldPath;
use crate::value::{Mapping, Value};

/// Reserved key declaring the anchor of a nested specification
pub const SPEC_ANCHOR: &str = "$on";
/// Reserved key declaring a node filter
pub const SPEC_FILTER: &str = "$filter";
/// Directive keyword for array literals and templates
pub const SPEC_ARRAY_LITERAL: &str = "$array";
/// Directive keyword for object literals and templates
pub const SPEC_OBJECT_LITERAL: &str = "$object";
/// Prefix shared by every reserved word
pub const KEYWORD_MARKER: char = '$';

/// A compiled node of a specification
#[derive(Debug, Clone, PartialEq)]
pub enum SpecNode {
    /// Field reference chain
    Field(FieldRef),
    /// `["$array", ...]`
    Array(ArrayDirective),
    /// `["$object", ...]` or `{"$object": ...}`
    Object(ObjectDirective),
    /// Plain nested specification
    Nested(NestedSpec),
    /// `[ {nested spec} ]`, applied to every element of a sequence
    Iterate(NestedSpec),
    /// Anything that is not a recognized form; evaluates to `Absent`
    Invalid,
}

/// A mapping-shaped specification level
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NestedSpec {
    pub anchor: AnchorDecl,
    pub filter: Option<FilterSpec>,
    pub fields: Vec<OutputField>,
}

/// One output key together with the node that produces its value
#[derive(Debug, Clone, PartialEq)]
pub struct OutputField {
    /// Key as written in the specification
    pub key: String,
    /// Key split on `.`; more than one segment builds nested output
    pub segments: Vec<String>,
    pub node: SpecNode,
}

impl OutputField {
    pub fn new(key: impl Into<String>, node: SpecNode) -> Self {
        let key = key.into();
        let segments = key.split(crate::path::FIELD_SEPARATOR).map(str::to_string).collect();
        Self { key, segments, node }
    }
}

/// Anchor declared by `$on`
#[derive(Debug, Clone, Default, PartialEq)]
pub enum AnchorDecl {
    /// No `$on` at this level
    #[default]
    Inherit,
    /// Path appended to the inherited anchor
    Path(FieldPath),
    /// `$on` was present but not a path; nothing under it resolves
    Invalid,
}

/// Reference to source data
#[derive(Debug, Clone, PartialEq)]
pub enum FieldRef {
    /// `["a.b"]`
    Path(FieldPath),
    /// `["", name, args...]` or `[source, name, args...]`
    Call(FunctionCall),
}

/// A named transform applied to literal arguments
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    /// Piped source; `None` for the placeholder form
    pub source: Option<FieldPath>,
    pub args: Vec<Value>,
}

/// `$filter` declaration
#[derive(Debug, Clone, PartialEq)]
pub enum FilterSpec {
    /// `[field, predicate, args...]`
    Predicate {
        field: FieldPath,
        predicate: String,
        args: Vec<Value>,
    },
    /// Not a recognized filter; rejects every node
    Malformed,
}

/// Compiled `$array` directive
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayDirective {
    /// Copied to the output verbatim
    Literal(Value),
    /// Each entry evaluated against the current scope
    Templates(Vec<SpecNode>),
    /// Evaluates to an empty sequence
    Malformed,
}

/// Compiled `$object` directive
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectDirective {
    /// Copied to the output verbatim
    Literal(Mapping),
    /// Evaluated as a nested specification against the current scope
    Template(NestedSpec),
    /// Evaluates to an empty mapping
    Malformed,
}

/// Where a function or predicate is named in a specification
#[derive(Debug, Clone, PartialEq)]
pub struct CallSite {
    pub path: String,
    pub name: String,
}

/// A specification classified and ready for evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct Specification {
    pub(crate) root: SpecNode,
    pub(crate) issues: Vec<Degradation>,
    pub(crate) depth: usize,
    pub(crate) deepest_path: String,
    pub(crate) call_sites: Vec<CallSite>,
}

impl Specification {
    pub fn root(&self) -> &SpecNode {
        &self.root
    }

    /// Problems found at compile time, located by specification path
    pub fn issues(&self) -> &[Degradation] {
        &self.issues
    }

    /// Deepest nesting level reached by the specification
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Specification path at which [`Specification::depth`] is reached
    pub fn deepest_path(&self) -> &str {
        &self.deepest_path
    }

    /// Every function and predicate name the specification refers to
    pub fn call_sites(&self) -> &[CallSite] {
        &self.call_sites
    }
}
