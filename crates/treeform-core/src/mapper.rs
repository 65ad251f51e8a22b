//! Mapping entry points
//!
//! [`Mapper`] bundles a function registry with evaluation options. A
//! specification is compiled once and can then be applied to any number of
//! documents, from any number of threads.
//!
//! Copyright (c) 2025 Treeform Team
//! Licensed under the Apache-2.0 license

use crate::ast::Specification;
use crate::degradation::{DegradationReport, DegradationTracker};
use crate::error::{Error, Result};
use crate::evaluator::Evaluator;
use crate::functions::FunctionRegistry;
use crate::path::FieldPath;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

/// Default bound on specification nesting
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Evaluation options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapOptions {
    /// Deepest specification nesting accepted before failing with a structural overflow
    pub max_depth: usize,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl MapOptions {
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(Error::configuration("max_depth must be at least 1"));
        }
        Ok(())
    }
}

/// Output of a mapping call together with everything the engine absorbed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappingOutcome {
    pub output: Value,
    pub report: DegradationReport,
}

/// Reusable mapping engine
#[derive(Debug, Clone, Default)]
pub struct Mapper {
    registry: FunctionRegistry,
    options: MapOptions,
}

impl Mapper {
    /// A mapper with the built-in functions and default options
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(mut self, registry: FunctionRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_options(mut self, options: MapOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.options.max_depth = max_depth;
        self
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    pub fn options(&self) -> &MapOptions {
        &self.options
    }

    /// Compile a specification under this mapper's depth limit
    pub fn compile(&self, specification: &Value) -> Result<Specification> {
        self.options.validate()?;
        Specification::compile_with_limit(specification, self.options.max_depth)
    }

    /// Compile and apply in one step
    pub fn map(&self, document: &Value, specification: &Value, on: Option<&FieldPath>) -> Result<Value> {
        let compiled = self.compile(specification)?;
        self.apply(document, &compiled, on)
    }

    /// Apply a compiled specification; degradations are logged but not kept
    pub fn apply(&self, document: &Value, specification: &Specification, on: Option<&FieldPath>) -> Result<Value> {
        self.run(document, specification, on, DegradationTracker::logging_only())
            .map(|(output, _)| output)
    }

    /// Apply a compiled specification and collect a degradation report
    pub fn apply_with_report(
        &self,
        document: &Value,
        specification: &Specification,
        on: Option<&FieldPath>,
    ) -> Result<MappingOutcome> {
        let (output, tracker) =
            self.run(document, specification, on, DegradationTracker::collecting())?;
        Ok(MappingOutcome {
            output,
            report: tracker.finish(),
        })
    }

    /// Compile, apply, and collect a degradation report
    #[instrument(level = "debug", skip_all, fields(on = %on.map(ToString::to_string).unwrap_or_default()))]
    pub fn map_with_report(
        &self,
        document: &Value,
        specification: &Value,
        on: Option<&FieldPath>,
    ) -> Result<MappingOutcome> {
        let compiled = self.compile(specification)?;
        let outcome = self.apply_with_report(document, &compiled, on)?;
        debug!(
            degradations = outcome.report.len(),
            depth = compiled.depth(),
            "Mapping complete"
        );
        Ok(outcome)
    }

    /// Map every document independently
    ///
    /// A document whose mapping fails is replaced by `null`; the failure is
    /// logged and the rest of the batch is still mapped.
    pub fn map_batch(
        &self,
        documents: &[Value],
        specification: &Specification,
        on: Option<&FieldPath>,
    ) -> Vec<Value> {
        documents
            .iter()
            .enumerate()
            .map(|(index, document)| match self.apply(document, specification, on) {
                Ok(output) => output,
                Err(err) => {
                    error!(index = index, error = %err, "Could not map batch entry");
                    Value::null()
                }
            })
            .collect()
    }

    fn run(
        &self,
        document: &Value,
        specification: &Specification,
        on: Option<&FieldPath>,
        tracker: DegradationTracker,
    ) -> Result<(Value, DegradationTracker)> {
        self.options.validate()?;
        if specification.depth() > self.options.max_depth {
            return Err(Error::StructuralOverflow {
                depth: specification.depth(),
                limit: self.options.max_depth,
                path: specification.deepest_path().to_string(),
            });
        }

        let root = FieldPath::root();
        let mut evaluator = Evaluator::new(&self.registry, tracker);
        let output = evaluator.evaluate(specification, document, on.unwrap_or(&root));
        Ok((output, evaluator.finish()))
    }
}
