//! Treeform Core - spec-driven restructuring of tree-shaped documents
//!
//! This crate maps an input document (nested mappings, sequences and
//! scalars) into a differently shaped output document. The shape of the
//! output is described by a declarative specification, itself a document.
//!
//! # Main Components
//!
//! - **Value Model**: [`Value`], with `Absent` kept apart from `null`
//! - **Path Resolution**: dotted field paths resolved relative to an anchor
//! - **Compiler**: specifications are classified once into a tagged tree
//! - **Evaluator**: field chains, functions, `$array`/`$object` directives,
//!   nested and iterated specifications, `$filter`
//! - **Degradation Policy**: missing data and malformed specifications become
//!   `Absent` or empty containers and are recorded in a report
//!
//! # Example
//!
//! ```
//! use treeform_core::{map, FieldPath, Value};
//! use serde_json::json;
//!
//! # fn main() -> treeform_core::Result<()> {
//! let document = Value::from(json!({"address": {"home": {"city_name": "Metropolis"}}}));
//! let spec = Value::from(json!({"$on": "home", "city": ["city_name"]}));
//!
//! let output = map(&document, &spec, Some(&FieldPath::parse("address")))?;
//! assert_eq!(output.to_json(), json!({"city": "Metropolis"}));
//! # Ok(())
//! # }
//! ```

pub mod ast;
pub mod compiler;
pub mod degradation;
pub mod error;
pub mod functions;
pub mod mapper;
pub mod path;
pub mod source;
pub mod value;

mod evaluator;

#[cfg(test)]
mod proptest_strategies;

// Re-export main types for convenience
pub use ast::{Specification, SpecNode};
pub use degradation::{Degradation, DegradationCode, DegradationReport};
pub use error::{Error, Result};
pub use functions::{CallContext, FunctionRegistry, TransformFn};
pub use mapper::{MapOptions, Mapper, MappingOutcome, DEFAULT_MAX_DEPTH};
pub use path::FieldPath;
pub use source::Format;
pub use value::{Mapping, Scalar, Value};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Map `document` according to `specification`
///
/// Uses the built-in functions and default options. `on` anchors every
/// lookup of the specification's top level. Missing data never fails the
/// call; the only error is a specification nested beyond
/// [`DEFAULT_MAX_DEPTH`].
pub fn map(document: &Value, specification: &Value, on: Option<&FieldPath>) -> Result<Value> {
    Mapper::new().map(document, specification, on)
}
