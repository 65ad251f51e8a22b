//! Loading specifications and documents from JSON or YAML text
//!
//! Copyright (c) 2025 Treeform Team
//! Licensed under the Apache-2.0 license

use crate::error::Result;
use crate::value::Value;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Text formats accepted for specifications and documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Json,
    Yaml,
}

impl Format {
    /// Guess the format from a file extension; anything but `.yaml`/`.yml` is JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Format::Yaml
            }
            _ => Format::Json,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Json => write!(f, "json"),
            Format::Yaml => write!(f, "yaml"),
        }
    }
}

impl FromStr for Format {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "yaml" | "yml" => Ok(Format::Yaml),
            other => Err(crate::error::Error::configuration(format!(
                "unknown format '{}', expected json or yaml",
                other
            ))),
        }
    }
}

/// Parse a single value
pub fn parse_value(text: &str, format: Format) -> Result<Value> {
    match format {
        Format::Json => Ok(serde_json::from_str::<Value>(text)?),
        Format::Yaml => Ok(serde_yaml::from_str::<Value>(text)?),
    }
}

/// Parse one or more documents
///
/// JSON input may hold several concatenated values (JSON lines), YAML input
/// several `---` separated documents. A single top-level sequence is split
/// into one document per element.
pub fn parse_documents(text: &str, format: Format) -> Result<Vec<Value>> {
    let mut documents = match format {
        Format::Json => serde_json::Deserializer::from_str(text)
            .into_iter::<Value>()
            .collect::<std::result::Result<Vec<_>, _>>()?,
        Format::Yaml => {
            let mut documents = Vec::new();
            for document in serde_yaml::Deserializer::from_str(text) {
                documents.push(Value::deserialize(document)?);
            }
            documents
        }
    };

    if let [Value::Sequence(_)] = documents.as_slice() {
        if let Some(Value::Sequence(entries)) = documents.pop() {
            return Ok(entries);
        }
    }
    Ok(documents)
}

/// Read and parse a single value, picking the format from the extension
pub fn load_value(path: impl AsRef<Path>) -> Result<Value> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    tracing::debug!(path = %path.display(), bytes = text.len(), "Loaded source file");
    parse_value(&text, Format::from_path(path))
}
