//! Error types for the Treeform core library
//!
//! Missing data and malformed specifications never surface here: they are
//! absorbed by the engine and encoded in the output (see
//! [`crate::degradation`]). The only mapping failure is a specification
//! nested deeper than the configured limit. The remaining variants cover
//! loading specifications and documents from text.

use thiserror::Error;

/// Main error type for Treeform operations
#[derive(Error, Debug)]
pub enum Error {
    /// Specification nesting exceeded the configured depth limit
    #[error("Structural overflow: specification depth {depth} exceeds limit {limit} at {path}")]
    StructuralOverflow {
        depth: usize,
        limit: usize,
        path: String,
    },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// YAML parsing and serialization errors
    #[error("YAML error: {message}")]
    Yaml {
        message: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Invalid engine configuration
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Whether this error came from a mapping call rather than from loading input
    pub fn is_structural(&self) -> bool {
        matches!(self, Error::StructuralOverflow { .. })
    }
}

// Conversion implementations
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Yaml {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            message: err.to_string(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::StructuralOverflow {
            depth: 65,
            limit: 64,
            path: "$.a.b".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Structural overflow: specification depth 65 exceeds limit 64 at $.a.b"
        );
        assert!(err.is_structural());
    }

    #[test]
    fn test_json_error_conversion() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: Error = parse_err.into();
        assert!(matches!(err, Error::Json { .. }));
        assert!(!err.is_structural());
    }

    #[test]
    fn test_configuration_error() {
        let err = Error::configuration("max_depth must be positive");
        assert_eq!(err.to_string(), "Configuration error: max_depth must be positive");
    }
}
