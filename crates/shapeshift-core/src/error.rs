//! Error types for the Shapeshift core library
//!
//! This module defines the error handling system for Shapeshift, using
//! thiserror for the error definitions and anyhow as the carrier for errors
//! raised by user-supplied transform functions.
//!
//! Only two families of failure ever reach a caller of a conversion: a
//! transform function that returned an error, and rendering/parsing at the
//! JSON boundary. Incomplete metadata and shape mismatches degrade to
//! pass-through values instead of erroring.

use crate::types::Direction;
use thiserror::Error;

/// Main error type for Shapeshift operations
#[derive(Error, Debug)]
pub enum Error {
    /// A user-supplied transform step failed; the conversion is aborted
    #[error("Transform function failed for {class}.{property} ({direction}): {source}")]
    TransformFunction {
        class: String,
        property: String,
        direction: Direction,
        #[source]
        source: anyhow::Error,
    },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// YAML parsing errors (schema documents)
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

    /// A cyclic value graph cannot be rendered as a tree
    #[error("Circular reference cannot be rendered at {path}")]
    CircularReference { path: String },

    /// Invalid declarative class schema
    #[error("Schema error: {message}")]
    Schema {
        message: String,
        class: Option<String>,
    },

    /// A class name could not be resolved against the registry
    #[error("Unknown class: {name}")]
    UnknownClass { name: String },

    /// Unsupported feature or operation
    #[error("Unsupported operation: {message}")]
    Unsupported {
        message: String,
        feature: Option<String>,
    },

    /// Generic internal error with context
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a schema error, optionally scoped to a class
    pub fn schema(message: impl Into<String>, class: Option<&str>) -> Self {
        Error::Schema {
            message: message.into(),
            class: class.map(str::to_string),
        }
    }

    /// The error returned by a transform function, if this is one
    pub fn transform_source(&self) -> Option<&anyhow::Error> {
        match self {
            Error::TransformFunction { source, .. } => Some(source),
            _ => None,
        }
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

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Internal {
            message: err.to_string(),
            source: err,
        }
    }
}
