//! Error types for the Algolia node.
//!
//! Every failure is reported through the `AlgoliaError` enum. Parameter
//! errors name the offending field by its path (`parent.child` for fields
//! nested inside a collection).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for catalog, request building and dispatch.
#[derive(Deserialize, Serialize, Error, Debug, Clone, PartialEq)]
pub enum AlgoliaError {
    /// A required field is absent or empty.
    #[error("missing required parameter '{0}'")]
    MissingParameter(String),

    /// A field value failed its kind, bounds, pattern or schema check.
    #[error("invalid parameter '{field}': {reason}")]
    InvalidParameter {
        field: String,
        reason: String,
    },

    /// A JSON field does not contain valid JSON text.
    #[error("parameter '{field}' is not valid JSON: {reason}")]
    MalformedJson {
        field: String,
        reason: String,
    },

    /// The resource/operation pair is not in the catalog.
    #[error("unknown operation '{operation}' for resource '{resource}'")]
    UnknownOperation {
        resource: String,
        operation: String,
    },

    /// Catalog definition errors.
    #[error("{0}")]
    Catalog(String),

    /// Configuration parsing or validation errors.
    #[error("{0}")]
    Config(String),

    /// Data conversion errors.
    #[error("{0}")]
    Convert(String),

    /// Transport-level failures (connection, timeout, invalid header).
    #[error("{0}")]
    Http(String),

    /// Non-2xx response from the Algolia API, body kept verbatim.
    #[error("status: {status}, body: {body}")]
    Api {
        status: u16,
        body: String,
    },

    /// Reading a file failed.
    #[error("{0}")]
    IoError(String),
}

impl AlgoliaError {
    pub(crate) fn invalid(
        field: &str,
        reason: impl Into<String>,
    ) -> Self {
        AlgoliaError::InvalidParameter {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for AlgoliaError {
    fn from(error: std::io::Error) -> Self {
        AlgoliaError::IoError(error.to_string())
    }
}

impl From<serde_json::Error> for AlgoliaError {
    fn from(error: serde_json::Error) -> Self {
        AlgoliaError::Convert(error.to_string())
    }
}

impl From<jsonschema::ValidationError<'_>> for AlgoliaError {
    fn from(error: jsonschema::ValidationError<'_>) -> Self {
        AlgoliaError::Convert(error.to_string())
    }
}

impl From<reqwest::Error> for AlgoliaError {
    fn from(error: reqwest::Error) -> Self {
        AlgoliaError::Http(error.to_string())
    }
}
