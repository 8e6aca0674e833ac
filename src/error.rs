//! Error types for model conversion and schema validation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors during model reading, schema synthesis and output.
#[derive(Debug, Error)]
pub enum ConvertError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Model errors (exit code 2)
    #[error("{path}: no supported encoding could decode the file")]
    Encoding { path: PathBuf },

    #[error("{path}: invalid XML: {message}")]
    InvalidXml { path: PathBuf, message: String },

    #[error("{path}: malformed model, missing {missing}")]
    MalformedModel { path: PathBuf, missing: String },

    #[error("cannot convert '{element}': {reason}")]
    ElementConversion { element: String, reason: String },

    #[error("invalid JSON in {path}: {source}")]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    // Empty run (exit code 1)
    #[error("no model files (*.xml, *.xmi) found in {path}")]
    NoModelFiles { path: PathBuf },

    #[error("no schemas produced from {path}")]
    NoSchemas { path: PathBuf },
}

impl ConvertError {
    /// Shorthand for a per-element failure.
    pub fn element(element: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ElementConversion {
            element: element.into(),
            reason: reason.into(),
        }
    }

    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::FileNotFound { .. } | Self::ReadError { .. } | Self::WriteError { .. } => 3,
            Self::NoModelFiles { .. } | Self::NoSchemas { .. } => 1,
            _ => 2,
        }
    }
}

/// Errors during validation of generated schemas or payloads.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error(transparent)]
    Load(#[from] ConvertError),

    #[error("invalid schema: {message}")]
    InvalidSchema { message: String },

    #[error("validation failed with {} error(s)", errors.len())]
    Invalid { errors: Vec<SchemaError> },
}

impl ValidateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ValidateError::Load(e) => e.exit_code(),
            ValidateError::InvalidSchema { .. } => 2,
            ValidateError::Invalid { .. } => 1,
        }
    }
}

/// Single validation error with path context.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SchemaError {
    /// JSON Pointer (RFC 6901) to the invalid field.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}
