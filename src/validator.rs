//! JSON Schema checks for generated documents and payloads.

use serde_json::Value;

use crate::error::{SchemaError, ValidateError};

/// Check that a generated document compiles as a JSON Schema.
///
/// # Errors
///
/// Returns `ValidateError::InvalidSchema` if the document is rejected.
pub fn check_schema(schema: &Value) -> Result<(), ValidateError> {
    jsonschema::validator_for(schema)
        .map(|_| ())
        .map_err(|e| ValidateError::InvalidSchema {
            message: e.to_string(),
        })
}

/// Validate a payload against a generated class schema.
///
/// All errors are collected, each with its JSON Pointer.
///
/// # Errors
///
/// Returns `ValidateError::InvalidSchema` if the schema does not compile, or
/// `ValidateError::Invalid` if the payload doesn't match.
pub fn validate_payload(schema: &Value, payload: &Value) -> Result<(), ValidateError> {
    let validator = jsonschema::validator_for(schema).map_err(|e| ValidateError::InvalidSchema {
        message: e.to_string(),
    })?;

    let errors: Vec<SchemaError> = validator
        .iter_errors(payload)
        .map(|e| SchemaError {
            path: e.instance_path.to_string(),
            message: e.to_string(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidateError::Invalid { errors })
    }
}
