//! Loading previously generated schema documents.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::ConvertError;
use crate::types::OPENAPI_FILE;

/// Load a JSON document from a file path.
///
/// # Errors
///
/// Returns `ConvertError::FileNotFound` if the file doesn't exist,
/// or `ConvertError::InvalidJson` if the file isn't valid JSON.
pub fn load_schema(path: &Path) -> Result<Value, ConvertError> {
    if !path.exists() {
        return Err(ConvertError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConvertError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| ConvertError::InvalidJson {
        path: path.to_path_buf(),
        source,
    })
}

/// Load every class schema in a schemas directory, keyed by title.
///
/// The aggregate `openapi.json` is ignored. Files that fail to load are
/// logged and skipped. Documents without a string `title` are keyed by
/// file stem.
///
/// # Errors
///
/// Returns `ConvertError::FileNotFound` if the directory doesn't exist or
/// `ConvertError::ReadError` if it cannot be listed.
pub fn load_schema_dir(dir: &Path) -> Result<Vec<(String, Value)>, ConvertError> {
    if !dir.is_dir() {
        return Err(ConvertError::FileNotFound {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|source| ConvertError::ReadError {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path.extension().map(|e| e == "json").unwrap_or(false)
                && path.file_name().map(|n| n != OPENAPI_FILE).unwrap_or(false)
        })
        .collect();
    files.sort();

    let mut schemas = Vec::new();
    for file in files {
        match load_schema(&file) {
            Ok(schema) => {
                let name = schema
                    .get("title")
                    .and_then(Value::as_str)
                    .map(String::from)
                    .or_else(|| {
                        file.file_stem()
                            .map(|stem| stem.to_string_lossy().into_owned())
                    })
                    .unwrap_or_default();
                tracing::info!(schema = %name, "loaded schema");
                schemas.push((name, schema));
            }
            Err(e) => {
                tracing::error!(path = %file.display(), error = %e, "skipping schema file");
            }
        }
    }

    Ok(schemas)
}
