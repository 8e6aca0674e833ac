//! Aggregate OpenAPI document over a set of class schemas.

use std::path::Path;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{json, Value};

use crate::builder::SchemaCollection;
use crate::sanitize::sanitize_name;
use crate::types::{ConvertOptions, SchemaMode, OPENAPI_VERSION, SCHEMAS_DIR};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiInfo {
    pub title: String,
    pub version: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Components {
    pub schemas: IndexMap<String, Value>,
}

/// OpenAPI 3.0 index document. `paths` is always empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiDocument {
    pub openapi: String,
    pub info: ApiInfo,
    pub paths: IndexMap<String, Value>,
    pub components: Components,
}

/// Strip one leading `v`/`V` from a version folder name.
pub fn strip_version_prefix(version: &str) -> &str {
    version.strip_prefix(['v', 'V']).unwrap_or(version)
}

/// Version identifier of a version directory (its final path component).
pub fn version_from_dir(dir: &Path) -> String {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .or_else(|| {
            dir.canonicalize()
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        })
        .unwrap_or_default();
    strip_version_prefix(&name).to_string()
}

/// Textual `$ref` to the per-class file of a schema.
pub fn schema_reference(display_name: &str) -> Value {
    json!({ "$ref": format!("./{}/{}.json", SCHEMAS_DIR, sanitize_name(display_name)) })
}

/// Assemble the API document from a populated collection.
///
/// # Errors
///
/// Returns a serialization error if a schema cannot be rendered in embed mode.
pub fn assemble(
    collection: &SchemaCollection,
    version: &str,
    options: &ConvertOptions,
) -> Result<ApiDocument, serde_json::Error> {
    let schemas: IndexMap<String, Value> = match options.mode {
        SchemaMode::Embed => collection
            .iter()
            .map(|(name, schema)| Ok((name.clone(), schema.to_document()?)))
            .collect::<Result<_, serde_json::Error>>()?,
        SchemaMode::Reference => collection
            .iter()
            .map(|(name, _)| (name.clone(), schema_reference(name)))
            .collect(),
    };

    Ok(api_document(schemas, version, options))
}

/// Assemble the API document from named schema documents.
pub fn assemble_documents(
    documents: impl IntoIterator<Item = (String, Value)>,
    version: &str,
    options: &ConvertOptions,
) -> ApiDocument {
    let schemas: IndexMap<String, Value> = match options.mode {
        SchemaMode::Embed => documents.into_iter().collect(),
        SchemaMode::Reference => documents
            .into_iter()
            .map(|(name, _)| {
                let reference = schema_reference(&name);
                (name, reference)
            })
            .collect(),
    };

    api_document(schemas, version, options)
}

fn api_document(
    schemas: IndexMap<String, Value>,
    version: &str,
    options: &ConvertOptions,
) -> ApiDocument {
    ApiDocument {
        openapi: OPENAPI_VERSION.to_string(),
        info: ApiInfo {
            title: options.title.clone(),
            version: strip_version_prefix(version).to_string(),
            description: options.description.clone(),
        },
        paths: IndexMap::new(),
        components: Components { schemas },
    }
}
