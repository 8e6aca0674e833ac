//! Core types shared by the conversion stages.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// JSON Schema dialect written into every class schema.
pub const SCHEMA_DIALECT: &str = "http://json-schema.org/draft-07/schema#";

/// OpenAPI version of the aggregate document.
pub const OPENAPI_VERSION: &str = "3.0.0";

/// Vendor extension key carrying tagged values.
pub const METADATA_KEY: &str = "x-uml-metadata";

/// File name of the aggregate document inside the schemas directory.
pub const OPENAPI_FILE: &str = "openapi.json";

/// Name of the output directory inside a version directory.
pub const SCHEMAS_DIR: &str = "schemas";

/// Tagged-value keys that are tool bookkeeping, not model metadata.
pub const INTERNAL_TAG_KEYS: &[&str] = &[
    "documentation",
    "specification",
    "scope",
    "ea_guid",
    "ea_localid",
    "ea_sourceName",
    "ea_targetName",
    "styleex",
    "$ea_xref_property",
];

pub const DEFAULT_TITLE: &str = "Gemeentelijk Gegevensmodel API";
pub const DEFAULT_DESCRIPTION: &str = "Generated from UML models";

/// One end of a multiplicity range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Count(u64),
    Unbounded,
}

impl Bound {
    /// Parse a bound as written by modeling tools.
    ///
    /// Returns `None` for values that are neither a count nor an unbounded marker.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        match s {
            "*" | "-1" | "n" | "unbounded" => Some(Bound::Unbounded),
            _ => s.parse().ok().map(Bound::Count),
        }
    }

    /// True when more than one value is allowed.
    pub fn is_many(&self) -> bool {
        match self {
            Bound::Unbounded => true,
            Bound::Count(n) => *n > 1,
        }
    }

    pub fn count(&self) -> Option<u64> {
        match self {
            Bound::Count(n) => Some(*n),
            Bound::Unbounded => None,
        }
    }
}

/// How class schemas appear under `components.schemas` of the API document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaMode {
    /// Full schema bodies are embedded.
    #[default]
    Embed,
    /// `$ref` entries pointing at the per-class files.
    Reference,
}

impl SchemaMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "embed" => Some(SchemaMode::Embed),
            "reference" | "ref" => Some(SchemaMode::Reference),
            _ => None,
        }
    }
}

/// Options for one conversion run.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub mode: SchemaMode,
    /// `info.title` of the API document.
    pub title: String,
    /// `info.description` of the API document.
    pub description: String,
    /// Where schemas are written; defaults to `<version-dir>/schemas`.
    pub output_dir: Option<PathBuf>,
    /// Indent output JSON.
    pub pretty: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            mode: SchemaMode::Embed,
            title: DEFAULT_TITLE.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            output_dir: None,
            pretty: true,
        }
    }
}

impl ConvertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(mut self, mode: SchemaMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

/// True for tagged values that are tool bookkeeping.
pub fn is_internal_tag(key: &str) -> bool {
    INTERNAL_TAG_KEYS.contains(&key)
}
