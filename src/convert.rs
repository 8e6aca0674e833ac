//! Conversion runs: model files in, schema files and the API document out.
//!
//! Failures are contained at the smallest unit that can be skipped: a bad
//! class never stops its file, a bad file never stops the run. Only a run
//! that writes no schema at all is an error.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::builder::{build_class_schema, ClassSchema, SchemaCollection};
use crate::error::ConvertError;
use crate::loader::load_schema_dir;
use crate::model::ModelNode;
use crate::openapi::{assemble, assemble_documents, version_from_dir};
use crate::reader::{model_container, read_model_file};
use crate::sanitize::sanitize_name;
use crate::types::{ConvertOptions, OPENAPI_FILE, SCHEMAS_DIR};
use crate::validator::check_schema;
use crate::walker::class_elements;

const MODEL_EXTENSIONS: &[&str] = &["xml", "xmi"];

/// An element or file left out of the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skipped {
    pub name: String,
    pub reason: String,
}

/// Outcome of converting one model file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    /// Display names of the classes written.
    pub converted: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<Skipped>,
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub version: String,
    pub files: Vec<FileReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped_files: Vec<Skipped>,
    pub schemas_written: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub write_failures: Vec<Skipped>,
    pub api_document: Option<PathBuf>,
}

impl RunReport {
    pub fn classes_skipped(&self) -> usize {
        self.files.iter().map(|f| f.skipped.len()).sum()
    }
}

/// Schemas converted from one model, plus the classes that failed.
#[derive(Debug, Default)]
pub struct ModelConversion {
    pub schemas: Vec<(String, ClassSchema)>,
    pub failures: Vec<ConvertError>,
}

/// Convert every class-like element below a model container.
///
/// Pure: nothing is written. Each schema is checked to compile as JSON
/// Schema; a class that fails any step ends up in `failures`.
pub fn convert_model(model: &ModelNode) -> ModelConversion {
    let mut conversion = ModelConversion::default();

    for class in class_elements(model) {
        match build_class_schema(class).and_then(checked) {
            Ok(converted) => conversion.schemas.push(converted),
            Err(e) => conversion.failures.push(e),
        }
    }

    conversion
}

fn checked((name, schema): (String, ClassSchema)) -> Result<(String, ClassSchema), ConvertError> {
    let document = schema
        .to_document()
        .map_err(|e| ConvertError::element(&name, e.to_string()))?;
    check_schema(&document).map_err(|e| ConvertError::element(&name, e.to_string()))?;
    Ok((name, schema))
}

/// Model files directly inside a version directory, sorted by path.
///
/// # Errors
///
/// Returns `ConvertError::FileNotFound` if `dir` is not a directory, or
/// `ConvertError::ReadError` if it cannot be listed.
pub fn discover_model_files(dir: &Path) -> Result<Vec<PathBuf>, ConvertError> {
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
        .filter(|path| path.is_file() && is_model_file(path))
        .collect();
    files.sort();
    Ok(files)
}

fn is_model_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| MODEL_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Drives one conversion run for a version directory.
#[derive(Debug)]
pub struct Converter {
    options: ConvertOptions,
    version_dir: PathBuf,
    output_dir: PathBuf,
    collection: SchemaCollection,
    /// Output file → display name that last wrote it.
    file_owners: HashMap<PathBuf, String>,
    report: RunReport,
}

impl Converter {
    /// Prepare a run, creating the output directory.
    ///
    /// # Errors
    ///
    /// Returns `ConvertError::WriteError` if the output directory cannot be created.
    pub fn new(version_dir: &Path, options: ConvertOptions) -> Result<Self, ConvertError> {
        let output_dir = options
            .output_dir
            .clone()
            .unwrap_or_else(|| version_dir.join(SCHEMAS_DIR));

        std::fs::create_dir_all(&output_dir).map_err(|source| ConvertError::WriteError {
            path: output_dir.clone(),
            source,
        })?;

        Ok(Self {
            options,
            version_dir: version_dir.to_path_buf(),
            output_dir,
            collection: SchemaCollection::new(),
            file_owners: HashMap::new(),
            report: RunReport {
                version: version_from_dir(version_dir),
                ..RunReport::default()
            },
        })
    }

    pub fn collection(&self) -> &SchemaCollection {
        &self.collection
    }

    pub fn report(&self) -> &RunReport {
        &self.report
    }

    /// Convert one model file, recording a skip instead of failing.
    pub fn process_file(&mut self, path: &Path) {
        tracing::info!(path = %path.display(), "processing file");

        match self.convert_file(path) {
            Ok(file_report) => {
                tracing::info!(
                    path = %path.display(),
                    converted = file_report.converted.len(),
                    skipped = file_report.skipped.len(),
                    "file done"
                );
                self.report.files.push(file_report);
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping file");
                self.report.skipped_files.push(Skipped {
                    name: path.display().to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }

    /// Convert one model file and write its class schemas.
    ///
    /// # Errors
    ///
    /// Returns file-level errors (unreadable, undecodable, malformed). Class
    /// and write failures are recorded in the returned report instead.
    pub fn convert_file(&mut self, path: &Path) -> Result<FileReport, ConvertError> {
        let root = read_model_file(path)?;
        let model = model_container(&root, path)?;
        let conversion = convert_model(model);

        let mut file_report = FileReport {
            path: path.to_path_buf(),
            ..FileReport::default()
        };

        for failure in conversion.failures {
            tracing::warn!(path = %path.display(), error = %failure, "skipping class");
            let name = match &failure {
                ConvertError::ElementConversion { element, .. } => element.clone(),
                _ => String::new(),
            };
            file_report.skipped.push(Skipped {
                name,
                reason: failure.to_string(),
            });
        }

        for (name, schema) in conversion.schemas {
            if self.write_class(&name, &schema) {
                if self.collection.insert(name.clone(), schema).is_some() {
                    tracing::warn!(class = %name, "duplicate class name, last definition wins");
                }
                tracing::info!(class = %name, "generated schema");
                file_report.converted.push(name);
            }
        }

        Ok(file_report)
    }

    fn write_class(&mut self, name: &str, schema: &ClassSchema) -> bool {
        let file = self.output_dir.join(format!("{}.json", sanitize_name(name)));

        let result = schema
            .to_document()
            .map_err(|e| ConvertError::WriteError {
                path: file.clone(),
                source: e.into(),
            })
            .and_then(|document| write_json(&file, &document, self.options.pretty));

        if let Err(e) = result {
            tracing::error!(class = %name, error = %e, "failed to write schema");
            self.report.write_failures.push(Skipped {
                name: name.to_string(),
                reason: e.to_string(),
            });
            return false;
        }

        if let Some(previous) = self.file_owners.insert(file.clone(), name.to_string()) {
            if previous != name {
                tracing::warn!(
                    file = %file.display(),
                    previous = %previous,
                    class = %name,
                    "schema file name collision, overwritten"
                );
            }
        }
        if !self.report.schemas_written.contains(&file) {
            self.report.schemas_written.push(file);
        }
        true
    }

    /// Write the API document and return the run report.
    ///
    /// # Errors
    ///
    /// Returns `ConvertError::NoSchemas` if nothing was written during the run,
    /// or `ConvertError::WriteError` if the API document cannot be written.
    pub fn finish(mut self) -> Result<RunReport, ConvertError> {
        if self.report.schemas_written.is_empty() {
            return Err(ConvertError::NoSchemas {
                path: self.version_dir,
            });
        }

        let api_path = self.output_dir.join(OPENAPI_FILE);
        let document = assemble(&self.collection, &self.report.version, &self.options)
            .map_err(|e| ConvertError::WriteError {
                path: api_path.clone(),
                source: e.into(),
            })?;
        write_json(&api_path, &document, self.options.pretty)?;

        tracing::info!(
            schemas = self.collection.len(),
            path = %api_path.display(),
            "saved schemas and OpenAPI specification"
        );
        self.report.api_document = Some(api_path);
        Ok(self.report)
    }
}

/// Convert every model file in a version directory.
///
/// # Errors
///
/// Returns `ConvertError::NoModelFiles` when the directory holds no model
/// files, `ConvertError::NoSchemas` when nothing could be converted, and IO
/// errors for the output directory or the API document.
pub fn convert_version_dir(
    version_dir: &Path,
    options: ConvertOptions,
) -> Result<RunReport, ConvertError> {
    let files = discover_model_files(version_dir)?;
    if files.is_empty() {
        return Err(ConvertError::NoModelFiles {
            path: version_dir.to_path_buf(),
        });
    }

    let mut converter = Converter::new(version_dir, options)?;
    for file in &files {
        converter.process_file(file);
    }
    converter.finish()
}

/// Rebuild the API document from schema files already on disk.
///
/// # Errors
///
/// Returns `ConvertError::NoSchemas` if the schemas directory holds no class
/// schemas, and IO errors for reading or writing.
pub fn rebuild_api_document(
    version_dir: &Path,
    options: &ConvertOptions,
) -> Result<PathBuf, ConvertError> {
    let schema_dir = options
        .output_dir
        .clone()
        .unwrap_or_else(|| version_dir.join(SCHEMAS_DIR));

    let documents = load_schema_dir(&schema_dir)?;
    if documents.is_empty() {
        return Err(ConvertError::NoSchemas { path: schema_dir });
    }

    let count = documents.len();
    let document = assemble_documents(documents, &version_from_dir(version_dir), options);
    let api_path = schema_dir.join(OPENAPI_FILE);
    write_json(&api_path, &document, options.pretty)?;

    tracing::info!(schemas = count, path = %api_path.display(), "saved OpenAPI specification");
    Ok(api_path)
}

/// Serialize and write a JSON document.
///
/// # Errors
///
/// Returns `ConvertError::WriteError` on serialization or IO failure.
pub fn write_json<T: Serialize>(path: &Path, value: &T, pretty: bool) -> Result<(), ConvertError> {
    let output = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| ConvertError::WriteError {
        path: path.to_path_buf(),
        source: e.into(),
    })?;

    std::fs::write(path, output).map_err(|source| ConvertError::WriteError {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{KIND_CLASS, KIND_PACKAGE, KIND_PROPERTY};
    use std::fs;
    use tempfile::tempdir;

    fn property(name: &str, upper: &str) -> ModelNode {
        ModelNode::new(KIND_PROPERTY)
            .with_name(name)
            .with_attr("upperBound", upper)
    }

    #[test]
    fn convert_model_contains_bad_class() {
        let model = ModelNode::new("Model").with_child(
            ModelNode::new(KIND_PACKAGE)
                .with_child(ModelNode::new(KIND_CLASS).with_name("Goed").with_child(property("a", "1")))
                .with_child(ModelNode::new(KIND_CLASS).with_name("Fout").with_child(property("b", "x")))
                .with_child(ModelNode::new(KIND_CLASS).with_name("OokGoed").with_child(property("c", "*")))
                .with_child(ModelNode::new(KIND_CLASS).with_name("Leeg")),
        );

        let conversion = convert_model(&model);
        let names: Vec<&str> = conversion.schemas.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Goed", "OokGoed"]);
        assert_eq!(conversion.failures.len(), 1);
    }

    #[test]
    fn discovers_xml_and_xmi_sorted() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.XMI"), "").unwrap();
        fs::write(dir.path().join("a.xml"), "").unwrap();
        fs::write(dir.path().join("readme.md"), "").unwrap();
        fs::create_dir(dir.path().join("nested.xml")).unwrap();

        let files = discover_model_files(dir.path()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|f| f.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.xml", "b.XMI"]);
    }

    #[test]
    fn discover_missing_dir() {
        let err = discover_model_files(Path::new("/nonexistent/v1.0")).unwrap_err();
        assert!(matches!(err, ConvertError::FileNotFound { .. }));
    }

    #[test]
    fn empty_dir_has_no_model_files() {
        let dir = tempdir().unwrap();
        let err = convert_version_dir(dir.path(), ConvertOptions::new()).unwrap_err();
        assert!(matches!(err, ConvertError::NoModelFiles { .. }));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn write_json_compact_and_pretty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.json");
        let value = serde_json::json!({ "naam": "Café" });

        write_json(&path, &value, false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"naam":"Café"}"#);

        write_json(&path, &value, true).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{\n  \"naam\": \"Café\"\n}");
    }

    #[test]
    fn write_json_into_missing_dir_fails() {
        let err = write_json(Path::new("/nonexistent/dir/out.json"), &1, true).unwrap_err();
        assert!(matches!(err, ConvertError::WriteError { .. }));
        assert_eq!(err.exit_code(), 3);
    }
}
