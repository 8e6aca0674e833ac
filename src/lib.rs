//! UML to JSON Schema converter
//!
//! Converts UML class models exported as XMI into one JSON Schema document per
//! class or component, plus an OpenAPI document indexing them.
//!
//! # Example
//!
//! ```
//! use uml_schema::{build_class_schema, ModelNode};
//!
//! let class = ModelNode::new("Class")
//!     .with_name("Persoon")
//!     .with_child(
//!         ModelNode::new("Property")
//!             .with_name("emailAddress")
//!             .with_attr("type", "Email")
//!             .with_attr("lowerBound", "1")
//!             .with_attr("upperBound", "1"),
//!     )
//!     .with_child(
//!         ModelNode::new("Property")
//!             .with_name("aliases")
//!             .with_attr("type", "String")
//!             .with_attr("upperBound", "*"),
//!     );
//!
//! let (name, schema) = build_class_schema(&class).unwrap();
//! assert_eq!(name, "Persoon");
//! assert_eq!(schema.required, vec!["emailAddress"]);
//!
//! let document = schema.to_document().unwrap();
//! assert_eq!(document["properties"]["emailAddress"]["format"], "email");
//! assert_eq!(document["properties"]["aliases"]["type"], "array");
//! assert_eq!(document["properties"]["aliases"]["minItems"], 0);
//! ```
//!
//! # Type Inference
//!
//! | Declared type | JSON Schema |
//! |---------------|-------------|
//! | contains `date`, not `time` | `string`, format `date` |
//! | contains `datetime` / `timestamp` | `string`, format `date-time` |
//! | contains `email` | `string`, format `email` |
//! | contains `uri` | `string`, format `uri` |
//! | contains `bsn` | `string`, pattern `^[0-9]{9}$` |
//! | contains `postcode` | `string`, pattern `^[1-9][0-9]{3}[A-Z]{2}$` |
//! | `integer`, `int` | `integer` |
//! | `double`, `float`, `decimal` | `number` |
//! | `boolean` | `boolean` |
//! | anything else | `string` |
//!
//! Attributes with an upper bound above one (or unbounded) become arrays with
//! the scalar form under `items`. A lower bound of one or more makes the
//! attribute required.

mod builder;
mod convert;
mod error;
mod inference;
mod loader;
mod model;
mod openapi;
mod property;
mod reader;
mod sanitize;
mod types;
mod validator;
mod walker;

pub use builder::{build_class_schema, display_name, ClassSchema, SchemaCollection};
pub use convert::{
    convert_model, convert_version_dir, discover_model_files, rebuild_api_document, write_json,
    Converter, FileReport, ModelConversion, RunReport, Skipped,
};
pub use error::{ConvertError, SchemaError, ValidateError};
pub use inference::{infer_type, JsonType, TypeInference};
pub use loader::{load_schema, load_schema_dir};
pub use model::{AttributeDescriptor, ModelNode};
pub use openapi::{
    assemble, assemble_documents, schema_reference, strip_version_prefix, version_from_dir,
    ApiDocument, ApiInfo, Components,
};
pub use property::{is_required, synthesize_property, PropertyDefinition};
pub use reader::{decode, model_container, parse_xmi, read_model_file};
pub use sanitize::sanitize_name;
pub use types::{
    Bound, ConvertOptions, SchemaMode, DEFAULT_DESCRIPTION, DEFAULT_TITLE, METADATA_KEY,
    OPENAPI_FILE, OPENAPI_VERSION, SCHEMAS_DIR, SCHEMA_DIALECT,
};
pub use validator::{check_schema, validate_payload};
pub use walker::{class_elements, ClassElements};
