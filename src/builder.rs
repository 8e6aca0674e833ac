//! Class schema construction and the per-run schema collection.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::error::ConvertError;
use crate::inference::JsonType;
use crate::model::{AttributeDescriptor, ModelNode};
use crate::property::{is_required, synthesize_property, PropertyDefinition};
use crate::types::{is_internal_tag, SCHEMA_DIALECT};

static CHAR_ESCAPES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&#[xX][0-9A-Fa-f]+;|&#[0-9]+;|&[A-Za-z][A-Za-z0-9]*;").unwrap());

/// JSON Schema document for one UML class or component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassSchema {
    pub title: String,
    pub description: String,
    /// Keyed by attribute name, in declaration order.
    pub properties: IndexMap<String, PropertyDefinition>,
    /// Always a subset of the `properties` keys.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    /// Class-level tagged values.
    #[serde(rename = "x-uml-metadata", skip_serializing_if = "Option::is_none")]
    pub metadata: Option<IndexMap<String, String>>,
}

#[derive(Serialize)]
struct SchemaDocument<'a> {
    #[serde(rename = "$schema")]
    dialect: &'static str,
    #[serde(rename = "type")]
    json_type: JsonType,
    #[serde(flatten)]
    schema: &'a ClassSchema,
}

impl ClassSchema {
    /// Render as a standalone draft-07 document.
    pub fn to_document(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(SchemaDocument {
            dialect: SCHEMA_DIALECT,
            json_type: JsonType::Object,
            schema: self,
        })
    }
}

/// Strip newlines and character escapes from a raw element name and
/// normalize its whitespace.
pub fn display_name(raw: &str) -> String {
    let unescaped = CHAR_ESCAPES.replace_all(raw, " ");
    unescaped
        .replace(['\r', '\n'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build the schema for one class-like element.
///
/// Returns the display name together with the schema. Association ends and
/// unnamed attributes are skipped; a later attribute with the same name
/// replaces the earlier one.
///
/// # Errors
///
/// Returns `ConvertError::ElementConversion` when the class has no name or
/// one of its attributes is malformed.
pub fn build_class_schema(node: &ModelNode) -> Result<(String, ClassSchema), ConvertError> {
    let name = display_name(&node.name);
    if name.is_empty() {
        return Err(ConvertError::element(
            format!("<unnamed {}>", node.kind),
            "element has no name",
        ));
    }

    let mut properties = IndexMap::new();
    let mut required_flags: IndexMap<String, bool> = IndexMap::new();

    for child in node.attribute_children() {
        let attr = AttributeDescriptor::from_node(child).map_err(|e| match e {
            ConvertError::ElementConversion { element, reason } => {
                ConvertError::element(&name, format!("attribute '{}': {}", element, reason))
            }
            other => other,
        })?;

        if attr.is_association_end {
            tracing::debug!(class = %name, attribute = %attr.name, "skipping association end");
            continue;
        }
        if attr.name.is_empty() {
            tracing::debug!(class = %name, "skipping unnamed attribute");
            continue;
        }

        let definition = synthesize_property(&attr);
        required_flags.insert(attr.name.clone(), is_required(&attr));
        properties.insert(attr.name, definition);
    }

    let required = properties
        .keys()
        .filter(|key| required_flags.get(*key).copied().unwrap_or(false))
        .cloned()
        .collect();

    let metadata: IndexMap<String, String> = node
        .tagged_values
        .iter()
        .filter(|(key, _)| !is_internal_tag(key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    let description = node
        .documentation()
        .map(String::from)
        .unwrap_or_else(|| format!("Generated from UML {} {}", node.kind, name));

    let schema = ClassSchema {
        title: name.clone(),
        description,
        properties,
        required,
        metadata: (!metadata.is_empty()).then_some(metadata),
    };

    Ok((name, schema))
}

/// Schemas accumulated during one run, keyed by display name.
///
/// Inserting an existing name replaces the earlier schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaCollection {
    schemas: IndexMap<String, ClassSchema>,
}

impl SchemaCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a schema, returning the one it replaced.
    pub fn insert(&mut self, name: String, schema: ClassSchema) -> Option<ClassSchema> {
        self.schemas.insert(name, schema)
    }

    pub fn get(&self, name: &str) -> Option<&ClassSchema> {
        self.schemas.get(name)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ClassSchema)> {
        self.schemas.iter()
    }

    /// Merge another collection into this one; entries from `other` win.
    pub fn merge(&mut self, other: SchemaCollection) {
        self.schemas.extend(other.schemas);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{KIND_CLASS, KIND_PROPERTY};
    use serde_json::json;

    fn property(name: &str, type_name: &str, lower: &str, upper: &str) -> ModelNode {
        ModelNode::new(KIND_PROPERTY)
            .with_name(name)
            .with_attr("type", type_name)
            .with_attr("lowerBound", lower)
            .with_attr("upperBound", upper)
    }

    #[test]
    fn display_name_strips_escapes_and_whitespace() {
        assert_eq!(display_name("  Natuurlijk\n  Persoon \r"), "Natuurlijk Persoon");
        assert_eq!(display_name("Adres&#10;Gegevens"), "Adres Gegevens");
        assert_eq!(display_name("Adres&#xA;&nbsp;Gegevens"), "Adres Gegevens");
        assert_eq!(display_name("A &amp; B"), "A B");
        assert_eq!(display_name(""), "");
    }

    #[test]
    fn builds_properties_and_required() {
        let class = ModelNode::new(KIND_CLASS)
            .with_name("Persoon")
            .with_child(property("emailAddress", "Email", "1", "1"))
            .with_child(property("aliases", "String", "0", "*"));

        let (name, schema) = build_class_schema(&class).unwrap();
        assert_eq!(name, "Persoon");
        assert_eq!(schema.title, "Persoon");
        assert_eq!(schema.required, vec!["emailAddress"]);
        assert_eq!(
            schema.properties.keys().collect::<Vec<_>>(),
            vec!["emailAddress", "aliases"]
        );
        assert!(schema.properties["aliases"].is_array());
        assert_eq!(schema.description, "Generated from UML Class Persoon");
        assert!(schema.metadata.is_none());
    }

    #[test]
    fn skips_association_ends_and_unnamed() {
        let class = ModelNode::new(KIND_CLASS)
            .with_name("Zaak")
            .with_child(property("", "String", "1", "1"))
            .with_child(property("behandelaar", "Medewerker", "1", "1").with_attr("association", "EAID_1"))
            .with_child(property("omschrijving", "String", "0", "1"));

        let (_, schema) = build_class_schema(&class).unwrap();
        assert_eq!(schema.properties.len(), 1);
        assert!(schema.properties.contains_key("omschrijving"));
        assert!(schema.required.is_empty());
    }

    #[test]
    fn duplicate_attribute_last_wins_without_dangling_required() {
        let class = ModelNode::new(KIND_CLASS)
            .with_name("Dubbel")
            .with_child(property("code", "Integer", "1", "1"))
            .with_child(property("code", "String", "0", "1"));

        let (_, schema) = build_class_schema(&class).unwrap();
        assert_eq!(schema.properties.len(), 1);
        assert_eq!(schema.properties["code"].json_type, JsonType::String);
        assert!(schema.required.is_empty());
    }

    #[test]
    fn required_is_subset_of_properties() {
        let class = ModelNode::new(KIND_CLASS)
            .with_name("Adres")
            .with_child(property("straat", "String", "1", "1"))
            .with_child(property("huisnummer", "Integer", "1", "1"))
            .with_child(property("toevoeging", "String", "0", "1"))
            .with_child(property("straat", "String", "1", "1"));

        let (_, schema) = build_class_schema(&class).unwrap();
        assert_eq!(schema.required, vec!["straat", "huisnummer"]);
        for name in &schema.required {
            assert!(schema.properties.contains_key(name));
        }
    }

    #[test]
    fn class_metadata_and_documentation() {
        let class = ModelNode::new(KIND_CLASS)
            .with_name("Gebouw")
            .with_tag("documentation", "Een bouwwerk")
            .with_tag("ea_guid", "{ABC}")
            .with_tag("bron", "BAG");

        let (_, schema) = build_class_schema(&class).unwrap();
        assert_eq!(schema.description, "Een bouwwerk");
        let metadata = schema.metadata.unwrap();
        assert_eq!(metadata.len(), 1);
        assert_eq!(metadata["bron"], "BAG");
    }

    #[test]
    fn unnamed_class_is_an_element_error() {
        let class = ModelNode::new(KIND_CLASS).with_name(" &#10; ");
        let err = build_class_schema(&class).unwrap_err();
        assert!(matches!(err, ConvertError::ElementConversion { .. }));
    }

    #[test]
    fn malformed_attribute_fails_the_class() {
        let class = ModelNode::new(KIND_CLASS)
            .with_name("Kapot")
            .with_child(property("x", "String", "0", "veel"));

        match build_class_schema(&class).unwrap_err() {
            ConvertError::ElementConversion { element, reason } => {
                assert_eq!(element, "Kapot");
                assert!(reason.contains("attribute 'x'"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn document_shape() {
        let class = ModelNode::new(KIND_CLASS)
            .with_name("Persoon")
            .with_tag("bron", "BRP")
            .with_child(property("bsn", "BSN", "1", "1"));

        let (_, schema) = build_class_schema(&class).unwrap();
        let doc = schema.to_document().unwrap();

        assert_eq!(
            doc,
            json!({
                "$schema": "http://json-schema.org/draft-07/schema#",
                "type": "object",
                "title": "Persoon",
                "description": "Generated from UML Class Persoon",
                "properties": {
                    "bsn": {
                        "type": "string",
                        "pattern": "^[0-9]{9}$",
                        "description": "UML attribute bsn"
                    }
                },
                "required": ["bsn"],
                "x-uml-metadata": { "bron": "BRP" }
            })
        );
    }

    #[test]
    fn document_omits_empty_required_and_metadata() {
        let class = ModelNode::new(KIND_CLASS).with_name("Leeg");
        let (_, schema) = build_class_schema(&class).unwrap();
        let doc = schema.to_document().unwrap();

        assert!(doc.get("required").is_none());
        assert!(doc.get(crate::types::METADATA_KEY).is_none());
        assert_eq!(doc["properties"], json!({}));
    }

    #[test]
    fn collection_last_write_wins() {
        let mut collection = SchemaCollection::new();
        let (name, first) =
            build_class_schema(&ModelNode::new(KIND_CLASS).with_name("Persoon")).unwrap();
        let (_, second) = build_class_schema(
            &ModelNode::new(KIND_CLASS)
                .with_name("Persoon")
                .with_child(property("naam", "String", "0", "1")),
        )
        .unwrap();

        assert!(collection.insert(name.clone(), first.clone()).is_none());
        assert_eq!(collection.insert(name.clone(), second.clone()), Some(first));
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.get("Persoon"), Some(&second));
    }

    #[test]
    fn collection_merge() {
        let mut a = SchemaCollection::new();
        let mut b = SchemaCollection::new();
        let (n1, s1) = build_class_schema(&ModelNode::new(KIND_CLASS).with_name("A")).unwrap();
        let (n2, s2) = build_class_schema(&ModelNode::new(KIND_CLASS).with_name("B")).unwrap();
        a.insert(n1, s1);
        b.insert(n2, s2);
        a.merge(b);
        assert_eq!(a.len(), 2);
    }
}
