//! Per-attribute JSON Schema property synthesis.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::inference::{infer_type, JsonType};
use crate::model::AttributeDescriptor;
use crate::types::{is_internal_tag, Bound};

/// JSON Schema fragment for one attribute.
///
/// Multi-valued attributes are an `array` wrapping the scalar form in
/// `items`; arrays never nest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    #[serde(rename = "type")]
    pub json_type: JsonType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<PropertyDefinition>>,
    #[serde(rename = "minItems", skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    /// Attribute tagged values; informational only.
    #[serde(
        rename = "x-uml-metadata",
        default,
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub metadata: IndexMap<String, String>,
}

impl PropertyDefinition {
    pub fn is_array(&self) -> bool {
        self.json_type == JsonType::Array
    }
}

/// Build the property definition for one attribute.
pub fn synthesize_property(attr: &AttributeDescriptor) -> PropertyDefinition {
    let inferred = infer_type(&attr.type_name);
    let description = attr
        .tagged_values
        .get("documentation")
        .map(|doc| doc.trim())
        .filter(|doc| !doc.is_empty())
        .map(String::from)
        .unwrap_or_else(|| format!("UML attribute {}", attr.name));

    let scalar = PropertyDefinition {
        json_type: inferred.json_type,
        format: inferred.format.map(String::from),
        pattern: inferred.pattern.map(String::from),
        description: description.clone(),
        items: None,
        min_items: None,
        metadata: IndexMap::new(),
    };

    let metadata = attribute_metadata(attr);

    if attr.upper_bound.is_many() {
        PropertyDefinition {
            json_type: JsonType::Array,
            format: None,
            pattern: None,
            description,
            items: Some(Box::new(scalar)),
            min_items: Some(attr.lower_bound.count().unwrap_or(0)),
            metadata,
        }
    } else {
        PropertyDefinition { metadata, ..scalar }
    }
}

/// Whether the attribute lands in the owning schema's `required` list.
pub fn is_required(attr: &AttributeDescriptor) -> bool {
    attr.is_required || matches!(attr.lower_bound, Bound::Count(n) if n > 0)
}

fn attribute_metadata(attr: &AttributeDescriptor) -> IndexMap<String, String> {
    attr.tagged_values
        .iter()
        .filter(|(key, _)| !is_internal_tag(key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
