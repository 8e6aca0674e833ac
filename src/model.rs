//! Generic model tree produced by the reader.
//!
//! Every stage after parsing works on [`ModelNode`] only, so the walker and
//! builders never care how the model was serialized.

use indexmap::IndexMap;

use crate::error::ConvertError;
use crate::types::Bound;

pub const KIND_PACKAGE: &str = "Package";
pub const KIND_CLASS: &str = "Class";
pub const KIND_COMPONENT: &str = "Component";
pub const KIND_PROPERTY: &str = "Property";

/// One element of a parsed model file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelNode {
    /// Element kind, e.g. "Package", "Class", "Property".
    pub kind: String,
    /// Display name as written by the modeling tool.
    pub name: String,
    pub attributes: IndexMap<String, String>,
    /// Child elements in document order.
    pub children: Vec<ModelNode>,
    /// Free-form key/value annotations attached by the modeling tool.
    pub tagged_values: IndexMap<String, String>,
}

impl ModelNode {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tagged_values.insert(key.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: ModelNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tagged_values.get(key).map(String::as_str)
    }

    /// First child of the given kind.
    pub fn child(&self, kind: &str) -> Option<&ModelNode> {
        self.children.iter().find(|c| c.kind == kind)
    }

    pub fn is_package(&self) -> bool {
        self.kind == KIND_PACKAGE
    }

    pub fn is_attribute(&self) -> bool {
        self.kind == KIND_PROPERTY
    }

    pub fn attribute_children(&self) -> impl Iterator<Item = &ModelNode> {
        self.children.iter().filter(|c| c.is_attribute())
    }

    /// A class or component that owns at least one attribute.
    pub fn is_class_like(&self) -> bool {
        matches!(self.kind.as_str(), KIND_CLASS | KIND_COMPONENT)
            && self.attribute_children().next().is_some()
    }

    /// Non-empty `documentation` tagged value.
    pub fn documentation(&self) -> Option<&str> {
        self.tag("documentation")
            .map(str::trim)
            .filter(|doc| !doc.is_empty())
    }
}

/// Tool-specific prefixes on primitive type ids.
const TYPE_ID_PREFIXES: &[&str] = &["EAJava_", "EAnone_", "EAC_"];

/// View of one attribute element, computed on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDescriptor {
    pub name: String,
    /// Declared type name as written; matched case-insensitively.
    pub type_name: String,
    pub lower_bound: Bound,
    pub upper_bound: Bound,
    /// Explicit required flag, independent of bounds.
    pub is_required: bool,
    /// The attribute denotes a relationship to another class.
    pub is_association_end: bool,
    pub tagged_values: IndexMap<String, String>,
}

impl AttributeDescriptor {
    /// Derive a descriptor from a `Property` node.
    ///
    /// # Errors
    ///
    /// Returns `ConvertError::ElementConversion` when a multiplicity bound
    /// is neither a count nor an unbounded marker.
    pub fn from_node(node: &ModelNode) -> Result<Self, ConvertError> {
        let name = node.name.trim().to_string();
        let lower_bound = read_bound(node, "lowerBound", "lowerValue", Bound::Count(0))?;
        let upper_bound = read_bound(node, "upperBound", "upperValue", Bound::Count(1))?;

        let is_required = node.attr("isRequired") == Some("true")
            || node
                .tag("required")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "1"))
                .unwrap_or(false);

        let is_association_end = node
            .attr("association")
            .map(|a| !a.is_empty())
            .unwrap_or(false);

        Ok(Self {
            name,
            type_name: type_name(node),
            lower_bound,
            upper_bound,
            is_required,
            is_association_end,
            tagged_values: node.tagged_values.clone(),
        })
    }
}

fn read_bound(
    node: &ModelNode,
    attr_key: &str,
    child_kind: &str,
    default: Bound,
) -> Result<Bound, ConvertError> {
    let raw = node
        .attr(attr_key)
        .or_else(|| node.child(child_kind).and_then(|c| c.attr("value")));

    match raw.map(str::trim) {
        None | Some("") => Ok(default),
        Some(value) => Bound::parse(value).ok_or_else(|| {
            ConvertError::element(
                node.name.trim(),
                format!("invalid {} '{}'", attr_key, value),
            )
        }),
    }
}

fn type_name(node: &ModelNode) -> String {
    if let Some(t) = node.attr("type").filter(|t| !t.is_empty()) {
        return strip_type_prefix(t).to_string();
    }

    let Some(type_node) = node.child("type") else {
        return String::new();
    };

    if !type_node.name.is_empty() {
        return type_node.name.clone();
    }
    if let Some(fragment) = type_node
        .attr("href")
        .and_then(|href| href.rsplit_once('#'))
        .map(|(_, fragment)| fragment)
    {
        return fragment.to_string();
    }
    type_node
        .attr("xmi:idref")
        .map(|idref| strip_type_prefix(idref).to_string())
        .unwrap_or_default()
}

fn strip_type_prefix(id: &str) -> &str {
    TYPE_ID_PREFIXES
        .iter()
        .find_map(|prefix| id.strip_prefix(prefix))
        .unwrap_or(id)
}
