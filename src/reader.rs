//! Model file reading: encoding detection and XMI parsing into [`ModelNode`] trees.
//!
//! Modeling tools commonly export XMI in windows-1252. UTF-8 is tried first,
//! then the legacy encoding. Tagged values that the tool stores in its
//! `xmi:Extension` section are attached to the elements they describe.

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;

use indexmap::IndexMap;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::ConvertError;
use crate::model::{ModelNode, KIND_PROPERTY};

/// Tags whose element kind comes from `xmi:type` instead of the tag name.
const CONTAINMENT_TAGS: &[&str] = &[
    "packagedElement",
    "ownedAttribute",
    "ownedMember",
    "ownedElement",
    "nestedClassifier",
];

const ROOT_KIND: &str = "XMI";
const MODEL_KIND: &str = "Model";
const EXTENSION_KIND: &str = "Extension";

/// Read, decode and parse a model file.
///
/// # Errors
///
/// Returns `ConvertError::FileNotFound`/`ReadError` for IO failures,
/// `ConvertError::Encoding` if the bytes cannot be decoded and
/// `ConvertError::InvalidXml` if parsing fails.
pub fn read_model_file(path: &Path) -> Result<ModelNode, ConvertError> {
    if !path.exists() {
        return Err(ConvertError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let bytes = std::fs::read(path).map_err(|source| ConvertError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    let text = decode(&bytes, path)?;
    parse_xmi(&text, path)
}

/// Decode file bytes as UTF-8, falling back to windows-1252.
///
/// # Errors
///
/// Returns `ConvertError::Encoding` if neither encoding decodes cleanly.
pub fn decode<'a>(bytes: &'a [u8], path: &Path) -> Result<Cow<'a, str>, ConvertError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok(Cow::Borrowed(text));
    }

    tracing::debug!(path = %path.display(), "not valid UTF-8, trying windows-1252");
    encoding_rs::WINDOWS_1252
        .decode_without_bom_handling_and_without_replacement(bytes)
        .ok_or_else(|| ConvertError::Encoding {
            path: path.to_path_buf(),
        })
}

/// Parse XMI text into a generic tree rooted at the document element.
///
/// # Errors
///
/// Returns `ConvertError::InvalidXml` on syntax errors or a truncated
/// document, and `ConvertError::MalformedModel` when there is no root element.
pub fn parse_xmi(text: &str, path: &Path) -> Result<ModelNode, ConvertError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<ModelNode> = Vec::new();
    let mut root: Option<ModelNode> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                stack.push(element_node(&e, path)?);
            }
            Ok(Event::Empty(e)) => {
                let node = element_node(&e, path)?;
                attach(node, &mut stack, &mut root);
            }
            Ok(Event::End(_)) => {
                if let Some(node) = stack.pop() {
                    attach(node, &mut stack, &mut root);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ConvertError::InvalidXml {
                    path: path.to_path_buf(),
                    message: format!("at position {}: {e}", reader.error_position()),
                });
            }
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(ConvertError::InvalidXml {
            path: path.to_path_buf(),
            message: format!("unexpected end of document inside <{}>", stack[0].kind),
        });
    }

    let mut root = root.ok_or_else(|| ConvertError::MalformedModel {
        path: path.to_path_buf(),
        missing: "root element".to_string(),
    })?;

    let mut names = HashMap::new();
    collect_names(&root, &mut names);
    let mut tags = HashMap::new();
    collect_extension_tags(&root, &mut tags);
    resolve(&mut root, &names, &mut tags);

    Ok(root)
}

/// Check the minimal document shape and return the model container.
///
/// # Errors
///
/// Returns `ConvertError::MalformedModel` naming the missing element.
pub fn model_container<'a>(root: &'a ModelNode, path: &Path) -> Result<&'a ModelNode, ConvertError> {
    if root.kind != ROOT_KIND {
        return Err(ConvertError::MalformedModel {
            path: path.to_path_buf(),
            missing: "xmi:XMI root element".to_string(),
        });
    }

    root.child(MODEL_KIND)
        .ok_or_else(|| ConvertError::MalformedModel {
            path: path.to_path_buf(),
            missing: "uml:Model".to_string(),
        })
}

fn attach(node: ModelNode, stack: &mut [ModelNode], root: &mut Option<ModelNode>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => {
            if root.is_none() {
                *root = Some(node);
            }
        }
    }
}

fn element_node(e: &BytesStart<'_>, path: &Path) -> Result<ModelNode, ConvertError> {
    let xml_error = |message: String| ConvertError::InvalidXml {
        path: path.to_path_buf(),
        message,
    };

    let qname = e.name();
    let tag = std::str::from_utf8(qname.as_ref())
        .map_err(|err| xml_error(format!("invalid tag name: {err}")))?;

    let mut attributes = IndexMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| xml_error(format!("attribute error in <{tag}>: {err}")))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|err| xml_error(format!("attribute key error in <{tag}>: {err}")))?
            .to_string();
        // Tools emit HTML entities XML does not know; keep those verbatim.
        let value = match attr.unescape_value() {
            Ok(value) => value.into_owned(),
            Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
        };
        attributes.insert(key, value);
    }

    let local = local_name(tag);
    let kind = if CONTAINMENT_TAGS.contains(&local) {
        match attributes.get("xmi:type") {
            Some(xmi_type) => local_name(xmi_type).to_string(),
            None if local == "ownedAttribute" => KIND_PROPERTY.to_string(),
            None => local.to_string(),
        }
    } else {
        local.to_string()
    };

    Ok(ModelNode {
        kind,
        name: attributes.get("name").cloned().unwrap_or_default(),
        attributes,
        children: Vec::new(),
        tagged_values: IndexMap::new(),
    })
}

fn local_name(qualified: &str) -> &str {
    qualified
        .rsplit_once(':')
        .map(|(_, local)| local)
        .unwrap_or(qualified)
}

/// Map `xmi:id` to element name for type reference lookup.
fn collect_names(node: &ModelNode, names: &mut HashMap<String, String>) {
    if let Some(id) = node.attr("xmi:id") {
        if !node.name.is_empty() {
            names.insert(id.to_string(), node.name.clone());
        }
    }
    for child in &node.children {
        collect_names(child, names);
    }
}

fn collect_extension_tags(
    node: &ModelNode,
    tags: &mut HashMap<String, IndexMap<String, String>>,
) {
    if node.kind == EXTENSION_KIND {
        collect_described_elements(node, tags);
        return;
    }
    for child in &node.children {
        collect_extension_tags(child, tags);
    }
}

fn collect_described_elements(
    node: &ModelNode,
    tags: &mut HashMap<String, IndexMap<String, String>>,
) {
    for child in &node.children {
        match described_idref(child) {
            Some(idref) => record_described(child, idref, tags),
            None => collect_described_elements(child, tags),
        }
    }
}

/// Extension entries that describe a model element by `xmi:idref`.
fn described_idref(node: &ModelNode) -> Option<&str> {
    match node.kind.as_str() {
        "element" | "attribute" => node.attr("xmi:idref"),
        _ => None,
    }
}

fn record_described(
    node: &ModelNode,
    idref: &str,
    tags: &mut HashMap<String, IndexMap<String, String>>,
) {
    let mut values = IndexMap::new();
    gather_tags(node, &mut values, tags);
    if !values.is_empty() {
        tags.entry(idref.to_string()).or_default().extend(values);
    }
}

// Entries nested inside an element (EA lists a class's attributes under
// `<element><attributes>`) belong to their own idref, not to the element.
fn gather_tags(
    node: &ModelNode,
    values: &mut IndexMap<String, String>,
    tags: &mut HashMap<String, IndexMap<String, String>>,
) {
    for child in &node.children {
        match child.kind.as_str() {
            "tag" => {
                if !child.name.is_empty() {
                    let value = child.attr("value").unwrap_or_default();
                    let value = value.split("#NOTES#").next().unwrap_or_default();
                    values.insert(child.name.clone(), value.to_string());
                }
            }
            "documentation" => insert_documentation(values, child.attr("value")),
            "properties" => insert_documentation(values, child.attr("documentation")),
            _ => match described_idref(child) {
                Some(idref) => record_described(child, idref, tags),
                None if child.attr("xmi:idref").is_some() => {}
                None => gather_tags(child, values, tags),
            },
        }
    }
}

fn insert_documentation(values: &mut IndexMap<String, String>, doc: Option<&str>) {
    if let Some(doc) = doc.filter(|d| !d.trim().is_empty()) {
        values
            .entry("documentation".to_string())
            .or_insert_with(|| doc.to_string());
    }
}

/// Attach extension tags and inline comments, and resolve type idrefs to names.
fn resolve(
    node: &mut ModelNode,
    names: &HashMap<String, String>,
    tags: &mut HashMap<String, IndexMap<String, String>>,
) {
    if let Some(values) = node.attr("xmi:id").and_then(|id| tags.remove(id)) {
        node.tagged_values.extend(values);
    }

    if !node.tagged_values.contains_key("documentation") {
        if let Some(body) = node
            .child("ownedComment")
            .and_then(|c| c.attr("body"))
            .filter(|b| !b.trim().is_empty())
        {
            let body = body.to_string();
            node.tagged_values.insert("documentation".to_string(), body);
        }
    }

    if let Some(type_name) = node.attr("type").and_then(|id| names.get(id)) {
        let type_name = type_name.clone();
        node.attributes.insert("type".to_string(), type_name);
    }

    for child in &mut node.children {
        if child.kind == "type" && child.name.is_empty() {
            if let Some(type_name) = child.attr("xmi:idref").and_then(|id| names.get(id)) {
                child.name = type_name.clone();
            }
        }
        resolve(child, names, tags);
    }
}
