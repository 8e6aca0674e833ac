//! Mapping of declared UML type names to JSON Schema types.

use serde::{Deserialize, Serialize};

/// JSON Schema primitive type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

/// Dutch citizen service number: exactly nine digits.
pub const BSN_PATTERN: &str = "^[0-9]{9}$";

/// Dutch postal code: four digits (first non-zero) and two capitals.
pub const POSTCODE_PATTERN: &str = "^[1-9][0-9]{3}[A-Z]{2}$";

/// Result of type inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeInference {
    pub json_type: JsonType,
    pub format: Option<&'static str>,
    pub pattern: Option<&'static str>,
}

impl TypeInference {
    fn plain(json_type: JsonType) -> Self {
        Self {
            json_type,
            format: None,
            pattern: None,
        }
    }

    fn formatted(format: &'static str) -> Self {
        Self {
            format: Some(format),
            ..Self::plain(JsonType::String)
        }
    }

    fn patterned(pattern: &'static str) -> Self {
        Self {
            pattern: Some(pattern),
            ..Self::plain(JsonType::String)
        }
    }
}

/// Infer JSON type, format and pattern from a declared type name.
///
/// Rules are checked in order and the first match wins. Unknown names
/// fall back to a plain string.
pub fn infer_type(type_name: &str) -> TypeInference {
    let t = type_name.to_lowercase();

    if t.contains("date") && !t.contains("time") {
        TypeInference::formatted("date")
    } else if t.contains("datetime") || t.contains("timestamp") {
        TypeInference::formatted("date-time")
    } else if t.contains("email") {
        TypeInference::formatted("email")
    } else if t.contains("uri") {
        TypeInference::formatted("uri")
    } else if t.contains("bsn") {
        TypeInference::patterned(BSN_PATTERN)
    } else if t.contains("postcode") {
        TypeInference::patterned(POSTCODE_PATTERN)
    } else {
        match t.as_str() {
            "integer" | "int" => TypeInference::plain(JsonType::Integer),
            "double" | "float" | "decimal" => TypeInference::plain(JsonType::Number),
            "boolean" => TypeInference::plain(JsonType::Boolean),
            _ => TypeInference::plain(JsonType::String),
        }
    }
}
