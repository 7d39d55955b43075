//! Normalized field metadata produced by the introspector.
//!
//! These types are the consumer-facing shape: renderers build columns and
//! inputs from [`SchemaDefinition::fields`] without ever looking at the
//! schema adapter. All structs serialize with camelCase keys.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::node::SchemaKind;

// ---------------------------------------------------------------------------
// FieldType
// ---------------------------------------------------------------------------

/// Semantic primitive family of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Date,
    Enum,
    Array,
    Object,
}

impl FieldType {
    /// Wire name of the type.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Enum => "enum",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    /// Scalar types are sortable and filterable by default.
    #[must_use]
    pub fn is_scalar(self) -> bool {
        !matches!(self, Self::Array | Self::Object)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&SchemaKind> for FieldType {
    /// Total mapping: wrapper and unknown kinds fall back to `String`.
    fn from(kind: &SchemaKind) -> Self {
        match kind {
            SchemaKind::Number => Self::Number,
            SchemaKind::Boolean => Self::Boolean,
            SchemaKind::Date => Self::Date,
            SchemaKind::Enum => Self::Enum,
            SchemaKind::Array => Self::Array,
            SchemaKind::Object => Self::Object,
            SchemaKind::String
            | SchemaKind::Optional
            | SchemaKind::Nullable
            | SchemaKind::Default
            | SchemaKind::Effects
            | SchemaKind::Unknown(_) => Self::String,
        }
    }
}

// ---------------------------------------------------------------------------
// Descriptor parts
// ---------------------------------------------------------------------------

/// Constraint bag carried on a descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRules {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub pattern: Option<String>,
    /// Enum literals, ordered and deduplicated. Only set for `enum` fields.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub options: Option<Vec<String>>,
}

impl ValidationRules {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none() && self.pattern.is_none() && self.options.is_none()
    }
}

/// Presentation-only hints. Never influence type or required inference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiHints {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub readonly: bool,
}

// ---------------------------------------------------------------------------
// FieldDescriptor / SchemaDefinition
// ---------------------------------------------------------------------------

/// Normalized metadata for one schema property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    /// Unique key within the schema.
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Title Case label derived from `name`.
    pub label: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub validation: Option<ValidationRules>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ui_hints: Option<UiHints>,
}

impl FieldDescriptor {
    /// Enum options, if this is an enum field.
    #[must_use]
    pub fn options(&self) -> Option<&[String]> {
        self.validation.as_ref()?.options.as_deref()
    }
}

/// Ordered field descriptors for one schema. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDefinition {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
    /// Declaration order of the source schema.
    pub fields: Vec<FieldDescriptor>,
}

impl SchemaDefinition {
    /// Looks up a descriptor by field name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Field names in declaration order.
    #[must_use]
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapper_and_unknown_kinds_fall_back_to_string() {
        assert_eq!(FieldType::from(&SchemaKind::Optional), FieldType::String);
        assert_eq!(FieldType::from(&SchemaKind::Unknown("ZodAny".into())), FieldType::String);
        assert_eq!(FieldType::from(&SchemaKind::Enum), FieldType::Enum);
    }

    #[test]
    fn descriptor_serializes_camel_case_with_type_key() {
        let descriptor = FieldDescriptor {
            name: "taxCode".into(),
            field_type: FieldType::String,
            label: "Tax Code".into(),
            required: true,
            description: None,
            validation: None,
            ui_hints: Some(UiHints {
                placeholder: Some("e.g. VAT".into()),
                readonly: false,
            }),
        };
        let json = serde_json::to_value(&descriptor).expect("serialize");
        assert_eq!(json["type"], "string");
        assert_eq!(json["uiHints"]["placeholder"], "e.g. VAT");
        assert!(json.get("description").is_none());
    }
}
