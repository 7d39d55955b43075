//! Schema node vocabulary shared by every schema adapter.
//!
//! An adapter describes its nodes with a closed [`SchemaKind`] tag instead of
//! exposing its own class hierarchy. Wrapper kinds (`Optional`, `Nullable`,
//! `Default`, `Effects`) are peeled off by the introspector through
//! [`SchemaNode::inner`](crate::traits::SchemaNode::inner); everything else is a
//! base kind. Kinds an adapter cannot place land in [`SchemaKind::Unknown`],
//! which classifies as a plain string field.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SchemaKind
// ---------------------------------------------------------------------------

/// Declared kind of a schema node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "camelCase")]
pub enum SchemaKind {
    String,
    Number,
    Boolean,
    Date,
    Enum,
    Array,
    Object,
    /// May be absent.
    Optional,
    /// May be null.
    Nullable,
    /// Falls back to a default value when absent.
    Default,
    /// Refinement or transform layer. Transparent for shape purposes.
    Effects,
    /// Kind the adapter could not place; carries the adapter's own name for it.
    Unknown(String),
}

impl SchemaKind {
    /// Maps an adapter-specific type name onto a kind by substring matching.
    ///
    /// Matching is case-insensitive, so `"ZodOptional"`, `"optional"` and
    /// `"OPTIONAL"` all map to [`SchemaKind::Optional`]. Wrapper names are
    /// checked before base names.
    ///
    /// ```
    /// use schemaview_core::node::SchemaKind;
    ///
    /// assert_eq!(SchemaKind::from_type_name("ZodString"), SchemaKind::String);
    /// assert_eq!(SchemaKind::from_type_name("ZodNativeEnum"), SchemaKind::Enum);
    /// assert_eq!(
    ///     SchemaKind::from_type_name("ZodPromise"),
    ///     SchemaKind::Unknown("ZodPromise".to_string())
    /// );
    /// ```
    #[must_use]
    pub fn from_type_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        let has = |needle: &str| lower.contains(needle);

        if has("optional") {
            Self::Optional
        } else if has("nullable") || has("nullish") {
            Self::Nullable
        } else if has("default") || has("catch") {
            Self::Default
        } else if has("effects") || has("pipeline") || has("branded") || has("readonly") {
            Self::Effects
        } else if has("enum") || has("literal") {
            Self::Enum
        } else if has("date") {
            Self::Date
        } else if has("string") {
            Self::String
        } else if has("number") || has("integer") || has("bigint") || has("float") {
            Self::Number
        } else if has("bool") {
            Self::Boolean
        } else if has("array") || has("tuple") {
            Self::Array
        } else if has("object") || has("record") {
            Self::Object
        } else {
            Self::Unknown(name.to_string())
        }
    }

    /// Whether the introspector should keep unwrapping past this node.
    #[must_use]
    pub fn is_wrapper(&self) -> bool {
        matches!(
            self,
            Self::Optional | Self::Nullable | Self::Default | Self::Effects
        )
    }

    /// Whether encountering this wrapper makes the field not required.
    #[must_use]
    pub fn relaxes_required(&self) -> bool {
        matches!(self, Self::Optional | Self::Nullable | Self::Default)
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(name) => write!(f, "unknown({name})"),
            other => write!(f, "{}", format!("{other:?}").to_ascii_lowercase()),
        }
    }
}

// ---------------------------------------------------------------------------
// Constraints
// ---------------------------------------------------------------------------

/// Declared constraints of a base node.
///
/// `min`/`max` mean length for strings, item count for arrays and value
/// bounds for numbers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub pattern: Option<String>,
}

// ---------------------------------------------------------------------------
// Issues
// ---------------------------------------------------------------------------

/// One segment of an issue path: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(k) => write!(f, "{k}"),
            Self::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// A single constraint violation reported by a schema's own validation routine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Location of the violating value, outermost segment first. Empty for the root.
    pub path: Vec<PathSegment>,
    /// Human-readable description of the violation.
    pub message: String,
}

impl Issue {
    /// Creates an issue located at the root of the validated value.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            path: Vec::new(),
            message: message.into(),
        }
    }

    /// Creates an issue at an explicit path.
    pub fn at(path: Vec<PathSegment>, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }

    /// Prepends `segment` to the path (used when bubbling up from a child node).
    #[must_use]
    pub fn under(mut self, segment: impl Into<PathSegment>) -> Self {
        self.path.insert(0, segment.into());
        self
    }

    /// The path joined with `.` (`["items", 0, "sku"]` becomes `"items.0.sku"`).
    #[must_use]
    pub fn flat_path(&self) -> String {
        self.path
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_names_map_by_substring() {
        assert_eq!(SchemaKind::from_type_name("ZodOptional"), SchemaKind::Optional);
        assert_eq!(SchemaKind::from_type_name("ZodNullable"), SchemaKind::Nullable);
        assert_eq!(SchemaKind::from_type_name("ZodDefault"), SchemaKind::Default);
        assert_eq!(SchemaKind::from_type_name("ZodEffects"), SchemaKind::Effects);
        assert_eq!(SchemaKind::from_type_name("ZodNumber"), SchemaKind::Number);
        assert_eq!(SchemaKind::from_type_name("ZodBoolean"), SchemaKind::Boolean);
        assert_eq!(SchemaKind::from_type_name("ZodDate"), SchemaKind::Date);
        assert_eq!(SchemaKind::from_type_name("ZodArray"), SchemaKind::Array);
        assert_eq!(SchemaKind::from_type_name("ZodObject"), SchemaKind::Object);
        assert_eq!(SchemaKind::from_type_name("ZodLiteral"), SchemaKind::Enum);
    }

    #[test]
    fn wrapper_classification() {
        assert!(SchemaKind::Optional.is_wrapper());
        assert!(SchemaKind::Effects.is_wrapper());
        assert!(!SchemaKind::Effects.relaxes_required());
        assert!(SchemaKind::Default.relaxes_required());
        assert!(!SchemaKind::String.is_wrapper());
    }

    #[test]
    fn flat_path_joins_with_dots() {
        let issue = Issue::new("Required").under(0).under("items");
        assert_eq!(issue.flat_path(), "items.0");
        assert_eq!(Issue::new("bad").flat_path(), "");
    }

    #[test]
    fn kind_display_is_lowercase() {
        assert_eq!(SchemaKind::Nullable.to_string(), "nullable");
        assert_eq!(SchemaKind::Unknown("ZodAny".into()).to_string(), "unknown(ZodAny)");
    }
}
