//! Field validation and error-path normalization.
//!
//! Constraint checking belongs to the schema itself ([`SchemaNode::validate`]).
//! This module turns the resulting issue list into a flat
//! `path -> message` map so renderers can look up a field's error in O(1).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::introspect::with_base;
use crate::node::Issue;
use crate::traits::SchemaNode;
use crate::types::Row;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Caller mistakes detected while validating. Constraint violations are not
/// errors; they are reported through [`ValidationResult::Invalid`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("unknown field '{field}'")]
    UnknownField { field: String },
}

// ---------------------------------------------------------------------------
// FieldErrors
// ---------------------------------------------------------------------------

/// Flattened error map: dotted path to message.
///
/// When several issues share a path, the last one wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(HashMap<String, String>);

impl FieldErrors {
    /// Flattens issue paths (`["items", 0, "sku"]` becomes `"items.0.sku"`).
    #[must_use]
    pub fn from_issues(issues: &[Issue]) -> Self {
        Self(
            issues
                .iter()
                .map(|issue| (issue.flat_path(), issue.message.clone()))
                .collect(),
        )
    }

    /// Message for a dotted path, if any.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&str> {
        self.0.get(path).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.0.contains_key(path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

// ---------------------------------------------------------------------------
// ValidationResult
// ---------------------------------------------------------------------------

/// Outcome of validating a value against a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// The value conforms to the schema.
    Valid,
    /// The value violates one or more schema constraints.
    Invalid {
        /// Flattened path -> message map for renderers.
        errors: FieldErrors,
        /// The raw issues in the order the schema reported them.
        issues: Vec<Issue>,
    },
}

impl ValidationResult {
    fn from_issues(issues: Vec<Issue>) -> Self {
        if issues.is_empty() {
            Self::Valid
        } else {
            Self::Invalid {
                errors: FieldErrors::from_issues(&issues),
                issues,
            }
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// The error map; empty for a valid result.
    #[must_use]
    pub fn errors(&self) -> FieldErrors {
        match self {
            Self::Valid => FieldErrors::default(),
            Self::Invalid { errors, .. } => errors.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Validates a whole value against `schema`.
pub fn validate<S: SchemaNode + ?Sized>(schema: &S, value: &Json) -> ValidationResult {
    ValidationResult::from_issues(schema.validate(Some(value)))
}

/// Validates a dataset row (or form model) against `schema`.
pub fn validate_row<S: SchemaNode + ?Sized>(schema: &S, row: &Row) -> ValidationResult {
    let object: serde_json::Map<String, Json> =
        row.iter().map(|(k, v)| (k.clone(), v.to_json())).collect();
    validate(schema, &Json::Object(object))
}

/// Validates a single field value, as a form does while the user types.
///
/// `value` is `None` when the field is absent. Error paths are rooted at the
/// field name, so the result merges directly into a whole-form error map.
///
/// # Errors
///
/// Returns [`ValidationError::UnknownField`] if `field` is not declared by the
/// schema.
pub fn validate_field<S: SchemaNode + ?Sized>(
    schema: &S,
    field: &str,
    value: Option<&Json>,
) -> Result<ValidationResult, ValidationError> {
    let root: &dyn SchemaNode = &schema;
    let issues = with_base(root, &mut |base, _| {
        base.fields()
            .into_iter()
            .find(|(name, _)| name == field)
            .map(|(_, node)| {
                node.validate(value)
                    .into_iter()
                    .map(|issue| issue.under(field))
                    .collect::<Vec<_>>()
            })
    })
    .ok_or_else(|| ValidationError::UnknownField {
        field: field.to_string(),
    })?;
    Ok(ValidationResult::from_issues(issues))
}
