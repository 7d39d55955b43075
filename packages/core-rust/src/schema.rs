//! Built-in tagged-variant schema.
//!
//! [`Schema`] is a small Zod-style builder for declaring form/table models in
//! Rust. It implements [`SchemaNode`] directly, so the introspector and the
//! validator treat it exactly like any other adapter.
//!
//! ```
//! use schemaview_core::schema::Schema;
//!
//! let invoice = Schema::object([
//!     ("vendorLegalName", Schema::string().min(1.0)),
//!     ("amount", Schema::number().min(0.0).optional()),
//!     ("status", Schema::enumeration(["draft", "approved"])),
//! ]);
//! # let _ = invoice;
//! ```

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde_json::Value as Json;

use crate::descriptor::UiHints;
use crate::node::{Constraints, Issue, SchemaKind};
use crate::traits::{NodeRef, SchemaNode};
use crate::types::parse_datetime;

/// Predicate used by [`Schema::refine`].
pub type RefineFn = Arc<dyn Fn(&Json) -> bool + Send + Sync>;

// ---------------------------------------------------------------------------
// Definition
// ---------------------------------------------------------------------------

/// Compiled `pattern` constraint. `regex` is `None` when the source failed to compile.
#[derive(Debug, Clone)]
pub struct Pattern {
    pub source: String,
    regex: Option<Regex>,
}

/// Custom predicate layer with its failure message.
#[derive(Clone)]
pub struct Refinement {
    check: RefineFn,
    pub message: String,
}

impl fmt::Debug for Refinement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Refinement")
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

/// Tagged variant describing what a [`Schema`] node accepts.
#[derive(Debug, Clone)]
pub enum SchemaDef {
    String {
        min: Option<f64>,
        max: Option<f64>,
        pattern: Option<Pattern>,
    },
    Number {
        min: Option<f64>,
        max: Option<f64>,
        integer: bool,
    },
    Boolean,
    Date,
    Enum(Vec<String>),
    Array {
        item: Box<Schema>,
        min: Option<f64>,
        max: Option<f64>,
    },
    Object(Vec<(String, Schema)>),
    Optional(Box<Schema>),
    Nullable(Box<Schema>),
    Default {
        inner: Box<Schema>,
        value: Json,
    },
    Refine {
        inner: Box<Schema>,
        refinement: Refinement,
    },
    /// Accepts anything. Introspects as an unknown kind.
    Any,
}

#[derive(Debug, Clone, Default)]
struct Meta {
    title: Option<String>,
    description: Option<String>,
    placeholder: Option<String>,
    readonly: bool,
}

/// A schema node: definition plus documentation metadata.
#[derive(Debug, Clone)]
pub struct Schema {
    def: SchemaDef,
    meta: Meta,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

impl Schema {
    fn from_def(def: SchemaDef) -> Self {
        Self {
            def,
            meta: Meta::default(),
        }
    }

    #[must_use]
    pub fn string() -> Self {
        Self::from_def(SchemaDef::String {
            min: None,
            max: None,
            pattern: None,
        })
    }

    #[must_use]
    pub fn number() -> Self {
        Self::from_def(SchemaDef::Number {
            min: None,
            max: None,
            integer: false,
        })
    }

    #[must_use]
    pub fn integer() -> Self {
        Self::from_def(SchemaDef::Number {
            min: None,
            max: None,
            integer: true,
        })
    }

    #[must_use]
    pub fn boolean() -> Self {
        Self::from_def(SchemaDef::Boolean)
    }

    #[must_use]
    pub fn date() -> Self {
        Self::from_def(SchemaDef::Date)
    }

    /// Enum of string literals, kept in the given order.
    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_def(SchemaDef::Enum(values.into_iter().map(Into::into).collect()))
    }

    #[must_use]
    pub fn array(item: Schema) -> Self {
        Self::from_def(SchemaDef::Array {
            item: Box::new(item),
            min: None,
            max: None,
        })
    }

    /// Object with fields in declaration order.
    pub fn object<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, Schema)>,
        S: Into<String>,
    {
        Self::from_def(SchemaDef::Object(
            fields.into_iter().map(|(n, s)| (n.into(), s)).collect(),
        ))
    }

    #[must_use]
    pub fn any() -> Self {
        Self::from_def(SchemaDef::Any)
    }

    #[must_use]
    pub fn optional(self) -> Self {
        Self::from_def(SchemaDef::Optional(Box::new(self)))
    }

    #[must_use]
    pub fn nullable(self) -> Self {
        Self::from_def(SchemaDef::Nullable(Box::new(self)))
    }

    /// Value substituted when the field is absent.
    #[must_use]
    pub fn default_value(self, value: impl Into<Json>) -> Self {
        Self::from_def(SchemaDef::Default {
            inner: Box::new(self),
            value: value.into(),
        })
    }

    /// Adds a custom check that runs after the inner node accepted the value.
    #[must_use]
    pub fn refine<F>(self, check: F, message: impl Into<String>) -> Self
    where
        F: Fn(&Json) -> bool + Send + Sync + 'static,
    {
        Self::from_def(SchemaDef::Refine {
            inner: Box::new(self),
            refinement: Refinement {
                check: Arc::new(check),
                message: message.into(),
            },
        })
    }

    /// Minimum length (string), item count (array) or value (number).
    /// Applies to the innermost base node when called on a wrapper.
    #[must_use]
    pub fn min(mut self, bound: f64) -> Self {
        match &mut self.base_mut().def {
            SchemaDef::String { min, .. }
            | SchemaDef::Number { min, .. }
            | SchemaDef::Array { min, .. } => *min = Some(bound),
            _ => {}
        }
        self
    }

    /// Maximum length (string), item count (array) or value (number).
    #[must_use]
    pub fn max(mut self, bound: f64) -> Self {
        match &mut self.base_mut().def {
            SchemaDef::String { max, .. }
            | SchemaDef::Number { max, .. }
            | SchemaDef::Array { max, .. } => *max = Some(bound),
            _ => {}
        }
        self
    }

    /// Regular-expression constraint on a string node. A pattern that does not
    /// compile is kept for display but not enforced.
    #[must_use]
    pub fn pattern(mut self, source: &str) -> Self {
        if let SchemaDef::String { pattern, .. } = &mut self.base_mut().def {
            let regex = match Regex::new(source) {
                Ok(re) => Some(re),
                Err(err) => {
                    tracing::debug!(pattern = source, error = %err, "pattern not enforced");
                    None
                }
            };
            *pattern = Some(Pattern {
                source: source.to_string(),
                regex,
            });
        }
        self
    }

    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.meta.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.meta.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.meta.placeholder = Some(placeholder.into());
        self
    }

    #[must_use]
    pub fn readonly(mut self) -> Self {
        self.meta.readonly = true;
        self
    }

    /// The tagged definition of this node.
    #[must_use]
    pub fn def(&self) -> &SchemaDef {
        &self.def
    }

    fn base_mut(&mut self) -> &mut Schema {
        match self.def {
            SchemaDef::Optional(_)
            | SchemaDef::Nullable(_)
            | SchemaDef::Default { .. }
            | SchemaDef::Refine { .. } => {}
            _ => return self,
        }
        match &mut self.def {
            SchemaDef::Optional(inner)
            | SchemaDef::Nullable(inner)
            | SchemaDef::Default { inner, .. }
            | SchemaDef::Refine { inner, .. } => inner.base_mut(),
            _ => unreachable!("wrapper variants handled above"),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn json_type(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

fn type_mismatch(expected: &str, value: &Json) -> Vec<Issue> {
    vec![Issue::new(format!(
        "Expected {expected}, received {}",
        json_type(value)
    ))]
}

#[allow(clippy::cast_precision_loss)]
fn check_count(count: usize, min: Option<f64>, max: Option<f64>, noun: &str, unit: &str) -> Vec<Issue> {
    let count = count as f64;
    let mut issues = Vec::new();
    if let Some(min) = min {
        if count < min {
            issues.push(Issue::new(format!("{noun} must contain at least {min} {unit}")));
        }
    }
    if let Some(max) = max {
        if count > max {
            issues.push(Issue::new(format!("{noun} must contain at most {max} {unit}")));
        }
    }
    issues
}

impl Schema {
    fn check(&self, value: Option<&Json>) -> Vec<Issue> {
        match &self.def {
            SchemaDef::Optional(inner) => match value {
                None => Vec::new(),
                Some(_) => inner.check(value),
            },
            SchemaDef::Nullable(inner) => match value {
                Some(Json::Null) => Vec::new(),
                _ => inner.check(value),
            },
            SchemaDef::Default { inner, value: fallback } => match value {
                None => inner.check(Some(fallback)),
                Some(_) => inner.check(value),
            },
            SchemaDef::Refine { inner, refinement } => {
                let issues = inner.check(value);
                match value {
                    Some(v) if issues.is_empty() && !(refinement.check)(v) => {
                        vec![Issue::new(refinement.message.clone())]
                    }
                    _ => issues,
                }
            }
            SchemaDef::Any => Vec::new(),
            _ => match value {
                None => vec![Issue::new("Required")],
                Some(v) => self.check_base(v),
            },
        }
    }

    fn check_base(&self, value: &Json) -> Vec<Issue> {
        match &self.def {
            SchemaDef::String { min, max, pattern } => {
                let Json::String(s) = value else {
                    return type_mismatch("string", value);
                };
                let mut issues = check_count(s.chars().count(), *min, *max, "String", "character(s)");
                if let Some(Pattern { regex: Some(re), .. }) = pattern {
                    if !re.is_match(s) {
                        issues.push(Issue::new("Invalid"));
                    }
                }
                issues
            }
            SchemaDef::Number { min, max, integer } => {
                let Some(n) = value.as_f64() else {
                    return type_mismatch("number", value);
                };
                let mut issues = Vec::new();
                if *integer && n.fract() != 0.0 {
                    issues.push(Issue::new("Expected integer, received float"));
                }
                if let Some(min) = min {
                    if n < *min {
                        issues.push(Issue::new(format!(
                            "Number must be greater than or equal to {min}"
                        )));
                    }
                }
                if let Some(max) = max {
                    if n > *max {
                        issues.push(Issue::new(format!(
                            "Number must be less than or equal to {max}"
                        )));
                    }
                }
                issues
            }
            SchemaDef::Boolean => match value {
                Json::Bool(_) => Vec::new(),
                other => type_mismatch("boolean", other),
            },
            SchemaDef::Date => match value {
                Json::String(s) if parse_datetime(s).is_some() => Vec::new(),
                Json::String(_) => vec![Issue::new("Invalid date")],
                Json::Number(n) if n.is_i64() => Vec::new(),
                other => type_mismatch("date", other),
            },
            SchemaDef::Enum(options) => {
                if let Json::String(s) = value {
                    if options.iter().any(|o| o == s) {
                        return Vec::new();
                    }
                }
                let expected = options
                    .iter()
                    .map(|o| format!("'{o}'"))
                    .collect::<Vec<_>>()
                    .join(" | ");
                let received = match value {
                    Json::String(s) => format!("'{s}'"),
                    other => json_type(other).to_string(),
                };
                vec![Issue::new(format!(
                    "Invalid enum value. Expected {expected}, received {received}"
                ))]
            }
            SchemaDef::Array { item, min, max } => {
                let Json::Array(items) = value else {
                    return type_mismatch("array", value);
                };
                let mut issues = check_count(items.len(), *min, *max, "Array", "element(s)");
                for (i, v) in items.iter().enumerate() {
                    issues.extend(item.check(Some(v)).into_iter().map(|issue| issue.under(i)));
                }
                issues
            }
            SchemaDef::Object(fields) => {
                let Json::Object(map) = value else {
                    return type_mismatch("object", value);
                };
                fields
                    .iter()
                    .flat_map(|(name, schema)| {
                        schema
                            .check(map.get(name))
                            .into_iter()
                            .map(move |issue| issue.under(name.as_str()))
                    })
                    .collect()
            }
            SchemaDef::Optional(_)
            | SchemaDef::Nullable(_)
            | SchemaDef::Default { .. }
            | SchemaDef::Refine { .. }
            | SchemaDef::Any => self.check(Some(value)),
        }
    }
}

// ---------------------------------------------------------------------------
// SchemaNode
// ---------------------------------------------------------------------------

fn boxed(schema: &Schema) -> NodeRef<'_> {
    Box::new(schema)
}

impl SchemaNode for Schema {
    fn kind(&self) -> SchemaKind {
        match &self.def {
            SchemaDef::String { .. } => SchemaKind::String,
            SchemaDef::Number { .. } => SchemaKind::Number,
            SchemaDef::Boolean => SchemaKind::Boolean,
            SchemaDef::Date => SchemaKind::Date,
            SchemaDef::Enum(_) => SchemaKind::Enum,
            SchemaDef::Array { .. } => SchemaKind::Array,
            SchemaDef::Object(_) => SchemaKind::Object,
            SchemaDef::Optional(_) => SchemaKind::Optional,
            SchemaDef::Nullable(_) => SchemaKind::Nullable,
            SchemaDef::Default { .. } => SchemaKind::Default,
            SchemaDef::Refine { .. } => SchemaKind::Effects,
            SchemaDef::Any => SchemaKind::Unknown("any".to_string()),
        }
    }

    fn inner(&self) -> Option<NodeRef<'_>> {
        match &self.def {
            SchemaDef::Optional(inner)
            | SchemaDef::Nullable(inner)
            | SchemaDef::Default { inner, .. }
            | SchemaDef::Refine { inner, .. } => Some(boxed(inner)),
            _ => None,
        }
    }

    fn fields(&self) -> Vec<(String, NodeRef<'_>)> {
        match &self.def {
            SchemaDef::Object(fields) => fields
                .iter()
                .map(|(name, schema)| (name.clone(), boxed(schema)))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn enum_values(&self) -> Vec<String> {
        match &self.def {
            SchemaDef::Enum(values) => values.clone(),
            _ => Vec::new(),
        }
    }

    fn description(&self) -> Option<String> {
        self.meta.description.clone()
    }

    fn title(&self) -> Option<String> {
        self.meta.title.clone()
    }

    fn constraints(&self) -> Constraints {
        match &self.def {
            SchemaDef::String { min, max, pattern } => Constraints {
                min: *min,
                max: *max,
                pattern: pattern.as_ref().map(|p| p.source.clone()),
            },
            SchemaDef::Number { min, max, .. } | SchemaDef::Array { min, max, .. } => {
                Constraints {
                    min: *min,
                    max: *max,
                    pattern: None,
                }
            }
            _ => Constraints::default(),
        }
    }

    fn hints(&self) -> UiHints {
        UiHints {
            placeholder: self.meta.placeholder.clone(),
            readonly: self.meta.readonly,
        }
    }

    fn validate(&self, value: Option<&Json>) -> Vec<Issue> {
        self.check(value)
    }
}
