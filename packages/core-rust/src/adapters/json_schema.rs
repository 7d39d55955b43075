//! [`SchemaNode`] over a JSON Schema document.
//!
//! Wrapper layers are synthesized from JSON Schema keywords so the
//! introspector sees the same shape it sees for builder schemas:
//!
//! | keyword                                   | layer      |
//! |-------------------------------------------|------------|
//! | property absent from the parent `required` | `Optional` |
//! | `default`                                 | `Default`  |
//! | `type: [T, "null"]`, `anyOf` with `null`  | `Nullable` |
//!
//! Internal `$ref`s (`#/...`) are followed. Validation delegates to the
//! `jsonschema` crate (draft 2020-12); each subschema is compiled at most
//! once per wrapped document.

use std::collections::HashMap;
use std::sync::Arc;

use jsonschema::error::ValidationErrorKind;
use jsonschema::Validator;
use parking_lot::Mutex;
use serde_json::Value as Json;

use crate::descriptor::UiHints;
use crate::node::{Constraints, Issue, PathSegment, SchemaKind};
use crate::traits::{NodeRef, SchemaNode};

/// Upper bound on chained `$ref` hops for one node.
const MAX_REF_HOPS: usize = 16;

/// Compiled validators keyed by subschema address. `None` marks a
/// subschema that failed to compile.
type Compiled = Arc<Mutex<HashMap<usize, Option<Arc<Validator>>>>>;

/// A node of a JSON Schema document, borrowed from its root.
#[derive(Clone)]
pub struct JsonSchemaNode<'a> {
    root: &'a Json,
    /// As declared; what values are validated against.
    origin: &'a Json,
    /// After `$ref` resolution and null-branch stripping; what shape is read from.
    node: &'a Json,
    optional: bool,
    defaulted: bool,
    nullable: bool,
    /// Shared by every node derived from the same [`JsonSchemaNode::new`].
    compiled: Compiled,
}

impl<'a> JsonSchemaNode<'a> {
    /// Wraps the root of a schema document.
    #[must_use]
    pub fn new(root: &'a Json) -> Self {
        Self::declared(root, root, true, Compiled::default())
    }

    fn declared(root: &'a Json, origin: &'a Json, required: bool, compiled: Compiled) -> Self {
        let resolved = resolve(root, origin);
        let (node, nullable) = strip_null(root, resolved);
        Self {
            root,
            origin,
            node,
            optional: !required,
            defaulted: origin.get("default").is_some() || resolved.get("default").is_some(),
            nullable,
            compiled,
        }
    }

    fn keyword(&self, key: &str) -> Option<&'a Json> {
        self.origin
            .get(key)
            .or_else(|| self.node.get(key))
    }

    fn base_kind(&self) -> SchemaKind {
        let node = self.node;
        if node.get("enum").is_some() || node.get("const").is_some() {
            return SchemaKind::Enum;
        }
        match primary_type(node) {
            Some("string") => match node.get("format").and_then(Json::as_str) {
                Some("date" | "date-time") => SchemaKind::Date,
                _ => SchemaKind::String,
            },
            Some("number" | "integer") => SchemaKind::Number,
            Some("boolean") => SchemaKind::Boolean,
            Some("array") => SchemaKind::Array,
            Some("object") => SchemaKind::Object,
            Some(other) => SchemaKind::from_type_name(other),
            None if node.get("properties").is_some() => SchemaKind::Object,
            None if node.get("items").is_some() => SchemaKind::Array,
            None => SchemaKind::Unknown("any".to_string()),
        }
    }

    /// A self-contained schema for validating against `origin`.
    fn standalone(&self) -> Json {
        if std::ptr::eq(self.origin, self.root) {
            return self.root.clone();
        }
        let mut schema = self.origin.clone();
        if let Json::Object(map) = &mut schema {
            for defs in ["$defs", "definitions"] {
                if let Some(shared) = self.root.get(defs) {
                    map.entry(defs).or_insert_with(|| shared.clone());
                }
            }
        }
        schema
    }

    /// The validator for `origin`, compiled on first use.
    fn validator(&self) -> Option<Arc<Validator>> {
        let key = std::ptr::from_ref(self.origin) as usize;
        let mut compiled = self.compiled.lock();
        compiled
            .entry(key)
            .or_insert_with(|| {
                match jsonschema::options()
                    .with_draft(jsonschema::Draft::Draft202012)
                    .build(&self.standalone())
                {
                    Ok(validator) => Some(Arc::new(validator)),
                    Err(err) => {
                        tracing::debug!(error = %err, "schema does not compile; values not checked");
                        None
                    }
                }
            })
            .clone()
    }
}

impl std::fmt::Debug for JsonSchemaNode<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonSchemaNode")
            .field("node", self.node)
            .field("optional", &self.optional)
            .field("defaulted", &self.defaulted)
            .field("nullable", &self.nullable)
            .finish_non_exhaustive()
    }
}

impl SchemaNode for JsonSchemaNode<'_> {
    fn kind(&self) -> SchemaKind {
        if self.optional {
            SchemaKind::Optional
        } else if self.defaulted {
            SchemaKind::Default
        } else if self.nullable {
            SchemaKind::Nullable
        } else {
            self.base_kind()
        }
    }

    fn inner(&self) -> Option<NodeRef<'_>> {
        let mut inner = self.clone();
        if inner.optional {
            inner.optional = false;
        } else if inner.defaulted {
            inner.defaulted = false;
        } else if inner.nullable {
            inner.nullable = false;
        } else {
            return None;
        }
        Some(Box::new(inner))
    }

    fn fields(&self) -> Vec<(String, NodeRef<'_>)> {
        let Some(properties) = self.node.get("properties").and_then(Json::as_object) else {
            return Vec::new();
        };
        let required: Vec<&str> = self
            .node
            .get("required")
            .and_then(Json::as_array)
            .map(|names| names.iter().filter_map(Json::as_str).collect())
            .unwrap_or_default();
        properties
            .iter()
            .map(|(name, property)| {
                let child = Self::declared(
                    self.root,
                    property,
                    required.contains(&name.as_str()),
                    Arc::clone(&self.compiled),
                );
                (name.clone(), Box::new(child) as NodeRef<'_>)
            })
            .collect()
    }

    fn enum_values(&self) -> Vec<String> {
        let literals: Vec<&Json> = match (self.node.get("enum"), self.node.get("const")) {
            (Some(Json::Array(values)), _) => values.iter().collect(),
            (_, Some(value)) => vec![value],
            _ => Vec::new(),
        };
        literals
            .into_iter()
            .filter(|v| !v.is_null())
            .map(|v| match v {
                Json::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect()
    }

    fn description(&self) -> Option<String> {
        self.keyword("description")
            .and_then(Json::as_str)
            .map(str::to_string)
    }

    fn title(&self) -> Option<String> {
        self.keyword("title").and_then(Json::as_str).map(str::to_string)
    }

    fn constraints(&self) -> Constraints {
        let number = |keys: &[&str]| keys.iter().find_map(|k| self.node.get(*k).and_then(Json::as_f64));
        Constraints {
            min: number(&["minimum", "minLength", "minItems"]),
            max: number(&["maximum", "maxLength", "maxItems"]),
            pattern: self
                .node
                .get("pattern")
                .and_then(Json::as_str)
                .map(str::to_string),
        }
    }

    fn hints(&self) -> UiHints {
        let placeholder = self
            .keyword("x-placeholder")
            .and_then(Json::as_str)
            .map(str::to_string)
            .or_else(|| {
                self.keyword("examples")
                    .and_then(Json::as_array)
                    .and_then(|examples| examples.first())
                    .map(|example| match example {
                        Json::String(s) => s.clone(),
                        other => other.to_string(),
                    })
            });
        UiHints {
            placeholder,
            readonly: self
                .keyword("readOnly")
                .and_then(Json::as_bool)
                .unwrap_or(false),
        }
    }

    fn validate(&self, value: Option<&Json>) -> Vec<Issue> {
        let Some(value) = value else {
            return if self.optional || self.defaulted {
                Vec::new()
            } else {
                vec![Issue::new("Required")]
            };
        };

        let Some(validator) = self.validator() else {
            return Vec::new();
        };

        validator
            .iter_errors(value)
            .map(|err| {
                let mut path = parse_pointer(&err.instance_path.to_string());
                // Reported at the parent object; keyed by the missing property.
                if let ValidationErrorKind::Required { property } = &err.kind {
                    if let Some(name) = property.as_str() {
                        path.push(PathSegment::Key(name.to_string()));
                    }
                }
                Issue::at(path, err.to_string())
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Follows internal `$ref`s. Unresolvable or external refs stop resolution.
fn resolve<'a>(root: &'a Json, mut node: &'a Json) -> &'a Json {
    for _ in 0..MAX_REF_HOPS {
        let Some(reference) = node.get("$ref").and_then(Json::as_str) else {
            return node;
        };
        match reference.strip_prefix('#').and_then(|pointer| root.pointer(pointer)) {
            Some(target) => node = target,
            None => {
                tracing::debug!(reference, "unresolvable $ref");
                return node;
            }
        }
    }
    tracing::debug!("$ref chain too long");
    node
}

/// Detects nullability. For `anyOf`/`oneOf` with a single non-null branch,
/// the shape is read from that branch.
fn strip_null<'a>(root: &'a Json, node: &'a Json) -> (&'a Json, bool) {
    if let Some(Json::Array(types)) = node.get("type") {
        return (node, types.iter().any(|t| t == "null"));
    }
    if node.get("nullable").and_then(Json::as_bool) == Some(true) {
        return (node, true);
    }
    for combinator in ["anyOf", "oneOf"] {
        let Some(branches) = node.get(combinator).and_then(Json::as_array) else {
            continue;
        };
        let is_null = |b: &Json| resolve(root, b).get("type").and_then(Json::as_str) == Some("null");
        let rest: Vec<&Json> = branches.iter().filter(|&b| !is_null(b)).collect();
        if rest.len() < branches.len() && rest.len() == 1 {
            return (resolve(root, rest[0]), true);
        }
    }
    (node, false)
}

/// The declared type, ignoring `"null"` in a type list.
fn primary_type(node: &Json) -> Option<&str> {
    match node.get("type")? {
        Json::String(t) => Some(t.as_str()),
        Json::Array(types) => types.iter().filter_map(Json::as_str).find(|t| *t != "null"),
        _ => None,
    }
}

/// Splits a JSON Pointer into path segments. Numeric tokens become indices.
fn parse_pointer(pointer: &str) -> Vec<PathSegment> {
    pointer
        .split('/')
        .skip(1)
        .map(|token| {
            let token = token.replace("~1", "/").replace("~0", "~");
            match token.parse::<usize>() {
                Ok(index) => PathSegment::Index(index),
                Err(_) => PathSegment::Key(token),
            }
        })
        .collect()
}
