//! Schema introspection: any [`SchemaNode`] to an ordered [`SchemaDefinition`].
//!
//! Introspection is advisory metadata, not validation. It never fails:
//! a field whose shape cannot be understood degrades to a required `string`
//! field and the rest of the definition is produced normally.
//!
//! For every field the node is unwrapped layer by layer (optional, nullable,
//! default and effects wrappers) until a base node is reached. The first
//! optional/nullable/default layer makes the field not required. Unwrapping
//! stops early when a wrapper does not expose its inner node, or when
//! [`MAX_UNWRAP_DEPTH`] layers have been peeled.

use std::collections::HashSet;

use tracing::debug;

use crate::descriptor::{FieldDescriptor, FieldType, SchemaDefinition, UiHints, ValidationRules};
use crate::node::SchemaKind;
use crate::traits::SchemaNode;

/// Upper bound on wrapper layers peeled for one field.
pub const MAX_UNWRAP_DEPTH: usize = 32;

/// Definition name used when the schema carries no title.
pub const UNTITLED: &str = "untitled";

// ---------------------------------------------------------------------------
// Unwrapping
// ---------------------------------------------------------------------------

/// Metadata gathered from the wrapper layers above a base node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layers {
    pub required: bool,
    pub depth: usize,
    pub title: Option<String>,
    pub description: Option<String>,
    pub placeholder: Option<String>,
    pub readonly: bool,
}

impl Default for Layers {
    fn default() -> Self {
        Self {
            required: true,
            depth: 0,
            title: None,
            description: None,
            placeholder: None,
            readonly: false,
        }
    }
}

impl Layers {
    /// Outermost metadata wins; read-only is sticky.
    fn absorb(&mut self, node: &dyn SchemaNode) {
        if self.title.is_none() {
            self.title = node.title();
        }
        if self.description.is_none() {
            self.description = node.description();
        }
        let hints = node.hints();
        if self.placeholder.is_none() {
            self.placeholder = hints.placeholder;
        }
        self.readonly |= hints.readonly;
    }
}

/// Peels wrapper layers off `node` and hands the base node to `visit`.
///
/// The base node borrows from the chain of wrappers above it, so it is only
/// available inside the callback.
pub fn with_base<R>(
    node: &dyn SchemaNode,
    visit: &mut dyn FnMut(&dyn SchemaNode, &Layers) -> R,
) -> R {
    let mut layers = Layers::default();
    descend(node, &mut layers, visit)
}

fn descend<R>(
    node: &dyn SchemaNode,
    layers: &mut Layers,
    visit: &mut dyn FnMut(&dyn SchemaNode, &Layers) -> R,
) -> R {
    layers.absorb(node);
    let kind = node.kind();
    if !kind.is_wrapper() {
        return visit(node, layers);
    }
    if kind.relaxes_required() {
        layers.required = false;
    }
    if layers.depth >= MAX_UNWRAP_DEPTH {
        debug!(%kind, depth = layers.depth, "unwrap depth limit reached");
        return visit(node, layers);
    }
    match node.inner() {
        Some(inner) => {
            layers.depth += 1;
            descend(inner.as_ref(), layers, visit)
        }
        None => {
            debug!(%kind, "wrapper exposes no inner node; stopping unwrap");
            visit(node, layers)
        }
    }
}

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

/// Converts a field name into a Title Case label.
///
/// A space is inserted before every internal uppercase letter, underscores
/// become word breaks, and each word gets an uppercase first letter. The
/// transform is locale-independent.
///
/// ```
/// use schemaview_core::introspect::to_label;
///
/// assert_eq!(to_label("vendorLegalName"), "Vendor Legal Name");
/// assert_eq!(to_label("tax_code"), "Tax Code");
/// assert_eq!(to_label("id"), "Id");
/// ```
#[must_use]
pub fn to_label(name: &str) -> String {
    let mut spaced = String::with_capacity(name.len() + 8);
    for (i, ch) in name.chars().enumerate() {
        if ch == '_' {
            spaced.push(' ');
        } else {
            if i > 0 && ch.is_uppercase() {
                spaced.push(' ');
            }
            spaced.push(ch);
        }
    }
    spaced
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Descriptors
// ---------------------------------------------------------------------------

/// Builds the descriptor for one named field node.
#[must_use]
pub fn describe_field(name: &str, node: &dyn SchemaNode) -> FieldDescriptor {
    with_base(node, &mut |base, layers| {
        let kind = base.kind();
        if let SchemaKind::Unknown(raw) = &kind {
            debug!(field = name, kind = raw.as_str(), "unrecognized kind; treating as string");
        }
        let field_type = FieldType::from(&kind);

        let constraints = base.constraints();
        let options = (field_type == FieldType::Enum).then(|| dedup_ordered(base.enum_values()));
        let rules = ValidationRules {
            min: constraints.min,
            max: constraints.max,
            pattern: constraints.pattern,
            options,
        };
        let hints = UiHints {
            placeholder: layers.placeholder.clone(),
            readonly: layers.readonly,
        };

        FieldDescriptor {
            name: name.to_string(),
            field_type,
            label: to_label(name),
            required: layers.required,
            description: layers.description.clone(),
            validation: (!rules.is_empty()).then_some(rules),
            ui_hints: (hints != UiHints::default()).then_some(hints),
        }
    })
}

fn dedup_ordered(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

/// Introspects a schema, naming the definition after the schema's title.
///
/// Idempotent: the same schema always yields an equal definition.
#[must_use]
pub fn introspect<S: SchemaNode + ?Sized>(schema: &S) -> SchemaDefinition {
    introspect_as(None, schema)
}

/// Introspects a schema under an explicit definition name.
#[must_use]
pub fn introspect_named<S: SchemaNode + ?Sized>(name: &str, schema: &S) -> SchemaDefinition {
    introspect_as(Some(name), schema)
}

fn introspect_as<S: SchemaNode + ?Sized>(name: Option<&str>, schema: &S) -> SchemaDefinition {
    let root: &dyn SchemaNode = &schema;
    with_base(root, &mut |base, layers| {
        if base.kind() != SchemaKind::Object {
            debug!(kind = %base.kind(), "schema root is not an object; no fields");
        }
        let mut seen = HashSet::new();
        let fields = base
            .fields()
            .into_iter()
            .filter_map(|(field_name, node)| {
                if seen.insert(field_name.clone()) {
                    Some(describe_field(&field_name, node.as_ref()))
                } else {
                    debug!(field = field_name.as_str(), "duplicate field name ignored");
                    None
                }
            })
            .collect();

        SchemaDefinition {
            name: name
                .map(str::to_string)
                .or_else(|| layers.title.clone())
                .unwrap_or_else(|| UNTITLED.to_string()),
            description: layers.description.clone(),
            fields,
        }
    })
}
