//! The seam between the engine and a schema library.
//!
//! Introspection and validation walk a schema only through [`SchemaNode`].

use crate::descriptor::UiHints;
use crate::node::{Constraints, Issue, SchemaKind};

/// Boxed child node borrowed from its parent schema.
pub type NodeRef<'a> = Box<dyn SchemaNode + 'a>;

/// Capability interface every validation-library adapter implements.
///
/// The introspector only reads shape (`kind`, `inner`, `fields`,
/// `enum_values`, `description`, `constraints`, `hints`); the validator only
/// calls `validate`. Neither depends on a particular validation library.
pub trait SchemaNode {
    /// Declared kind of this node.
    fn kind(&self) -> SchemaKind;

    /// The wrapped node for wrapper kinds. `None` for base nodes, and also for
    /// wrappers whose inner node cannot be located.
    fn inner(&self) -> Option<NodeRef<'_>>;

    /// Named child nodes of an object node, in declaration order.
    fn fields(&self) -> Vec<(String, NodeRef<'_>)> {
        Vec::new()
    }

    /// Literal values of an enum node, in declaration order.
    fn enum_values(&self) -> Vec<String> {
        Vec::new()
    }

    /// Free-text documentation attached to this node.
    fn description(&self) -> Option<String> {
        None
    }

    /// Display name of the schema, when the adapter knows one.
    fn title(&self) -> Option<String> {
        None
    }

    /// Declared min/max/pattern constraints.
    fn constraints(&self) -> Constraints {
        Constraints::default()
    }

    /// Presentation metadata (placeholder, read-only).
    fn hints(&self) -> UiHints {
        UiHints::default()
    }

    /// Runs the schema's own validation routine. `None` means the value is absent.
    fn validate(&self, value: Option<&serde_json::Value>) -> Vec<Issue>;
}

impl<T: SchemaNode + ?Sized> SchemaNode for &T {
    fn kind(&self) -> SchemaKind {
        (**self).kind()
    }

    fn inner(&self) -> Option<NodeRef<'_>> {
        (**self).inner()
    }

    fn fields(&self) -> Vec<(String, NodeRef<'_>)> {
        (**self).fields()
    }

    fn enum_values(&self) -> Vec<String> {
        (**self).enum_values()
    }

    fn description(&self) -> Option<String> {
        (**self).description()
    }

    fn title(&self) -> Option<String> {
        (**self).title()
    }

    fn constraints(&self) -> Constraints {
        (**self).constraints()
    }

    fn hints(&self) -> UiHints {
        (**self).hints()
    }

    fn validate(&self, value: Option<&serde_json::Value>) -> Vec<Issue> {
        (**self).validate(value)
    }
}
