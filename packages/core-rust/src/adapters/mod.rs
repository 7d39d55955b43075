//! Adapters exposing third-party schema formats as [`crate::traits::SchemaNode`].
//!
//! The built-in [`crate::schema::Schema`] implements the trait directly and
//! needs no adapter.

#[cfg(feature = "json-schema")]
pub mod json_schema;

#[cfg(feature = "json-schema")]
pub use json_schema::JsonSchemaNode;
