//! Schema module - message field tables.
//!
//! Provides:
//! - [`FieldDescriptor`] / [`FieldType`] - one entry of a field table
//! - [`MessageSchema`] - named field table, ordered by tag
//! - [`SchemaRegistry`] - lookup by message name or wire id
//! - [`SchemaDefinitions`] - field tables loaded from JSON
//!
//! Schemas are immutable once built. Nested message fields hold an `Arc` to
//! the referenced schema, so one schema can be shared by many parents and
//! across threads.

mod definition;
mod field;
mod message;
mod registry;

pub use definition::{FieldDef, MessageDef, SchemaDefinitions, TypeName};
pub use field::{flags, FieldDescriptor, FieldType, WireKind};
pub use message::{MessageSchema, MessageSchemaBuilder};
pub use registry::SchemaRegistry;
