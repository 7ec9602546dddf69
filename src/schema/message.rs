//! Message schemas: named field tables.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::{FieldDescriptor, FieldType};
use crate::error::{CodecError, Result};

/// Field table of one message type.
///
/// Fields are kept ordered by tag so that encoding is deterministic.
/// Schemas are immutable once built and shared via `Arc`.
#[derive(Debug)]
pub struct MessageSchema {
    name: String,
    fields: BTreeMap<u32, FieldDescriptor>,
    by_name: HashMap<String, u32>,
}

impl MessageSchema {
    /// Build a schema from a list of field descriptors.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSchema` on duplicate tags or names, or any error from
    /// [`FieldDescriptor::validate`].
    ///
    /// # Example
    ///
    /// ```
    /// use pbwire::schema::{FieldDescriptor, FieldType, MessageSchema};
    ///
    /// let schema = MessageSchema::new(
    ///     "HelloWorldResponse",
    ///     vec![FieldDescriptor::new(1, "text", FieldType::Unicode).required()],
    /// )
    /// .unwrap();
    /// assert_eq!(schema.field(1).unwrap().name, "text");
    /// ```
    pub fn new(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(CodecError::InvalidSchema("message name is empty".to_string()));
        }

        let mut by_tag = BTreeMap::new();
        let mut by_name = HashMap::new();
        for field in fields {
            field.validate()?;
            if by_name.insert(field.name.clone(), field.tag).is_some() {
                return Err(CodecError::InvalidSchema(format!(
                    "duplicate field name '{}' in {}",
                    field.name, name
                )));
            }
            let tag = field.tag;
            if by_tag.insert(tag, field).is_some() {
                return Err(CodecError::InvalidSchema(format!(
                    "duplicate tag {} in {}",
                    tag, name
                )));
            }
        }

        Ok(Self {
            name,
            fields: by_tag,
            by_name,
        })
    }

    /// Start a builder for a schema.
    pub fn builder(name: impl Into<String>) -> MessageSchemaBuilder {
        MessageSchemaBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Message type name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get a field by tag.
    pub fn field(&self, tag: u32) -> Option<&FieldDescriptor> {
        self.fields.get(&tag)
    }

    /// Get a field by name.
    pub fn field_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.by_name.get(name).and_then(|tag| self.fields.get(tag))
    }

    /// Iterate fields in tag order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.values()
    }

    /// Iterate required fields in tag order.
    pub fn required_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.values().filter(|f| f.is_required())
    }

    /// Iterate schemas referenced by nested message fields.
    pub fn nested_schemas(&self) -> impl Iterator<Item = &Arc<MessageSchema>> {
        self.fields.values().filter_map(|f| match &f.field_type {
            FieldType::Message(schema) => Some(schema),
            _ => None,
        })
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the schema declares no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Fluent builder for [`MessageSchema`].
pub struct MessageSchemaBuilder {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl MessageSchemaBuilder {
    /// Add a field descriptor.
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Add an optional field.
    pub fn optional(self, tag: u32, name: &str, field_type: FieldType) -> Self {
        self.field(FieldDescriptor::new(tag, name, field_type))
    }

    /// Add a required field.
    pub fn required(self, tag: u32, name: &str, field_type: FieldType) -> Self {
        self.field(FieldDescriptor::new(tag, name, field_type).required())
    }

    /// Add a repeated field.
    pub fn repeated(self, tag: u32, name: &str, field_type: FieldType) -> Self {
        self.field(FieldDescriptor::new(tag, name, field_type).repeated())
    }

    /// Validate and build a shared schema.
    pub fn build(self) -> Result<Arc<MessageSchema>> {
        MessageSchema::new(self.name, self.fields).map(Arc::new)
    }
}
