//! JSON schema definitions.
//!
//! Message field tables can be shipped as data instead of code. A definition
//! file lists messages; nested message fields refer to other messages by
//! name and are resolved into shared `Arc` references when loaded.
//!
//! ```text
//! {
//!   "messages": [
//!     { "name": "Inner", "fields": [
//!         { "tag": 1, "name": "x", "type": "uvarint", "required": true } ] },
//!     { "name": "Outer", "wire_id": 12, "fields": [
//!         { "tag": 1, "name": "nested", "type": "message", "message": "Inner" },
//!         { "tag": 2, "name": "kind", "type": "enum", "values": [0, 1, 2] } ] }
//!   ]
//! }
//! ```
//!
//! # Example
//!
//! ```
//! use pbwire::schema::SchemaDefinitions;
//!
//! let json = r#"{"messages": [
//!     {"name": "Ping", "wire_id": 1, "fields": [
//!         {"tag": 1, "name": "nonce", "type": "uvarint", "required": true}
//!     ]}
//! ]}"#;
//!
//! let registry = SchemaDefinitions::from_json(json).unwrap().into_registry().unwrap();
//! assert_eq!(registry.get_wire_id("Ping"), Some(1));
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{FieldDescriptor, FieldType, MessageSchema, SchemaRegistry};
use crate::error::{CodecError, Result};

/// Field type names accepted in definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeName {
    Uvarint,
    Svarint,
    Bool,
    Enum,
    Bytes,
    Unicode,
    Message,
}

/// One field of a message definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub tag: u32,
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: TypeName,
    /// Referenced message name, for `"type": "message"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Allowed values, for `"type": "enum"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<u64>>,
    #[serde(default)]
    pub repeated: bool,
    #[serde(default)]
    pub required: bool,
}

/// One message definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wire_id: Option<u16>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

/// A set of message definitions, as loaded from JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDefinitions {
    pub messages: Vec<MessageDef>,
}

impl SchemaDefinitions {
    /// Parse definitions from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse definitions from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    /// Serialize definitions to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Resolve every definition into a schema.
    ///
    /// Returns schemas in definition order.
    ///
    /// # Errors
    ///
    /// `InvalidSchema` on duplicate message names, references to undefined
    /// messages, reference cycles, missing `message`/`values` attributes,
    /// or any field table error.
    pub fn resolve(&self) -> Result<Vec<Arc<MessageSchema>>> {
        let mut defs: HashMap<&str, &MessageDef> = HashMap::new();
        for def in &self.messages {
            if defs.insert(def.name.as_str(), def).is_some() {
                return Err(CodecError::InvalidSchema(format!(
                    "duplicate message definition '{}'",
                    def.name
                )));
            }
        }

        let mut resolver = Resolver {
            defs,
            resolved: HashMap::new(),
            in_progress: Vec::new(),
        };
        self.messages
            .iter()
            .map(|def| resolver.resolve(&def.name))
            .collect()
    }

    /// Resolve definitions and register them, with wire ids where given.
    pub fn into_registry(self) -> Result<SchemaRegistry> {
        let mut registry = SchemaRegistry::new();
        self.register_into(&mut registry)?;
        Ok(registry)
    }

    /// Resolve definitions and add them to an existing registry.
    pub fn register_into(&self, registry: &mut SchemaRegistry) -> Result<()> {
        for (def, schema) in self.messages.iter().zip(self.resolve()?) {
            match def.wire_id {
                Some(id) => registry.register_with_id(schema, id),
                None => registry.register(schema),
            }
        }
        Ok(())
    }
}

/// Depth-first resolution with cycle detection.
struct Resolver<'a> {
    defs: HashMap<&'a str, &'a MessageDef>,
    resolved: HashMap<&'a str, Arc<MessageSchema>>,
    in_progress: Vec<&'a str>,
}

impl<'a> Resolver<'a> {
    fn resolve(&mut self, name: &str) -> Result<Arc<MessageSchema>> {
        if let Some(schema) = self.resolved.get(name) {
            return Ok(schema.clone());
        }
        let def = *self
            .defs
            .get(name)
            .ok_or_else(|| CodecError::InvalidSchema(format!("undefined message '{}'", name)))?;
        if self.in_progress.contains(&def.name.as_str()) {
            return Err(CodecError::InvalidSchema(format!(
                "reference cycle through '{}'",
                def.name
            )));
        }

        self.in_progress.push(def.name.as_str());
        let fields = def
            .fields
            .iter()
            .map(|f| self.field(def, f))
            .collect::<Result<Vec<_>>>();
        self.in_progress.pop();

        let schema = Arc::new(MessageSchema::new(def.name.clone(), fields?)?);
        self.resolved.insert(def.name.as_str(), schema.clone());
        Ok(schema)
    }

    fn field(&mut self, def: &MessageDef, f: &FieldDef) -> Result<FieldDescriptor> {
        if f.values.is_some() && f.type_name != TypeName::Enum {
            return Err(CodecError::InvalidSchema(format!(
                "field '{}.{}' has values but is not an enum",
                def.name, f.name
            )));
        }
        if f.message.is_some() && f.type_name != TypeName::Message {
            return Err(CodecError::InvalidSchema(format!(
                "field '{}.{}' names a message but is not a message field",
                def.name, f.name
            )));
        }

        let field_type = match f.type_name {
            TypeName::Uvarint => FieldType::UVarint,
            TypeName::Svarint => FieldType::SVarint,
            TypeName::Bool => FieldType::Bool,
            TypeName::Bytes => FieldType::Bytes,
            TypeName::Unicode => FieldType::Unicode,
            TypeName::Enum => {
                let values = f.values.clone().ok_or_else(|| {
                    CodecError::InvalidSchema(format!(
                        "enum field '{}.{}' has no values",
                        def.name, f.name
                    ))
                })?;
                FieldType::Enum(values)
            }
            TypeName::Message => {
                let target = f.message.as_deref().ok_or_else(|| {
                    CodecError::InvalidSchema(format!(
                        "message field '{}.{}' names no message",
                        def.name, f.name
                    ))
                })?;
                FieldType::Message(self.resolve(target)?)
            }
        };

        let mut field = FieldDescriptor::new(f.tag, f.name.clone(), field_type);
        if f.repeated {
            field = field.repeated();
        }
        if f.required {
            field = field.required();
        }
        Ok(field)
    }
}
