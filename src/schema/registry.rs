//! Schema registry for looking up message types by name or wire id.
//!
//! The transport layer identifies messages by a numeric type id; the
//! registry maps those ids (and names) to shared schemas so a raw payload can
//! be decoded without knowing its type statically.
//!
//! # Example
//!
//! ```
//! use pbwire::schema::{FieldType, MessageSchema, SchemaRegistry};
//!
//! let mut registry = SchemaRegistry::new();
//! let schema = MessageSchema::builder("HelloWorldResponse")
//!     .required(1, "text", FieldType::Unicode)
//!     .build()
//!     .unwrap();
//! registry.register_with_id(schema, 901);
//!
//! let decoded = registry.decode_by_id(901, &[0x0A, 0x02, b'h', b'i']).unwrap();
//! assert_eq!(decoded.get_str("text"), Some("hi"));
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;

use super::MessageSchema;
use crate::codec::MessageCodec;
use crate::error::{CodecError, Result};
use crate::value::Message;

/// Entry for a registered message type.
struct SchemaEntry {
    /// Shared schema.
    schema: Arc<MessageSchema>,
    /// Numeric wire id, if the type is addressable by id.
    wire_id: Option<u16>,
}

/// Registry mapping message names and wire ids to schemas.
pub struct SchemaRegistry {
    /// Schemas by message name.
    schemas: HashMap<String, SchemaEntry>,
    /// Wire id to name mapping (for dispatch).
    id_to_name: HashMap<u16, String>,
    /// Codec used by the decode/encode helpers.
    codec: MessageCodec,
}

impl SchemaRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::with_codec(MessageCodec::new())
    }

    /// Create a registry whose helpers use the given codec.
    pub fn with_codec(codec: MessageCodec) -> Self {
        Self {
            schemas: HashMap::new(),
            id_to_name: HashMap::new(),
            codec,
        }
    }

    /// Register a schema by name only.
    pub fn register(&mut self, schema: Arc<MessageSchema>) {
        self.insert(schema, None);
    }

    /// Register a schema by name and wire id.
    pub fn register_with_id(&mut self, schema: Arc<MessageSchema>, wire_id: u16) {
        self.insert(schema, Some(wire_id));
    }

    fn insert(&mut self, schema: Arc<MessageSchema>, wire_id: Option<u16>) {
        let name = schema.name().to_string();

        if let Some(old) = self.schemas.remove(&name) {
            tracing::warn!(message_type = %name, "Replacing registered schema");
            if let Some(id) = old.wire_id {
                self.id_to_name.remove(&id);
            }
        }
        if let Some(id) = wire_id {
            if let Some(previous) = self.id_to_name.insert(id, name.clone()) {
                tracing::warn!(wire_id = id, previous = %previous, message_type = %name, "Wire id reassigned");
                if let Some(entry) = self.schemas.get_mut(&previous) {
                    entry.wire_id = None;
                }
            }
        }

        tracing::debug!(message_type = %name, ?wire_id, "Registered schema");
        self.schemas.insert(name, SchemaEntry { schema, wire_id });
    }

    /// Get a schema by message name.
    pub fn get(&self, name: &str) -> Option<&Arc<MessageSchema>> {
        self.schemas.get(name).map(|e| &e.schema)
    }

    /// Get a schema by wire id.
    pub fn get_by_id(&self, wire_id: u16) -> Option<&Arc<MessageSchema>> {
        self.id_to_name
            .get(&wire_id)
            .and_then(|name| self.get(name))
    }

    /// Get the wire id of a message type.
    pub fn get_wire_id(&self, name: &str) -> Option<u16> {
        self.schemas.get(name).and_then(|e| e.wire_id)
    }

    /// Get the message name for a wire id.
    pub fn get_name(&self, wire_id: u16) -> Option<&str> {
        self.id_to_name.get(&wire_id).map(|s| s.as_str())
    }

    /// Iterate registered message names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(|s| s.as_str())
    }

    /// Number of registered schemas.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Decode a payload whose type is given by wire id.
    pub fn decode_by_id(&self, wire_id: u16, data: &[u8]) -> Result<Message> {
        let schema = self
            .get_by_id(wire_id)
            .ok_or_else(|| CodecError::UnknownMessageType(format!("wire id {}", wire_id)))?;
        self.codec.decode(schema, data)
    }

    /// Decode a payload whose type is given by name.
    pub fn decode_by_name(&self, name: &str, data: &[u8]) -> Result<Message> {
        self.codec.decode(self.require(name)?, data)
    }

    /// Encode a message using the schema registered under its type name.
    ///
    /// Returns the wire id (if any) together with the payload, ready for
    /// the transport layer.
    pub fn encode(&self, msg: &Message) -> Result<(Option<u16>, Bytes)> {
        let name = msg.type_name();
        let schema = self.require(name)?;
        let payload = self.codec.encode(schema, msg)?;
        Ok((self.get_wire_id(name), payload))
    }

    /// Encode a message with the schema registered under `name`.
    ///
    /// Fails with `SchemaMismatch` if the message is of another type.
    pub fn encode_by_name(&self, name: &str, msg: &Message) -> Result<Bytes> {
        self.codec.encode(self.require(name)?, msg)
    }

    fn require(&self, name: &str) -> Result<&Arc<MessageSchema>> {
        self.get(name)
            .ok_or_else(|| CodecError::UnknownMessageType(name.to_string()))
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldType;
    use std::fmt;
    use std::sync::Mutex;
    use tracing::field::{Field, Visit};
    use tracing::span;
    use tracing::{Event, Metadata, Subscriber};

    /// Subscriber that keeps every event as a list of (field, value) pairs.
    #[derive(Clone, Default)]
    struct EventRecorder {
        events: Arc<Mutex<Vec<Vec<(String, String)>>>>,
    }

    struct FieldList(Vec<(String, String)>);

    impl Visit for FieldList {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            self.0.push((field.name().to_string(), format!("{:?}", value)));
        }
    }

    impl Subscriber for EventRecorder {
        fn enabled(&self, _: &Metadata<'_>) -> bool {
            true
        }

        fn new_span(&self, _: &span::Attributes<'_>) -> span::Id {
            span::Id::from_u64(1)
        }

        fn record(&self, _: &span::Id, _: &span::Record<'_>) {}

        fn record_follows_from(&self, _: &span::Id, _: &span::Id) {}

        fn event(&self, event: &Event<'_>) {
            let mut fields = FieldList(Vec::new());
            event.record(&mut fields);
            self.events.lock().unwrap().push(fields.0);
        }

        fn enter(&self, _: &span::Id) {}

        fn exit(&self, _: &span::Id) {}
    }

    fn value_of<'a>(fields: &'a [(String, String)], name: &str) -> Vec<&'a str> {
        fields
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    fn named(name: &str) -> Arc<MessageSchema> {
        MessageSchema::builder(name)
            .optional(1, "value", FieldType::UVarint)
            .build()
            .unwrap()
    }

    #[test]
    fn test_register_by_name() {
        let mut registry = SchemaRegistry::new();
        registry.register(named("Ping"));

        assert!(registry.get("Ping").is_some());
        assert_eq!(registry.get_wire_id("Ping"), None);
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_register_with_id() {
        let mut registry = SchemaRegistry::new();
        registry.register_with_id(named("Ping"), 1);
        registry.register_with_id(named("Pong"), 2);

        assert_eq!(registry.get_wire_id("Pong"), Some(2));
        assert_eq!(registry.get_name(1), Some("Ping"));
        assert_eq!(registry.get_by_id(2).unwrap().name(), "Pong");

        let mut names: Vec<&str> = registry.names().collect();
        names.sort_unstable();
        assert_eq!(names, vec!["Ping", "Pong"]);
    }

    #[test]
    fn test_reregister_replaces_id() {
        let mut registry = SchemaRegistry::new();
        registry.register_with_id(named("Ping"), 1);
        registry.register_with_id(named("Ping"), 5);

        assert_eq!(registry.get_wire_id("Ping"), Some(5));
        assert!(registry.get_by_id(1).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_id_reassigned_to_other_message() {
        let mut registry = SchemaRegistry::new();
        registry.register_with_id(named("Ping"), 1);
        registry.register_with_id(named("Pong"), 1);

        assert_eq!(registry.get_name(1), Some("Pong"));
        assert_eq!(registry.get_wire_id("Ping"), None);
        assert!(registry.get("Ping").is_some());
    }

    #[test]
    fn test_unknown_message_type() {
        let registry = SchemaRegistry::new();
        assert!(matches!(
            registry.decode_by_id(99, &[]).unwrap_err(),
            CodecError::UnknownMessageType(_)
        ));
        assert!(registry.decode_by_name("Nope", &[]).is_err());
    }

    #[test]
    fn test_encode_and_decode_through_registry() {
        let mut registry = SchemaRegistry::new();
        let schema = named("Ping");
        registry.register_with_id(schema.clone(), 7);

        let msg = Message::new(&schema).with("value", 42u64);
        let (wire_id, payload) = registry.encode(&msg).unwrap();
        assert_eq!(wire_id, Some(7));
        assert_eq!(registry.decode_by_id(7, &payload).unwrap(), msg);
        assert_eq!(registry.decode_by_name("Ping", &payload).unwrap(), msg);
        assert_eq!(registry.encode_by_name("Ping", &msg).unwrap(), payload);
    }

    #[test]
    fn test_encode_by_name_type_mismatch() {
        let mut registry = SchemaRegistry::new();
        registry.register(named("Ping"));
        registry.register(named("Pong"));

        let msg = Message::new(&named("Ping")).with("value", 1u64);
        assert!(matches!(
            registry.encode_by_name("Pong", &msg).unwrap_err(),
            CodecError::SchemaMismatch { .. }
        ));
    }

    #[test]
    fn test_log_events_keep_text_and_type_apart() {
        let recorder = EventRecorder::default();
        tracing::subscriber::with_default(recorder.clone(), || {
            let mut registry = SchemaRegistry::new();
            registry.register_with_id(named("Ping"), 1);
            registry.register_with_id(named("Ping"), 2);
            registry.register_with_id(named("Pong"), 2);
            // unknown tag 9 is skipped during decode
            registry.decode_by_name("Ping", &[0x48, 0x01]).unwrap();
        });

        let events = recorder.events.lock().unwrap();
        assert!(events.len() >= 5);
        for fields in events.iter() {
            assert_eq!(value_of(fields, "message").len(), 1, "{:?}", fields);
            assert_eq!(value_of(fields, "message_type").len(), 1, "{:?}", fields);
        }

        let replaced = events
            .iter()
            .find(|f| value_of(f, "message") == ["Replacing registered schema"])
            .unwrap();
        assert_eq!(value_of(replaced, "message_type"), ["Ping"]);

        let skipped = events
            .iter()
            .find(|f| value_of(f, "message") == ["Skipping unknown field"])
            .unwrap();
        assert_eq!(value_of(skipped, "message_type"), ["\"Ping\""]);
        assert_eq!(value_of(skipped, "tag"), ["9"]);
    }
}
