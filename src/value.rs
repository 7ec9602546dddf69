//! Dynamic message instances.
//!
//! A [`Message`] is a type name plus a mapping from field name to [`Value`].
//! Absent fields have no entry. Repeated fields are always a
//! [`Value::Repeated`], empty when nothing was set or decoded.
//!
//! # Example
//!
//! ```
//! use pbwire::schema::{FieldType, MessageSchema};
//! use pbwire::Message;
//!
//! let schema = MessageSchema::builder("TxOutputType")
//!     .optional(1, "address", FieldType::Unicode)
//!     .repeated(2, "address_n", FieldType::UVarint)
//!     .build()
//!     .unwrap();
//!
//! let mut msg = Message::new(&schema);
//! msg.set("address", "1BoatSLRHtKNngkdXEeobR76b53LETtpyT");
//! msg.push("address_n", 44u64);
//!
//! assert_eq!(msg.get_str("address"), Some("1BoatSLRHtKNngkdXEeobR76b53LETtpyT"));
//! assert_eq!(msg.get_repeated("address_n").unwrap().len(), 1);
//! ```

use std::collections::BTreeMap;

use bytes::Bytes;

use crate::schema::MessageSchema;

/// A single field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Unsigned integer (uvarint and enum fields).
    UInt(u64),
    /// Signed integer (svarint fields).
    SInt(i64),
    /// Boolean.
    Bool(bool),
    /// Raw bytes.
    Bytes(Bytes),
    /// UTF-8 string.
    String(String),
    /// Nested message.
    Message(Message),
    /// Elements of a repeated field, in wire order.
    Repeated(Vec<Value>),
}

impl Value {
    /// Name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::UInt(_) => "uint",
            Value::SInt(_) => "sint",
            Value::Bool(_) => "bool",
            Value::Bytes(_) => "bytes",
            Value::String(_) => "string",
            Value::Message(_) => "message",
            Value::Repeated(_) => "repeated",
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::UInt(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::SInt(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Value::Bytes(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_message(&self) -> Option<&Message> {
        match self {
            Value::Message(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_repeated(&self) -> Option<&[Value]> {
        match self {
            Value::Repeated(v) => Some(v),
            _ => None,
        }
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::UInt(u64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::SInt(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<Bytes> for Value {
    fn from(v: Bytes) -> Self {
        Value::Bytes(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(Bytes::from(v))
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(Bytes::copy_from_slice(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Message> for Value {
    fn from(v: Message) -> Self {
        Value::Message(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Repeated(v)
    }
}

/// An instance of one message type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    type_name: String,
    fields: BTreeMap<String, Value>,
}

impl Message {
    /// Create an instance with every repeated field set to an empty sequence
    /// and everything else absent.
    pub fn new(schema: &MessageSchema) -> Self {
        let fields = schema
            .fields()
            .filter(|f| f.is_repeated())
            .map(|f| (f.name.clone(), Value::Repeated(Vec::new())))
            .collect();
        Self {
            type_name: schema.name().to_string(),
            fields,
        }
    }

    /// Message type name.
    #[inline]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Set a field, replacing any previous value.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a field when `value` is `Some`, remove it otherwise.
    pub fn set_opt<V: Into<Value>>(&mut self, name: &str, value: Option<V>) -> &mut Self {
        match value {
            Some(v) => self.set(name, v),
            None => {
                self.fields.remove(name);
                self
            }
        }
    }

    /// Append an element to a repeated field.
    ///
    /// A non-repeated value already stored under `name` is replaced by a
    /// sequence holding only the new element.
    pub fn push(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        let value = value.into();
        match self.fields.get_mut(name) {
            Some(Value::Repeated(items)) => items.push(value),
            _ => {
                self.fields
                    .insert(name.to_string(), Value::Repeated(vec![value]));
            }
        }
        self
    }

    /// Remove a field, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    /// Get a field value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Check whether a field is present.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn get_u64(&self, name: &str) -> Option<u64> {
        self.get(name).and_then(Value::as_u64)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn get_bytes(&self, name: &str) -> Option<&Bytes> {
        self.get(name).and_then(Value::as_bytes)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn get_message(&self, name: &str) -> Option<&Message> {
        self.get(name).and_then(Value::as_message)
    }

    pub fn get_repeated(&self, name: &str) -> Option<&[Value]> {
        self.get(name).and_then(Value::as_repeated)
    }

    /// Iterate present fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of present fields (empty repeated fields included).
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if no field is present.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn fields_mut(&mut self) -> &mut BTreeMap<String, Value> {
        &mut self.fields
    }
}
