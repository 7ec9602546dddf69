//! Fixed-shape message types.
//!
//! A [`ProtoMessage`] is a plain Rust struct with a static schema. It goes
//! through the same schema interpreter as dynamic messages: the struct is
//! converted to a [`Message`] before encoding and populated from one after
//! decoding, by keyed lookup.
//!
//! The helper functions in this module do that lookup with type checking.

use std::sync::Arc;

use bytes::Bytes;

use crate::error::{CodecError, Result};
use crate::schema::MessageSchema;
use crate::value::{Message, Value};

/// A message type with a compile-time known field set.
pub trait ProtoMessage: Sized {
    /// Shared schema describing the wire layout.
    fn schema() -> Arc<MessageSchema>;

    /// Convert into a dynamic message for encoding.
    fn to_message(&self) -> Message;

    /// Populate from a decoded dynamic message.
    fn from_message(msg: &Message) -> Result<Self>;
}

/// Scalar types that can be read out of a [`Value`].
pub trait FromValue: Sized {
    /// Convert a field value, failing with `SchemaMismatch` on the wrong
    /// variant.
    fn from_value(field: &str, value: &Value) -> Result<Self>;
}

impl FromValue for u64 {
    fn from_value(field: &str, value: &Value) -> Result<Self> {
        value.as_u64().ok_or_else(|| mismatch(field, "uint", value))
    }
}

impl FromValue for u32 {
    fn from_value(field: &str, value: &Value) -> Result<Self> {
        let v = u64::from_value(field, value)?;
        u32::try_from(v).map_err(|_| CodecError::ValueOutOfRange {
            field: field.to_string(),
            value: v,
            max: u64::from(u32::MAX),
        })
    }
}

impl FromValue for i64 {
    fn from_value(field: &str, value: &Value) -> Result<Self> {
        value.as_i64().ok_or_else(|| mismatch(field, "sint", value))
    }
}

impl FromValue for bool {
    fn from_value(field: &str, value: &Value) -> Result<Self> {
        value.as_bool().ok_or_else(|| mismatch(field, "bool", value))
    }
}

impl FromValue for Bytes {
    fn from_value(field: &str, value: &Value) -> Result<Self> {
        value
            .as_bytes()
            .cloned()
            .ok_or_else(|| mismatch(field, "bytes", value))
    }
}

impl FromValue for String {
    fn from_value(field: &str, value: &Value) -> Result<Self> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| mismatch(field, "string", value))
    }
}

/// Read an optional scalar field.
pub fn optional<T: FromValue>(msg: &Message, name: &str) -> Result<Option<T>> {
    msg.get(name).map(|v| T::from_value(name, v)).transpose()
}

/// Read a required scalar field.
pub fn required<T: FromValue>(msg: &Message, name: &str) -> Result<T> {
    optional(msg, name)?.ok_or_else(|| missing(msg, name))
}

/// Read a repeated scalar field. Absent is treated as empty.
pub fn repeated<T: FromValue>(msg: &Message, name: &str) -> Result<Vec<T>> {
    repeated_values(msg, name)?
        .iter()
        .map(|v| T::from_value(name, v))
        .collect()
}

/// Read an optional nested message field.
pub fn optional_message<T: ProtoMessage>(msg: &Message, name: &str) -> Result<Option<T>> {
    match msg.get(name) {
        None => Ok(None),
        Some(Value::Message(nested)) => T::from_message(nested).map(Some),
        Some(other) => Err(mismatch(name, "message", other)),
    }
}

/// Read a required nested message field.
pub fn required_message<T: ProtoMessage>(msg: &Message, name: &str) -> Result<T> {
    optional_message(msg, name)?.ok_or_else(|| missing(msg, name))
}

/// Read a repeated nested message field. Absent is treated as empty.
pub fn repeated_message<T: ProtoMessage>(msg: &Message, name: &str) -> Result<Vec<T>> {
    repeated_values(msg, name)?
        .iter()
        .map(|v| match v {
            Value::Message(nested) => T::from_message(nested),
            other => Err(mismatch(name, "message", other)),
        })
        .collect()
}

/// Build a repeated [`Value`] from scalars.
pub fn to_repeated<T: Clone + Into<Value>>(items: &[T]) -> Value {
    Value::Repeated(items.iter().cloned().map(Into::into).collect())
}

/// Build a repeated [`Value`] from nested messages.
pub fn to_repeated_messages<T: ProtoMessage>(items: &[T]) -> Value {
    Value::Repeated(
        items
            .iter()
            .map(|m| Value::Message(m.to_message()))
            .collect(),
    )
}

fn repeated_values<'a>(msg: &'a Message, name: &str) -> Result<&'a [Value]> {
    match msg.get(name) {
        None => Ok(&[]),
        Some(Value::Repeated(items)) => Ok(items),
        Some(other) => Err(mismatch(name, "repeated", other)),
    }
}

fn mismatch(field: &str, expected: &str, value: &Value) -> CodecError {
    CodecError::SchemaMismatch {
        field: field.to_string(),
        expected: expected.to_string(),
        found: value.type_name().to_string(),
    }
}

fn missing(msg: &Message, name: &str) -> CodecError {
    CodecError::MissingRequiredField {
        message: msg.type_name().to_string(),
        field: name.to_string(),
    }
}
