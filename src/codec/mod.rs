//! Codec module - schema-driven encoding and decoding of messages.
//!
//! This module provides a single interpreter over [`MessageSchema`] field
//! tables:
//!
//! - [`MessageCodec`] - encode/decode with configurable limits
//! - [`ProtoMessage`] - fixed-shape structs that go through the same codec
//! - [`encode`] / [`decode`] - shortcuts using the default configuration
//!
//! # Design
//!
//! There is no per-message serialization code. Encoding walks the schema in
//! tag order; decoding walks the buffer and looks each tag up in the schema.
//! Nested messages recurse with the nested schema.
//!
//! # Example
//!
//! ```
//! use pbwire::codec::MessageCodec;
//! use pbwire::schema::{FieldType, MessageSchema};
//! use pbwire::Message;
//!
//! let inner = MessageSchema::builder("Inner")
//!     .required(1, "x", FieldType::UVarint)
//!     .build()
//!     .unwrap();
//! let outer = MessageSchema::builder("Outer")
//!     .optional(1, "nested", FieldType::Message(inner.clone()))
//!     .build()
//!     .unwrap();
//!
//! let msg = Message::new(&outer).with("nested", Message::new(&inner).with("x", 5u64));
//!
//! let codec = MessageCodec::new();
//! let bytes = codec.encode(&outer, &msg).unwrap();
//! assert_eq!(&bytes[..], &[0x0A, 0x02, 0x08, 0x05]);
//!
//! let decoded = codec.decode(&outer, &bytes).unwrap();
//! assert_eq!(decoded.get_message("nested").unwrap().get_u64("x"), Some(5));
//! ```

mod config;
mod decode;
mod encode;
pub mod typed;

pub use config::{CodecConfig, DEFAULT_MAX_DEPTH, DEFAULT_MAX_MESSAGE_SIZE};
pub use typed::{FromValue, ProtoMessage};

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{CodecError, Result};
use crate::schema::MessageSchema;
use crate::value::Message;

/// Schema-driven message codec.
///
/// Holds only its configuration; schemas are passed per call. Cheap to
/// clone and safe to share between threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageCodec {
    config: CodecConfig,
}

impl MessageCodec {
    /// Create a codec with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a codec with custom limits.
    pub fn with_config(config: CodecConfig) -> Self {
        Self { config }
    }

    /// Get the active configuration.
    #[inline]
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Encode a message to a new buffer.
    ///
    /// # Errors
    ///
    /// - `SchemaMismatch` if a value does not fit its field type
    /// - `MissingRequiredField` if a required field is absent
    /// - `UnknownField` if the message carries an undeclared field
    /// - `InvalidEnumValue`, `RecursionLimit`
    pub fn encode(&self, schema: &MessageSchema, msg: &Message) -> Result<Bytes> {
        let sized = encode::measure(schema, msg, &self.config)?;
        let mut buf = BytesMut::with_capacity(sized.len);
        encode::write_message(schema, msg, &mut buf, &sized)?;
        debug_assert_eq!(buf.len(), sized.len);
        Ok(buf.freeze())
    }

    /// Encode a message into an existing buffer.
    ///
    /// Returns the number of bytes written. Nothing is written on failure.
    ///
    /// # Errors
    ///
    /// Same as [`encode`](Self::encode), plus `MessageTooLarge` if `buf`
    /// cannot hold the encoded message.
    pub fn encode_into<B: BufMut>(
        &self,
        schema: &MessageSchema,
        msg: &Message,
        buf: &mut B,
    ) -> Result<usize> {
        let sized = encode::measure(schema, msg, &self.config)?;
        if buf.remaining_mut() < sized.len {
            return Err(CodecError::MessageTooLarge {
                size: sized.len,
                max: buf.remaining_mut(),
            });
        }
        encode::write_message(schema, msg, buf, &sized)?;
        Ok(sized.len)
    }

    /// Exact number of bytes [`encode`](Self::encode) would produce.
    pub fn encoded_len(&self, schema: &MessageSchema, msg: &Message) -> Result<usize> {
        encode::message_len(schema, msg, &self.config, 0)
    }

    /// Decode a message from a byte slice.
    ///
    /// Byte fields are copied out of `data`. Use
    /// [`decode_bytes`](Self::decode_bytes) to share the input buffer instead.
    ///
    /// # Errors
    ///
    /// - `TruncatedInput` if a value runs past the end of `data`
    /// - `MissingRequiredField` if a required field never appeared
    /// - `IntegerOverflow`, `UnknownWireType`, `InvalidTag`
    /// - `SchemaMismatch` if a known tag has an incompatible wire type
    /// - `MessageTooLarge` if `data` exceeds the configured maximum
    pub fn decode(&self, schema: &MessageSchema, data: &[u8]) -> Result<Message> {
        self.check_size(data.len())?;
        let mut buf = data;
        decode::decode_message(schema, &mut buf, &self.config, 0)
    }

    /// Decode a message from `Bytes` (zero-copy for byte fields).
    pub fn decode_bytes(&self, schema: &MessageSchema, data: Bytes) -> Result<Message> {
        self.check_size(data.len())?;
        let mut buf = data;
        decode::decode_message(schema, &mut buf, &self.config, 0)
    }

    /// Encode a fixed-shape message.
    pub fn encode_typed<T: ProtoMessage>(&self, value: &T) -> Result<Bytes> {
        self.encode(&T::schema(), &value.to_message())
    }

    /// Decode a fixed-shape message.
    pub fn decode_typed<T: ProtoMessage>(&self, data: &[u8]) -> Result<T> {
        let msg = self.decode(&T::schema(), data)?;
        T::from_message(&msg)
    }

    fn check_size(&self, size: usize) -> Result<()> {
        if size > self.config.max_message_size {
            return Err(CodecError::MessageTooLarge {
                size,
                max: self.config.max_message_size,
            });
        }
        Ok(())
    }
}

/// Encode a message with the default configuration.
#[inline]
pub fn encode(schema: &MessageSchema, msg: &Message) -> Result<Bytes> {
    MessageCodec::new().encode(schema, msg)
}

/// Decode a message with the default configuration.
#[inline]
pub fn decode(schema: &MessageSchema, data: &[u8]) -> Result<Message> {
    MessageCodec::new().decode(schema, data)
}

/// Encoded size of a message with the default configuration.
#[inline]
pub fn encoded_len(schema: &MessageSchema, msg: &Message) -> Result<usize> {
    MessageCodec::new().encoded_len(schema, msg)
}
