//! # pbwire
//!
//! Schema-driven encoder/decoder for the protobuf wire format.
//!
//! Messages are described by field tables ([`MessageSchema`]) instead of
//! generated code. A single interpreter walks the table to turn a
//! [`Message`] into bytes and back.
//!
//! ## Layout
//!
//! - [`protocol`] - varints, zigzag, field keys, skipping unknown values
//! - [`schema`] - field tables, registry, JSON definitions
//! - [`codec`] - the encoder/decoder and typed message support
//! - [`messages`] - built-in message types
//!
//! ## Example
//!
//! ```
//! use pbwire::messages::{OutputScriptType, TxOutputType};
//! use pbwire::{MessageCodec, ProtoMessage};
//!
//! let output = TxOutputType {
//!     address: Some("1BoatSLRHtKNngkdXEeobR76b53LETtpyT".to_string()),
//!     amount: 50_000,
//!     script_type: OutputScriptType::PayToAddress,
//!     ..Default::default()
//! };
//!
//! let codec = MessageCodec::new();
//! let bytes = codec.encode_typed(&output).unwrap();
//! let decoded: TxOutputType = codec.decode_typed(&bytes).unwrap();
//! assert_eq!(decoded, output);
//!
//! // The same bytes through the dynamic interface.
//! let msg = codec.decode(&TxOutputType::schema(), &bytes).unwrap();
//! assert_eq!(msg.get_u64("amount"), Some(50_000));
//! ```

pub mod codec;
pub mod error;
pub mod messages;
pub mod protocol;
pub mod schema;

mod value;

pub use codec::{CodecConfig, MessageCodec, ProtoMessage};
pub use error::{CodecError, Result};
pub use schema::{FieldDescriptor, FieldType, MessageSchema, SchemaRegistry};
pub use value::{Message, Value};
