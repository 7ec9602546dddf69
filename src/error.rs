//! Error types for pbwire.

use thiserror::Error;

/// Main error type for all encode/decode and schema operations.
#[derive(Debug, Error)]
pub enum CodecError {
    /// A value does not match the declared type of its field, or a known tag
    /// arrived with a wire type that cannot carry the declared field type.
    #[error("Schema mismatch for field '{field}': expected {expected}, found {found}")]
    SchemaMismatch {
        field: String,
        expected: String,
        found: String,
    },

    /// A required field is absent.
    #[error("Missing required field '{field}' in message {message}")]
    MissingRequiredField { message: String, field: String },

    /// A varint or length-delimited value runs past the end of the input.
    #[error("Truncated input: need {needed} bytes, have {available}")]
    TruncatedInput { needed: usize, available: usize },

    /// A varint does not fit in 64 bits, or a length does not fit in `usize`.
    #[error("Integer overflow while decoding varint")]
    IntegerOverflow,

    /// A decoded value is valid on the wire but too large for its target.
    #[error("Value {value} for field '{field}' exceeds maximum {max}")]
    ValueOutOfRange { field: String, value: u64, max: u64 },

    /// Wire type bits in a field key are not one of 0, 1, 2, 5.
    #[error("Unknown wire type: {0}")]
    UnknownWireType(u8),

    /// Field tag is zero or above the protobuf maximum.
    #[error("Invalid field tag: {0}")]
    InvalidTag(u64),

    /// String field carries bytes that are not UTF-8.
    #[error("Invalid UTF-8 in field '{field}'")]
    InvalidUtf8 { field: String },

    /// Enum field carries a value outside its declared set.
    #[error("Invalid value {value} for enum field '{field}'")]
    InvalidEnumValue { field: String, value: u64 },

    /// A message instance names a field its schema does not declare.
    #[error("Unknown field '{field}' for message {message}")]
    UnknownField { message: String, field: String },

    /// Nested messages exceed the configured depth.
    #[error("Nesting depth exceeds limit {0}")]
    RecursionLimit(usize),

    /// Input buffer exceeds the configured maximum message size.
    #[error("Message size {size} exceeds maximum {max}")]
    MessageTooLarge { size: usize, max: usize },

    /// No schema registered under the given name or wire id.
    #[error("Unknown message type: {0}")]
    UnknownMessageType(String),

    /// Schema construction or definition resolution failed.
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// JSON error while parsing schema definitions.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error while reading schema definitions.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using CodecError.
pub type Result<T> = std::result::Result<T, CodecError>;
