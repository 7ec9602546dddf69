//! Field descriptors.

use std::sync::Arc;

use super::MessageSchema;
use crate::error::{CodecError, Result};
use crate::protocol::{validate_tag, WireType};

/// Flag constants for field descriptors.
pub mod flags {
    /// Field may occur any number of times.
    pub const REPEATED: u8 = 0b0000_0001;
    /// Field must be present.
    pub const REQUIRED: u8 = 0b0000_0010;

    /// Check if a specific flag is set.
    #[inline]
    pub fn has_flag(flags: u8, flag: u8) -> bool {
        flags & flag != 0
    }
}

/// Coarse wire category of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireKind {
    Varint,
    LengthDelimited,
    NestedMessage,
}

/// Logical type of a field.
#[derive(Debug, Clone)]
pub enum FieldType {
    /// Unsigned varint.
    UVarint,
    /// Signed varint, zigzag mapped.
    SVarint,
    /// Varint 0 or 1.
    Bool,
    /// Unsigned varint restricted to a fixed set of values.
    Enum(Vec<u64>),
    /// Raw byte sequence.
    Bytes,
    /// UTF-8 string.
    Unicode,
    /// Nested message described by a shared schema.
    Message(Arc<MessageSchema>),
}

impl FieldType {
    /// Wire category of this type.
    pub fn kind(&self) -> WireKind {
        match self {
            FieldType::UVarint | FieldType::SVarint | FieldType::Bool | FieldType::Enum(_) => {
                WireKind::Varint
            }
            FieldType::Bytes | FieldType::Unicode => WireKind::LengthDelimited,
            FieldType::Message(_) => WireKind::NestedMessage,
        }
    }

    /// Wire type written in the field key.
    pub fn wire_type(&self) -> WireType {
        match self.kind() {
            WireKind::Varint => WireType::Varint,
            WireKind::LengthDelimited | WireKind::NestedMessage => WireType::LengthDelimited,
        }
    }

    /// Check whether this type is varint-encoded.
    #[inline]
    pub fn is_varint(&self) -> bool {
        self.kind() == WireKind::Varint
    }

    /// Name used in error messages and schema definitions.
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::UVarint => "uvarint",
            FieldType::SVarint => "svarint",
            FieldType::Bool => "bool",
            FieldType::Enum(_) => "enum",
            FieldType::Bytes => "bytes",
            FieldType::Unicode => "unicode",
            FieldType::Message(_) => "message",
        }
    }
}

/// One entry of a message field table.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Field tag, unique within the schema.
    pub tag: u32,
    /// Field name, unique within the schema.
    pub name: String,
    /// Logical type.
    pub field_type: FieldType,
    /// Flags byte (see `flags` module).
    pub flags: u8,
}

impl FieldDescriptor {
    /// Create an optional, non-repeated field.
    pub fn new(tag: u32, name: impl Into<String>, field_type: FieldType) -> Self {
        Self::with_flags(tag, name, field_type, 0)
    }

    /// Create a field with explicit flags.
    pub fn with_flags(tag: u32, name: impl Into<String>, field_type: FieldType, flags: u8) -> Self {
        Self {
            tag,
            name: name.into(),
            field_type,
            flags,
        }
    }

    /// Mark the field as repeated.
    pub fn repeated(mut self) -> Self {
        self.flags |= flags::REPEATED;
        self
    }

    /// Mark the field as required.
    pub fn required(mut self) -> Self {
        self.flags |= flags::REQUIRED;
        self
    }

    #[inline]
    pub fn is_repeated(&self) -> bool {
        flags::has_flag(self.flags, flags::REPEATED)
    }

    #[inline]
    pub fn is_required(&self) -> bool {
        flags::has_flag(self.flags, flags::REQUIRED)
    }

    /// Nested schema for message fields.
    pub fn message_schema(&self) -> Option<&Arc<MessageSchema>> {
        match &self.field_type {
            FieldType::Message(schema) => Some(schema),
            _ => None,
        }
    }

    /// Validate the descriptor on its own.
    ///
    /// Checks:
    /// - Tag is in range
    /// - Name is not empty
    /// - Repeated and required are not both set
    /// - Enum fields declare at least one value
    pub fn validate(&self) -> Result<()> {
        validate_tag(self.tag)?;
        if self.name.is_empty() {
            return Err(invalid(format!("field with tag {} has no name", self.tag)));
        }
        if self.is_repeated() && self.is_required() {
            return Err(invalid(format!(
                "field '{}' cannot be both repeated and required",
                self.name
            )));
        }
        if let FieldType::Enum(values) = &self.field_type {
            if values.is_empty() {
                return Err(invalid(format!("enum field '{}' has no values", self.name)));
            }
        }
        Ok(())
    }
}

fn invalid(msg: String) -> CodecError {
    CodecError::InvalidSchema(msg)
}
