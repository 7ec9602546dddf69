//! Field keys and wire types.
//!
//! Every field on the wire starts with a varint key:
//! ```text
//! ┌──────────────────────────┬────────────┐
//! │ Field tag                │ Wire type  │
//! │ bits 3..                 │ bits 0-2   │
//! └──────────────────────────┴────────────┘
//! ```
//!
//! The encoder only emits wire types 0 (varint) and 2 (length-delimited).
//! Wire types 1 and 5 are understood well enough to skip unknown fields.

use bytes::{Buf, BufMut};

use super::varint::{decode_uvarint, encode_uvarint, uvarint_len};
use crate::error::{CodecError, Result};

/// Smallest valid field tag.
pub const MIN_TAG: u32 = 1;

/// Largest valid field tag (2^29 - 1).
pub const MAX_TAG: u32 = (1 << 29) - 1;

/// Number of low key bits holding the wire type.
pub const WIRE_TYPE_BITS: u32 = 3;

/// Mask selecting the wire type bits of a key.
pub const WIRE_TYPE_MASK: u64 = 0b111;

/// On-wire category of a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WireType {
    /// Base-128 varint.
    Varint = 0,
    /// 8 raw bytes, little endian.
    Fixed64 = 1,
    /// Varint length followed by that many bytes.
    LengthDelimited = 2,
    /// 4 raw bytes, little endian.
    Fixed32 = 5,
}

impl WireType {
    /// Numeric value stored in the key.
    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Human-readable name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            WireType::Varint => "varint",
            WireType::Fixed64 => "fixed64",
            WireType::LengthDelimited => "length-delimited",
            WireType::Fixed32 => "fixed32",
        }
    }
}

impl TryFrom<u8> for WireType {
    type Error = CodecError;

    /// Groups (3, 4) are rejected along with the unassigned values 6 and 7.
    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::Fixed64),
            2 => Ok(WireType::LengthDelimited),
            5 => Ok(WireType::Fixed32),
            other => Err(CodecError::UnknownWireType(other)),
        }
    }
}

/// Decoded field key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Key {
    /// Field tag (1..=MAX_TAG).
    pub tag: u32,
    /// Wire type of the value that follows.
    pub wire_type: WireType,
}

impl Key {
    /// Create a new key.
    pub fn new(tag: u32, wire_type: WireType) -> Self {
        Self { tag, wire_type }
    }

    /// Packed numeric form `(tag << 3) | wire_type`.
    ///
    /// # Example
    ///
    /// ```
    /// use pbwire::protocol::{Key, WireType};
    ///
    /// assert_eq!(Key::new(1, WireType::LengthDelimited).to_raw(), 0x0A);
    /// assert_eq!(Key::new(3, WireType::Varint).to_raw(), 0x18);
    /// ```
    #[inline]
    pub fn to_raw(&self) -> u64 {
        (u64::from(self.tag) << WIRE_TYPE_BITS) | u64::from(self.wire_type.as_u8())
    }

    /// Split a packed key into tag and wire type.
    ///
    /// Wire type is checked before the tag so that garbage keys report
    /// `UnknownWireType` first.
    pub fn from_raw(raw: u64) -> Result<Self> {
        let wire_type = WireType::try_from((raw & WIRE_TYPE_MASK) as u8)?;
        let tag = raw >> WIRE_TYPE_BITS;
        if tag < u64::from(MIN_TAG) || tag > u64::from(MAX_TAG) {
            return Err(CodecError::InvalidTag(tag));
        }
        Ok(Self {
            tag: tag as u32,
            wire_type,
        })
    }

    /// Encode the key as a varint.
    #[inline]
    pub fn encode<B: BufMut>(&self, buf: &mut B) {
        encode_uvarint(self.to_raw(), buf);
    }

    /// Decode a varint key from the buffer.
    pub fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        Self::from_raw(decode_uvarint(buf)?)
    }

    /// Encoded size of the key in bytes.
    #[inline]
    pub fn encoded_len(&self) -> usize {
        uvarint_len(self.to_raw())
    }
}

/// Check that a tag is usable in a schema.
#[inline]
pub fn validate_tag(tag: u32) -> Result<()> {
    if !(MIN_TAG..=MAX_TAG).contains(&tag) {
        return Err(CodecError::InvalidTag(u64::from(tag)));
    }
    Ok(())
}

/// Consume the value of an unrecognized field.
///
/// Returns the number of payload bytes skipped (excluding the length prefix
/// of length-delimited values).
pub fn skip_value<B: Buf>(wire_type: WireType, buf: &mut B) -> Result<usize> {
    let len = match wire_type {
        WireType::Varint => {
            decode_uvarint(buf)?;
            return Ok(0);
        }
        WireType::Fixed64 => 8,
        WireType::Fixed32 => 4,
        WireType::LengthDelimited => read_length(buf)?,
    };
    ensure_remaining(buf, len)?;
    buf.advance(len);
    Ok(len)
}

/// Read a varint length prefix.
pub fn read_length<B: Buf>(buf: &mut B) -> Result<usize> {
    let len = decode_uvarint(buf)?;
    usize::try_from(len).map_err(|_| CodecError::IntegerOverflow)
}

/// Fail with `TruncatedInput` unless `needed` bytes remain.
#[inline]
pub fn ensure_remaining<B: Buf>(buf: &B, needed: usize) -> Result<()> {
    if buf.remaining() < needed {
        return Err(CodecError::TruncatedInput {
            needed,
            available: buf.remaining(),
        });
    }
    Ok(())
}
