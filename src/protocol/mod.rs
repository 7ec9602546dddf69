//! Protocol module - wire primitives shared by the encoder and decoder.
//!
//! This module implements the low-level pieces of the wire format:
//! - Base-128 varints and zigzag mapping
//! - Field keys `(tag << 3) | wire_type`
//! - Skipping values of unrecognized fields

mod varint;
mod wire_format;

pub use varint::{
    decode_uvarint, encode_uvarint, uvarint_len, zigzag_decode, zigzag_encode, MAX_VARINT_LEN,
};
pub use wire_format::{
    ensure_remaining, read_length, skip_value, validate_tag, Key, WireType, MAX_TAG, MIN_TAG,
    WIRE_TYPE_BITS, WIRE_TYPE_MASK,
};
