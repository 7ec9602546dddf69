//! Base-128 varints and zigzag mapping.
//!
//! Seven payload bits per byte, least significant group first. The high bit
//! of every byte except the last is set.

use bytes::{Buf, BufMut};

use crate::error::{CodecError, Result};

/// Longest varint that can hold a `u64`.
pub const MAX_VARINT_LEN: usize = 10;

const CONTINUATION: u8 = 0x80;
const PAYLOAD_MASK: u8 = 0x7F;

/// Encode an unsigned integer as a varint.
///
/// # Example
///
/// ```
/// use pbwire::protocol::encode_uvarint;
///
/// let mut buf = Vec::new();
/// encode_uvarint(300, &mut buf);
/// assert_eq!(buf, vec![0xAC, 0x02]);
/// ```
#[inline]
pub fn encode_uvarint<B: BufMut>(mut value: u64, buf: &mut B) {
    while value >= u64::from(CONTINUATION) {
        buf.put_u8((value as u8 & PAYLOAD_MASK) | CONTINUATION);
        value >>= 7;
    }
    buf.put_u8(value as u8);
}

/// Decode a varint.
///
/// Fails with `TruncatedInput` if the buffer ends while the continuation bit
/// is still set, and with `IntegerOverflow` if the value needs more than
/// 64 bits.
///
/// # Example
///
/// ```
/// use pbwire::protocol::decode_uvarint;
///
/// let mut input: &[u8] = &[0xAC, 0x02];
/// assert_eq!(decode_uvarint(&mut input).unwrap(), 300);
/// ```
pub fn decode_uvarint<B: Buf>(buf: &mut B) -> Result<u64> {
    let mut value: u64 = 0;
    for i in 0..MAX_VARINT_LEN {
        if !buf.has_remaining() {
            return Err(CodecError::TruncatedInput {
                needed: i + 1,
                available: i,
            });
        }
        let byte = buf.get_u8();
        // 10th byte may only contribute the single remaining bit
        if i == MAX_VARINT_LEN - 1 && byte > 1 {
            return Err(CodecError::IntegerOverflow);
        }
        value |= u64::from(byte & PAYLOAD_MASK) << (7 * i);
        if byte & CONTINUATION == 0 {
            return Ok(value);
        }
    }
    Err(CodecError::IntegerOverflow)
}

/// Number of bytes `encode_uvarint` writes for `value`.
#[inline]
pub fn uvarint_len(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    (bits + 6) / 7
}

/// Map a signed integer onto an unsigned one so small magnitudes stay short.
#[inline]
pub fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Inverse of [`zigzag_encode`].
#[inline]
pub fn zigzag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}
