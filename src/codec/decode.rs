//! Schema-driven decoder.
//!
//! Reads `(key, value)` pairs until the buffer is exhausted. Unknown tags are
//! skipped, repeated fields append, other fields keep the last occurrence.

use bytes::{Buf, Bytes};

use super::encode::check_depth;
use super::CodecConfig;
use crate::error::{CodecError, Result};
use crate::protocol::{
    decode_uvarint, ensure_remaining, read_length, skip_value, zigzag_decode, Key, WireType,
};
use crate::schema::{FieldDescriptor, FieldType, MessageSchema};
use crate::value::{Message, Value};

/// Decode one message occupying all of `buf`.
pub(crate) fn decode_message<B: Buf>(
    schema: &MessageSchema,
    buf: &mut B,
    config: &CodecConfig,
    depth: usize,
) -> Result<Message> {
    check_depth(depth, config)?;

    let mut msg = Message::new(schema);
    while buf.has_remaining() {
        let key = Key::decode(buf)?;
        match schema.field(key.tag) {
            Some(field) => decode_field(field, key.wire_type, buf, &mut msg, config, depth)?,
            None => {
                let skipped = skip_value(key.wire_type, buf)?;
                tracing::trace!(
                    message_type = schema.name(),
                    tag = key.tag,
                    wire_type = key.wire_type.name(),
                    skipped,
                    "Skipping unknown field"
                );
            }
        }
    }

    if let Some(field) = schema.required_fields().find(|f| !msg.contains(&f.name)) {
        return Err(CodecError::MissingRequiredField {
            message: schema.name().to_string(),
            field: field.name.clone(),
        });
    }

    Ok(msg)
}

fn decode_field<B: Buf>(
    field: &FieldDescriptor,
    wire_type: WireType,
    buf: &mut B,
    msg: &mut Message,
    config: &CodecConfig,
    depth: usize,
) -> Result<()> {
    let expected = field.field_type.wire_type();

    if wire_type == expected {
        let value = decode_value(field, buf, config, depth)?;
        store(msg, field, value);
        return Ok(());
    }

    let packed = config.accept_packed
        && field.is_repeated()
        && field.field_type.is_varint()
        && wire_type == WireType::LengthDelimited;
    if packed {
        let mut payload = take_delimited(buf)?;
        while payload.has_remaining() {
            let raw = decode_uvarint(&mut payload)?;
            store(msg, field, varint_value(field, raw)?);
        }
        return Ok(());
    }

    Err(CodecError::SchemaMismatch {
        field: field.name.clone(),
        expected: expected.name().to_string(),
        found: wire_type.name().to_string(),
    })
}

fn decode_value<B: Buf>(
    field: &FieldDescriptor,
    buf: &mut B,
    config: &CodecConfig,
    depth: usize,
) -> Result<Value> {
    match &field.field_type {
        FieldType::Bytes => Ok(Value::Bytes(take_delimited(buf)?)),
        FieldType::Unicode => {
            let data = take_delimited(buf)?;
            let text = std::str::from_utf8(&data).map_err(|_| CodecError::InvalidUtf8 {
                field: field.name.clone(),
            })?;
            Ok(Value::String(text.to_string()))
        }
        FieldType::Message(sub) => {
            let mut payload = take_delimited(buf)?;
            let nested = decode_message(sub, &mut payload, config, depth + 1)?;
            Ok(Value::Message(nested))
        }
        _ => {
            let raw = decode_uvarint(buf)?;
            varint_value(field, raw)
        }
    }
}

/// Interpret a raw varint according to the field's declared type.
fn varint_value(field: &FieldDescriptor, raw: u64) -> Result<Value> {
    match &field.field_type {
        FieldType::UVarint => Ok(Value::UInt(raw)),
        FieldType::SVarint => Ok(Value::SInt(zigzag_decode(raw))),
        FieldType::Bool => Ok(Value::Bool(raw != 0)),
        FieldType::Enum(values) => {
            if !values.contains(&raw) {
                return Err(CodecError::InvalidEnumValue {
                    field: field.name.clone(),
                    value: raw,
                });
            }
            Ok(Value::UInt(raw))
        }
        other => Err(CodecError::SchemaMismatch {
            field: field.name.clone(),
            expected: other.name().to_string(),
            found: WireType::Varint.name().to_string(),
        }),
    }
}

/// Read a length prefix and split off that many bytes.
///
/// Zero-copy when `B` is `Bytes`.
fn take_delimited<B: Buf>(buf: &mut B) -> Result<Bytes> {
    let len = read_length(buf)?;
    ensure_remaining(buf, len)?;
    Ok(buf.copy_to_bytes(len))
}

fn store(msg: &mut Message, field: &FieldDescriptor, value: Value) {
    if field.is_repeated() {
        msg.push(&field.name, value);
    } else {
        msg.fields_mut().insert(field.name.clone(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn decode(schema: &MessageSchema, data: &[u8]) -> Result<Message> {
        let mut slice = data;
        decode_message(schema, &mut slice, &CodecConfig::default(), 0)
    }

    fn scalars() -> Arc<MessageSchema> {
        MessageSchema::builder("Scalars")
            .optional(1, "u", FieldType::UVarint)
            .optional(2, "s", FieldType::SVarint)
            .optional(3, "b", FieldType::Bool)
            .optional(4, "e", FieldType::Enum(vec![0, 1, 5]))
            .optional(5, "raw", FieldType::Bytes)
            .optional(6, "text", FieldType::Unicode)
            .repeated(7, "list", FieldType::UVarint)
            .build()
            .unwrap()
    }

    #[test]
    fn test_decode_scalars() {
        let data = [
            0x08, 0x96, 0x01, 0x10, 0x03, 0x18, 0x01, 0x20, 0x05, 0x2A, 0x01, 0xFF, 0x32, 0x02,
            b'o', b'k',
        ];
        let msg = decode(&scalars(), &data).unwrap();
        assert_eq!(msg.get_u64("u"), Some(150));
        assert_eq!(msg.get_i64("s"), Some(-2));
        assert_eq!(msg.get_bool("b"), Some(true));
        assert_eq!(msg.get_u64("e"), Some(5));
        assert_eq!(msg.get_bytes("raw").unwrap().as_ref(), &[0xFF]);
        assert_eq!(msg.get_str("text"), Some("ok"));
        assert_eq!(msg.get_repeated("list"), Some(&[][..]));
    }

    #[test]
    fn test_empty_input_gives_defaults() {
        let msg = decode(&scalars(), &[]).unwrap();
        assert_eq!(msg, Message::new(&scalars()));
    }

    #[test]
    fn test_last_one_wins() {
        let msg = decode(&scalars(), &[0x08, 0x01, 0x08, 0x02]).unwrap();
        assert_eq!(msg.get_u64("u"), Some(2));
    }

    #[test]
    fn test_repeated_appends_in_order() {
        let msg = decode(&scalars(), &[0x38, 0x03, 0x08, 0x09, 0x38, 0x01, 0x38, 0x02]).unwrap();
        let list: Vec<u64> = msg
            .get_repeated("list")
            .unwrap()
            .iter()
            .filter_map(Value::as_u64)
            .collect();
        assert_eq!(list, vec![3, 1, 2]);
    }

    #[test]
    fn test_packed_repeated() {
        // field 7, wire type 2, three varints
        let msg = decode(&scalars(), &[0x3A, 0x04, 0x01, 0xAC, 0x02, 0x05]).unwrap();
        let list: Vec<u64> = msg
            .get_repeated("list")
            .unwrap()
            .iter()
            .filter_map(Value::as_u64)
            .collect();
        assert_eq!(list, vec![1, 300, 5]);
    }

    #[test]
    fn test_packed_rejected_when_disabled() {
        let config = CodecConfig::default().accept_packed(false);
        let mut slice: &[u8] = &[0x3A, 0x01, 0x01];
        let err = decode_message(&scalars(), &mut slice, &config, 0).unwrap_err();
        assert!(matches!(err, CodecError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_wire_type_mismatch_on_known_tag() {
        // field 6 (unicode) sent as varint
        let err = decode(&scalars(), &[0x30, 0x01]).unwrap_err();
        assert!(matches!(err, CodecError::SchemaMismatch { ref field, .. } if field == "text"));
    }

    #[test]
    fn test_unknown_fields_skipped() {
        let data = [
            0x78, 0x2A, // tag 15 varint
            0x81, 0x01, 1, 2, 3, 4, 5, 6, 7, 8, // tag 16 fixed64
            0x8A, 0x01, 0x02, b'z', b'z', // tag 17 length-delimited
            0x95, 0x01, 9, 9, 9, 9, // tag 18 fixed32
            0x08, 0x07, // u = 7
        ];
        let msg = decode(&scalars(), &data).unwrap();
        assert_eq!(msg.get_u64("u"), Some(7));
        assert_eq!(msg.len(), 2);
    }

    #[test]
    fn test_unknown_wire_type() {
        let err = decode(&scalars(), &[0x0F, 0x00]).unwrap_err();
        assert!(matches!(err, CodecError::UnknownWireType(7)));
    }

    #[test]
    fn test_truncated_length_delimited() {
        let err = decode(&scalars(), &[0x2A, 0x05, 0x01, 0x02]).unwrap_err();
        assert!(matches!(
            err,
            CodecError::TruncatedInput {
                needed: 5,
                available: 2
            }
        ));
    }

    #[test]
    fn test_truncated_varint() {
        let err = decode(&scalars(), &[0x08, 0x80]).unwrap_err();
        assert!(matches!(err, CodecError::TruncatedInput { .. }));
    }

    #[test]
    fn test_overflowing_varint() {
        let mut data = vec![0x08];
        data.extend_from_slice(&[0xFF; 10]);
        data.push(0x01);
        assert!(matches!(
            decode(&scalars(), &data).unwrap_err(),
            CodecError::IntegerOverflow
        ));
    }

    #[test]
    fn test_invalid_utf8() {
        let err = decode(&scalars(), &[0x32, 0x02, 0xC3, 0x28]).unwrap_err();
        assert!(matches!(err, CodecError::InvalidUtf8 { .. }));
    }

    #[test]
    fn test_invalid_enum_value() {
        let err = decode(&scalars(), &[0x20, 0x02]).unwrap_err();
        assert!(matches!(err, CodecError::InvalidEnumValue { value: 2, .. }));
    }

    #[test]
    fn test_missing_required_field() {
        let schema = MessageSchema::builder("Req")
            .required(1, "amount", FieldType::UVarint)
            .optional(2, "memo", FieldType::Unicode)
            .build()
            .unwrap();
        let err = decode(&schema, &[0x12, 0x00]).unwrap_err();
        assert!(matches!(
            err,
            CodecError::MissingRequiredField { ref field, ref message } if field == "amount" && message == "Req"
        ));

        // explicit zero counts as present
        assert_eq!(decode(&schema, &[0x08, 0x00]).unwrap().get_u64("amount"), Some(0));
    }

    #[test]
    fn test_nested_failure_propagates() {
        let inner = MessageSchema::builder("Inner")
            .required(1, "x", FieldType::UVarint)
            .build()
            .unwrap();
        let outer = MessageSchema::builder("Outer")
            .optional(1, "nested", FieldType::Message(inner))
            .build()
            .unwrap();

        let err = decode(&outer, &[0x0A, 0x00]).unwrap_err();
        assert!(matches!(err, CodecError::MissingRequiredField { ref message, .. } if message == "Inner"));

        let msg = decode(&outer, &[0x0A, 0x02, 0x08, 0x05]).unwrap();
        assert_eq!(msg.get_message("nested").unwrap().get_u64("x"), Some(5));
    }

    #[test]
    fn test_nested_length_bounds_inner_decode() {
        // inner claims 1 byte, but the varint inside needs 2
        let inner = MessageSchema::builder("Inner")
            .optional(1, "x", FieldType::UVarint)
            .build()
            .unwrap();
        let outer = MessageSchema::builder("Outer")
            .optional(1, "nested", FieldType::Message(inner))
            .optional(2, "tail", FieldType::UVarint)
            .build()
            .unwrap();
        let err = decode(&outer, &[0x0A, 0x01, 0x08, 0x10, 0x01]).unwrap_err();
        assert!(matches!(err, CodecError::TruncatedInput { .. }));
    }

    #[test]
    fn test_depth_limit() {
        let inner = MessageSchema::builder("Inner").build().unwrap();
        let outer = MessageSchema::builder("Outer")
            .optional(1, "nested", FieldType::Message(inner))
            .build()
            .unwrap();
        let config = CodecConfig::default().max_depth(0);
        let mut slice: &[u8] = &[0x0A, 0x00];
        let err = decode_message(&outer, &mut slice, &config, 0).unwrap_err();
        assert!(matches!(err, CodecError::RecursionLimit(0)));
    }

    #[test]
    fn test_zero_copy_bytes_field() {
        let data = Bytes::from_static(&[0x2A, 0x03, 0xAA, 0xBB, 0xCC]);
        let mut buf = data.clone();
        let msg = decode_message(&scalars(), &mut buf, &CodecConfig::default(), 0).unwrap();
        let raw = msg.get_bytes("raw").unwrap();
        assert_eq!(raw.as_ref(), &[0xAA, 0xBB, 0xCC]);
        assert_eq!(raw.as_ptr(), data[2..].as_ptr());
    }
}
