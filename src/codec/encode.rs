//! Schema-driven encoder.
//!
//! Fields are written in tag order. A first pass validates the message and
//! records every nested message length; the second pass writes payloads
//! straight into the output buffer using those lengths.

use std::sync::Arc;

use bytes::BufMut;

use super::CodecConfig;
use crate::error::{CodecError, Result};
use crate::protocol::{encode_uvarint, uvarint_len, zigzag_encode, Key};
use crate::schema::{FieldDescriptor, FieldType, MessageSchema};
use crate::value::{Message, Value};

/// A type-checked field value, ready to be sized or written.
enum Payload<'a> {
    Varint(u64),
    Raw(&'a [u8]),
    Nested(&'a Arc<MessageSchema>, &'a Message),
}

/// Encoded size of a message plus the sizes of every nested message under
/// it, in the order [`write_message`] visits them.
#[derive(Debug)]
pub(crate) struct SizedMessage {
    pub(crate) len: usize,
    nested: Vec<usize>,
}

/// Validate `msg` and record its size and all nested sizes in one walk.
pub(crate) fn measure(
    schema: &MessageSchema,
    msg: &Message,
    config: &CodecConfig,
) -> Result<SizedMessage> {
    let mut nested = Vec::new();
    let len = measure_into(schema, msg, config, 0, &mut nested)?;
    Ok(SizedMessage { len, nested })
}

/// Exact encoded size of `msg`, validating it on the way.
pub(crate) fn message_len(
    schema: &MessageSchema,
    msg: &Message,
    config: &CodecConfig,
    depth: usize,
) -> Result<usize> {
    measure_into(schema, msg, config, depth, &mut Vec::new())
}

fn measure_into(
    schema: &MessageSchema,
    msg: &Message,
    config: &CodecConfig,
    depth: usize,
    sizes: &mut Vec<usize>,
) -> Result<usize> {
    check_depth(depth, config)?;
    check_shape(schema, msg)?;

    let mut len = 0usize;
    for field in schema.fields() {
        let Some(value) = msg.get(&field.name) else {
            continue;
        };
        let key_len = Key::new(field.tag, field.field_type.wire_type()).encoded_len();
        for item in elements(field, value)? {
            len += key_len;
            len += match payload(field, item)? {
                Payload::Varint(v) => uvarint_len(v),
                Payload::Raw(data) => uvarint_len(data.len() as u64) + data.len(),
                Payload::Nested(sub, nested) => {
                    // reserve the slot first so sizes stay in pre-order
                    let slot = sizes.len();
                    sizes.push(0);
                    let nested_len = measure_into(sub, nested, config, depth + 1, sizes)?;
                    sizes[slot] = nested_len;
                    uvarint_len(nested_len as u64) + nested_len
                }
            };
        }
    }
    Ok(len)
}

/// Write a measured message into `buf`.
///
/// `sized` must come from [`measure`] on the same schema and message.
pub(crate) fn write_message<B: BufMut>(
    schema: &MessageSchema,
    msg: &Message,
    buf: &mut B,
    sized: &SizedMessage,
) -> Result<()> {
    write_into(schema, msg, buf, &mut sized.nested.iter().copied())
}

fn write_into<B: BufMut, I: Iterator<Item = usize>>(
    schema: &MessageSchema,
    msg: &Message,
    buf: &mut B,
    sizes: &mut I,
) -> Result<()> {
    for field in schema.fields() {
        let Some(value) = msg.get(&field.name) else {
            continue;
        };
        let key = Key::new(field.tag, field.field_type.wire_type());
        for item in elements(field, value)? {
            let payload = payload(field, item)?;
            key.encode(buf);
            match payload {
                Payload::Varint(v) => encode_uvarint(v, buf),
                Payload::Raw(data) => {
                    encode_uvarint(data.len() as u64, buf);
                    buf.put_slice(data);
                }
                Payload::Nested(sub, nested) => {
                    let len = sizes.next().ok_or_else(|| {
                        CodecError::InvalidSchema(format!(
                            "no recorded size for nested field '{}'",
                            field.name
                        ))
                    })?;
                    encode_uvarint(len as u64, buf);
                    write_into(sub, nested, buf, sizes)?;
                }
            }
        }
    }
    Ok(())
}

/// Type-check one element against its field descriptor.
fn payload<'a>(field: &'a FieldDescriptor, value: &'a Value) -> Result<Payload<'a>> {
    match (&field.field_type, value) {
        (FieldType::UVarint, Value::UInt(v)) => Ok(Payload::Varint(*v)),
        (FieldType::SVarint, Value::SInt(v)) => Ok(Payload::Varint(zigzag_encode(*v))),
        (FieldType::Bool, Value::Bool(v)) => Ok(Payload::Varint(u64::from(*v))),
        (FieldType::Enum(values), Value::UInt(v)) => {
            if !values.contains(v) {
                return Err(CodecError::InvalidEnumValue {
                    field: field.name.clone(),
                    value: *v,
                });
            }
            Ok(Payload::Varint(*v))
        }
        (FieldType::Bytes, Value::Bytes(data)) => Ok(Payload::Raw(data)),
        (FieldType::Unicode, Value::String(s)) => Ok(Payload::Raw(s.as_bytes())),
        (FieldType::Message(sub), Value::Message(nested)) => {
            if nested.type_name() != sub.name() {
                return Err(CodecError::SchemaMismatch {
                    field: field.name.clone(),
                    expected: sub.name().to_string(),
                    found: nested.type_name().to_string(),
                });
            }
            Ok(Payload::Nested(sub, nested))
        }
        _ => Err(mismatch(field, value)),
    }
}

/// Elements to emit for a field: every item of a repeated field, or the
/// single value otherwise.
fn elements<'a>(field: &FieldDescriptor, value: &'a Value) -> Result<&'a [Value]> {
    match (field.is_repeated(), value) {
        (true, Value::Repeated(items)) => Ok(items),
        (false, Value::Repeated(_)) | (true, _) => Err(CodecError::SchemaMismatch {
            field: field.name.clone(),
            expected: expected_shape(field),
            found: value.type_name().to_string(),
        }),
        (false, single) => Ok(std::slice::from_ref(single)),
    }
}

/// Check message type, undeclared fields and required fields.
fn check_shape(schema: &MessageSchema, msg: &Message) -> Result<()> {
    if msg.type_name() != schema.name() {
        return Err(CodecError::SchemaMismatch {
            field: String::new(),
            expected: schema.name().to_string(),
            found: msg.type_name().to_string(),
        });
    }
    if let Some((name, _)) = msg.iter().find(|(name, _)| schema.field_by_name(name).is_none()) {
        return Err(CodecError::UnknownField {
            message: schema.name().to_string(),
            field: name.to_string(),
        });
    }
    if let Some(field) = schema.required_fields().find(|f| !msg.contains(&f.name)) {
        return Err(CodecError::MissingRequiredField {
            message: schema.name().to_string(),
            field: field.name.clone(),
        });
    }
    Ok(())
}

pub(crate) fn check_depth(depth: usize, config: &CodecConfig) -> Result<()> {
    if depth > config.max_depth {
        return Err(CodecError::RecursionLimit(config.max_depth));
    }
    Ok(())
}

fn mismatch(field: &FieldDescriptor, value: &Value) -> CodecError {
    CodecError::SchemaMismatch {
        field: field.name.clone(),
        expected: field.field_type.name().to_string(),
        found: value.type_name().to_string(),
    }
}

fn expected_shape(field: &FieldDescriptor) -> String {
    if field.is_repeated() {
        format!("repeated {}", field.field_type.name())
    } else {
        field.field_type.name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn encode(schema: &MessageSchema, msg: &Message) -> Result<Vec<u8>> {
        let sized = measure(schema, msg, &CodecConfig::default())?;
        let mut buf = Vec::with_capacity(sized.len);
        write_message(schema, msg, &mut buf, &sized)?;
        Ok(buf)
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
    fn test_exact_bytes() {
        let schema = scalars();
        let msg = Message::new(&schema)
            .with("u", 150u64)
            .with("s", -1i64)
            .with("b", true)
            .with("e", 5u64)
            .with("raw", Bytes::from_static(b"\x01\x02"))
            .with("text", "hi");
        let bytes = encode(&schema, &msg).unwrap();
        assert_eq!(
            bytes,
            vec![
                0x08, 0x96, 0x01, // u = 150
                0x10, 0x01, // s = -1 (zigzag 1)
                0x18, 0x01, // b = true
                0x20, 0x05, // e = 5
                0x2A, 0x02, 0x01, 0x02, // raw
                0x32, 0x02, b'h', b'i', // text
            ]
        );
    }

    #[test]
    fn test_repeated_emits_one_key_per_element() {
        let schema = scalars();
        let mut msg = Message::new(&schema);
        msg.push("list", 1u64).push("list", 2u64).push("list", 300u64);
        let bytes = encode(&schema, &msg).unwrap();
        assert_eq!(bytes, vec![0x38, 0x01, 0x38, 0x02, 0x38, 0xAC, 0x02]);
    }

    #[test]
    fn test_absent_and_empty_repeated_emit_nothing() {
        let schema = scalars();
        let msg = Message::new(&schema);
        assert!(encode(&schema, &msg).unwrap().is_empty());
    }

    #[test]
    fn test_empty_bytes_field_is_emitted() {
        let schema = scalars();
        let msg = Message::new(&schema).with("raw", Bytes::new());
        assert_eq!(encode(&schema, &msg).unwrap(), vec![0x2A, 0x00]);
    }

    #[test]
    fn test_type_mismatch() {
        let schema = scalars();
        let msg = Message::new(&schema).with("u", "not a number");
        let err = encode(&schema, &msg).unwrap_err();
        assert!(matches!(err, CodecError::SchemaMismatch { ref field, .. } if field == "u"));
    }

    #[test]
    fn test_repeated_shape_mismatch() {
        let schema = scalars();
        let msg = Message::new(&schema).with("list", 3u64);
        assert!(matches!(
            encode(&schema, &msg).unwrap_err(),
            CodecError::SchemaMismatch { .. }
        ));

        let msg = Message::new(&schema).with("u", vec![Value::UInt(1)]);
        assert!(matches!(
            encode(&schema, &msg).unwrap_err(),
            CodecError::SchemaMismatch { .. }
        ));
    }

    #[test]
    fn test_invalid_enum_value() {
        let schema = scalars();
        let msg = Message::new(&schema).with("e", 3u64);
        assert!(matches!(
            encode(&schema, &msg).unwrap_err(),
            CodecError::InvalidEnumValue { value: 3, .. }
        ));
    }

    #[test]
    fn test_missing_required() {
        let schema = MessageSchema::builder("Req")
            .required(1, "amount", FieldType::UVarint)
            .build()
            .unwrap();
        let err = encode(&schema, &Message::new(&schema)).unwrap_err();
        assert!(matches!(
            err,
            CodecError::MissingRequiredField { ref field, .. } if field == "amount"
        ));
    }

    #[test]
    fn test_unknown_field() {
        let schema = scalars();
        let msg = Message::new(&schema).with("bogus", 1u64);
        assert!(matches!(
            encode(&schema, &msg).unwrap_err(),
            CodecError::UnknownField { .. }
        ));
    }

    #[test]
    fn test_nested_type_name_checked() {
        let inner = MessageSchema::builder("Inner")
            .optional(1, "x", FieldType::UVarint)
            .build()
            .unwrap();
        let other = MessageSchema::builder("Other").build().unwrap();
        let outer = MessageSchema::builder("Outer")
            .optional(1, "nested", FieldType::Message(inner))
            .build()
            .unwrap();

        let msg = Message::new(&outer).with("nested", Message::new(&other));
        let err = encode(&outer, &msg).unwrap_err();
        assert!(err.to_string().contains("expected Inner"));
    }

    #[test]
    fn test_message_len_matches_output() {
        let schema = scalars();
        let mut msg = Message::new(&schema)
            .with("u", u64::MAX)
            .with("text", "x".repeat(200));
        msg.push("list", 0u64);
        let len = message_len(&schema, &msg, &CodecConfig::default(), 0).unwrap();
        assert_eq!(len, encode(&schema, &msg).unwrap().len());
    }

    #[test]
    fn test_depth_limit() {
        let inner = MessageSchema::builder("Inner").build().unwrap();
        let outer = MessageSchema::builder("Outer")
            .optional(1, "nested", FieldType::Message(inner.clone()))
            .build()
            .unwrap();
        let msg = Message::new(&outer).with("nested", Message::new(&inner));

        let config = CodecConfig::default().max_depth(0);
        let err = measure(&outer, &msg, &config).unwrap_err();
        assert!(matches!(err, CodecError::RecursionLimit(0)));
    }

    #[test]
    fn test_nested_sizes_recorded_once_in_write_order() {
        let leaf = MessageSchema::builder("Leaf")
            .optional(1, "v", FieldType::UVarint)
            .build()
            .unwrap();
        let mid = MessageSchema::builder("Mid")
            .optional(1, "leaf", FieldType::Message(leaf.clone()))
            .build()
            .unwrap();
        let top = MessageSchema::builder("Top")
            .repeated(1, "mids", FieldType::Message(mid.clone()))
            .optional(2, "leaf", FieldType::Message(leaf.clone()))
            .build()
            .unwrap();

        let with_leaf = Message::new(&mid).with("leaf", Message::new(&leaf).with("v", 300u64));
        let empty_mid = Message::new(&mid);
        let mut msg = Message::new(&top);
        msg.push("mids", with_leaf)
            .push("mids", empty_mid)
            .set("leaf", Message::new(&leaf).with("v", 1u64));

        let sized = measure(&top, &msg, &CodecConfig::default()).unwrap();
        // mids[0], its leaf, mids[1], top-level leaf
        assert_eq!(sized.nested, vec![5, 3, 0, 2]);

        let bytes = encode(&top, &msg).unwrap();
        assert_eq!(bytes.len(), sized.len);
        assert_eq!(
            bytes,
            vec![
                0x0A, 0x05, 0x0A, 0x03, 0x08, 0xAC, 0x02, // mids[0]
                0x0A, 0x00, // mids[1]
                0x12, 0x02, 0x08, 0x01, // leaf
            ]
        );
    }
}
