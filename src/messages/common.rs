//! Messages shared across coin families.

use std::sync::{Arc, OnceLock};

use bytes::Bytes;

use crate::codec::typed::{optional, required};
use crate::codec::ProtoMessage;
use crate::error::Result;
use crate::schema::{FieldType, MessageSchema};
use crate::value::Message;

/// BIP-32 public (or private) node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HDNodeType {
    pub depth: u32,
    pub fingerprint: u32,
    pub child_num: u32,
    pub chain_code: Bytes,
    pub private_key: Option<Bytes>,
    pub public_key: Option<Bytes>,
}

impl ProtoMessage for HDNodeType {
    fn schema() -> Arc<MessageSchema> {
        static SCHEMA: OnceLock<Arc<MessageSchema>> = OnceLock::new();
        SCHEMA
            .get_or_init(|| {
                MessageSchema::builder("HDNodeType")
                    .required(1, "depth", FieldType::UVarint)
                    .required(2, "fingerprint", FieldType::UVarint)
                    .required(3, "child_num", FieldType::UVarint)
                    .required(4, "chain_code", FieldType::Bytes)
                    .optional(5, "private_key", FieldType::Bytes)
                    .optional(6, "public_key", FieldType::Bytes)
                    .build()
                    .expect("HDNodeType schema is valid")
            })
            .clone()
    }

    fn to_message(&self) -> Message {
        let mut msg = Message::new(&Self::schema());
        msg.set("depth", self.depth)
            .set("fingerprint", self.fingerprint)
            .set("child_num", self.child_num)
            .set("chain_code", self.chain_code.clone());
        msg.set_opt("private_key", self.private_key.clone())
            .set_opt("public_key", self.public_key.clone());
        msg
    }

    fn from_message(msg: &Message) -> Result<Self> {
        Ok(Self {
            depth: required(msg, "depth")?,
            fingerprint: required(msg, "fingerprint")?,
            child_num: required(msg, "child_num")?,
            chain_code: required(msg, "chain_code")?,
            private_key: optional(msg, "private_key")?,
            public_key: optional(msg, "public_key")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::MessageCodec;

    #[test]
    fn test_hdnode_roundtrip() {
        let node = HDNodeType {
            depth: 3,
            fingerprint: 0xDEADBEEF,
            child_num: 0x8000_0000,
            chain_code: Bytes::from(vec![0x11; 32]),
            private_key: None,
            public_key: Some(Bytes::from(vec![0x02; 33])),
        };

        let codec = MessageCodec::new();
        let bytes = codec.encode_typed(&node).unwrap();
        let decoded: HDNodeType = codec.decode_typed(&bytes).unwrap();
        assert_eq!(decoded, node);
    }

    #[test]
    fn test_schema_is_shared() {
        assert!(Arc::ptr_eq(&HDNodeType::schema(), &HDNodeType::schema()));
    }
}
