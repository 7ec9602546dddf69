//! Bitcoin transaction output messages.

use std::sync::{Arc, OnceLock};

use bytes::Bytes;

use super::HDNodeType;
use crate::codec::typed::{
    optional, optional_message, repeated, repeated_message, required, required_message,
    to_repeated, to_repeated_messages,
};
use crate::codec::ProtoMessage;
use crate::error::{CodecError, Result};
use crate::schema::{FieldType, MessageSchema};
use crate::value::{Message, Value};

/// Type of script an output pays to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u32)]
pub enum OutputScriptType {
    #[default]
    PayToAddress = 0,
    PayToScriptHash = 1,
    PayToMultisig = 2,
    PayToOpReturn = 3,
    PayToWitness = 4,
    PayToP2SHWitness = 5,
}

impl OutputScriptType {
    /// Every wire value, in declaration order.
    pub const VALUES: [u64; 6] = [0, 1, 2, 3, 4, 5];

    #[inline]
    pub fn as_u64(self) -> u64 {
        self as u64
    }
}

impl TryFrom<u64> for OutputScriptType {
    type Error = CodecError;

    fn try_from(value: u64) -> Result<Self> {
        match value {
            0 => Ok(Self::PayToAddress),
            1 => Ok(Self::PayToScriptHash),
            2 => Ok(Self::PayToMultisig),
            3 => Ok(Self::PayToOpReturn),
            4 => Ok(Self::PayToWitness),
            5 => Ok(Self::PayToP2SHWitness),
            other => Err(CodecError::InvalidEnumValue {
                field: "script_type".to_string(),
                value: other,
            }),
        }
    }
}

/// Node plus derivation path from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HDNodePathType {
    pub node: HDNodeType,
    pub address_n: Vec<u32>,
}

impl ProtoMessage for HDNodePathType {
    fn schema() -> Arc<MessageSchema> {
        static SCHEMA: OnceLock<Arc<MessageSchema>> = OnceLock::new();
        SCHEMA
            .get_or_init(|| {
                MessageSchema::builder("HDNodePathType")
                    .required(1, "node", FieldType::Message(HDNodeType::schema()))
                    .repeated(2, "address_n", FieldType::UVarint)
                    .build()
                    .expect("HDNodePathType schema is valid")
            })
            .clone()
    }

    fn to_message(&self) -> Message {
        Message::new(&Self::schema())
            .with("node", self.node.to_message())
            .with("address_n", to_repeated(&self.address_n))
    }

    fn from_message(msg: &Message) -> Result<Self> {
        Ok(Self {
            node: required_message(msg, "node")?,
            address_n: repeated(msg, "address_n")?,
        })
    }
}

/// Redeem script description for multisig outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultisigRedeemScriptType {
    pub pubkeys: Vec<HDNodePathType>,
    pub signatures: Vec<Bytes>,
    pub m: u32,
}

impl ProtoMessage for MultisigRedeemScriptType {
    fn schema() -> Arc<MessageSchema> {
        static SCHEMA: OnceLock<Arc<MessageSchema>> = OnceLock::new();
        SCHEMA
            .get_or_init(|| {
                MessageSchema::builder("MultisigRedeemScriptType")
                    .repeated(1, "pubkeys", FieldType::Message(HDNodePathType::schema()))
                    .repeated(2, "signatures", FieldType::Bytes)
                    .required(3, "m", FieldType::UVarint)
                    .build()
                    .expect("MultisigRedeemScriptType schema is valid")
            })
            .clone()
    }

    fn to_message(&self) -> Message {
        Message::new(&Self::schema())
            .with("pubkeys", to_repeated_messages(&self.pubkeys))
            .with("signatures", to_repeated(&self.signatures))
            .with("m", self.m)
    }

    fn from_message(msg: &Message) -> Result<Self> {
        Ok(Self {
            pubkeys: repeated_message(msg, "pubkeys")?,
            signatures: repeated(msg, "signatures")?,
            m: required(msg, "m")?,
        })
    }
}

/// One output of a transaction being signed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TxOutputType {
    pub address: Option<String>,
    pub address_n: Vec<u32>,
    pub amount: u64,
    pub script_type: OutputScriptType,
    pub multisig: Option<MultisigRedeemScriptType>,
    pub op_return_data: Option<Bytes>,
    pub decred_script_version: Option<u32>,
    pub block_hash_bip115: Option<Bytes>,
    pub block_height_bip115: Option<Bytes>,
}

impl ProtoMessage for TxOutputType {
    fn schema() -> Arc<MessageSchema> {
        static SCHEMA: OnceLock<Arc<MessageSchema>> = OnceLock::new();
        SCHEMA
            .get_or_init(|| {
                MessageSchema::builder("TxOutputType")
                    .optional(1, "address", FieldType::Unicode)
                    .repeated(2, "address_n", FieldType::UVarint)
                    .required(3, "amount", FieldType::UVarint)
                    .required(
                        4,
                        "script_type",
                        FieldType::Enum(OutputScriptType::VALUES.to_vec()),
                    )
                    .optional(
                        5,
                        "multisig",
                        FieldType::Message(MultisigRedeemScriptType::schema()),
                    )
                    .optional(6, "op_return_data", FieldType::Bytes)
                    .optional(7, "decred_script_version", FieldType::UVarint)
                    .optional(8, "block_hash_bip115", FieldType::Bytes)
                    .optional(9, "block_height_bip115", FieldType::Bytes)
                    .build()
                    .expect("TxOutputType schema is valid")
            })
            .clone()
    }

    fn to_message(&self) -> Message {
        let mut msg = Message::new(&Self::schema());
        msg.set_opt("address", self.address.clone())
            .set("address_n", to_repeated(&self.address_n))
            .set("amount", self.amount)
            .set("script_type", self.script_type.as_u64())
            .set_opt(
                "multisig",
                self.multisig.as_ref().map(|m| Value::Message(m.to_message())),
            )
            .set_opt("op_return_data", self.op_return_data.clone())
            .set_opt("decred_script_version", self.decred_script_version)
            .set_opt("block_hash_bip115", self.block_hash_bip115.clone())
            .set_opt("block_height_bip115", self.block_height_bip115.clone());
        msg
    }

    fn from_message(msg: &Message) -> Result<Self> {
        let script_type: u64 = required(msg, "script_type")?;
        Ok(Self {
            address: optional(msg, "address")?,
            address_n: repeated(msg, "address_n")?,
            amount: required(msg, "amount")?,
            script_type: OutputScriptType::try_from(script_type)?,
            multisig: optional_message(msg, "multisig")?,
            op_return_data: optional(msg, "op_return_data")?,
            decred_script_version: optional(msg, "decred_script_version")?,
            block_hash_bip115: optional(msg, "block_hash_bip115")?,
            block_height_bip115: optional(msg, "block_height_bip115")?,
        })
    }
}
