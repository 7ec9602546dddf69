//! Built-in message definitions.
//!
//! Each type carries a static schema built once on first use. Nested message
//! fields share the child's schema, so `TxOutputType` points at the same
//! `HDNodeType` schema as every other user of it.

mod bitcoin;
mod common;
mod misc;

pub use bitcoin::{HDNodePathType, MultisigRedeemScriptType, OutputScriptType, TxOutputType};
pub use common::HDNodeType;
pub use misc::{HelloWorldRequest, HelloWorldResponse, DEFAULT_HELLO_AMOUNT, MAX_HELLO_AMOUNT};

use crate::codec::ProtoMessage;
use crate::schema::SchemaRegistry;

/// Register every built-in message schema by name.
pub fn register_all(registry: &mut SchemaRegistry) {
    registry.register(HDNodeType::schema());
    registry.register(HDNodePathType::schema());
    registry.register(MultisigRedeemScriptType::schema());
    registry.register(TxOutputType::schema());
    registry.register(HelloWorldRequest::schema());
    registry.register(HelloWorldResponse::schema());
}
