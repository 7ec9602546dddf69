//! Hello-world request/response pair.

use std::sync::{Arc, OnceLock};

use crate::codec::typed::{optional, required};
use crate::codec::ProtoMessage;
use crate::error::{CodecError, Result};
use crate::schema::{FieldType, MessageSchema};
use crate::value::Message;

/// Repeat count used when a request carries no `amount`.
pub const DEFAULT_HELLO_AMOUNT: u32 = 1;

/// Largest `amount` a response is built for.
pub const MAX_HELLO_AMOUNT: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelloWorldRequest {
    pub name: String,
    pub amount: Option<u32>,
    pub show_display: Option<bool>,
}

impl HelloWorldRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            amount: None,
            show_display: None,
        }
    }

    /// Build the response: one greeting line per `amount`.
    ///
    /// Fails with `ValueOutOfRange` if `amount` exceeds [`MAX_HELLO_AMOUNT`].
    pub fn respond(&self) -> Result<HelloWorldResponse> {
        let amount = self.amount.unwrap_or(DEFAULT_HELLO_AMOUNT);
        if amount > MAX_HELLO_AMOUNT {
            return Err(CodecError::ValueOutOfRange {
                field: "amount".to_string(),
                value: u64::from(amount),
                max: u64::from(MAX_HELLO_AMOUNT),
            });
        }
        Ok(HelloWorldResponse {
            text: format!("Hello {}!\n", self.name).repeat(amount as usize),
        })
    }
}

impl ProtoMessage for HelloWorldRequest {
    fn schema() -> Arc<MessageSchema> {
        static SCHEMA: OnceLock<Arc<MessageSchema>> = OnceLock::new();
        SCHEMA
            .get_or_init(|| {
                MessageSchema::builder("HelloWorldRequest")
                    .required(1, "name", FieldType::Unicode)
                    .optional(2, "amount", FieldType::UVarint)
                    .optional(3, "show_display", FieldType::Bool)
                    .build()
                    .expect("HelloWorldRequest schema is valid")
            })
            .clone()
    }

    fn to_message(&self) -> Message {
        let mut msg = Message::new(&Self::schema());
        msg.set("name", self.name.as_str())
            .set_opt("amount", self.amount)
            .set_opt("show_display", self.show_display);
        msg
    }

    fn from_message(msg: &Message) -> Result<Self> {
        Ok(Self {
            name: required(msg, "name")?,
            amount: optional(msg, "amount")?,
            show_display: optional(msg, "show_display")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelloWorldResponse {
    pub text: String,
}

impl ProtoMessage for HelloWorldResponse {
    fn schema() -> Arc<MessageSchema> {
        static SCHEMA: OnceLock<Arc<MessageSchema>> = OnceLock::new();
        SCHEMA
            .get_or_init(|| {
                MessageSchema::builder("HelloWorldResponse")
                    .required(1, "text", FieldType::Unicode)
                    .build()
                    .expect("HelloWorldResponse schema is valid")
            })
            .clone()
    }

    fn to_message(&self) -> Message {
        Message::new(&Self::schema()).with("text", self.text.as_str())
    }

    fn from_message(msg: &Message) -> Result<Self> {
        Ok(Self {
            text: required(msg, "text")?,
        })
    }
}
