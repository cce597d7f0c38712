//! Keyword-driven chat responder.

pub mod rules;

use serde::{Deserialize, Serialize};

pub use rules::{Category, RULES, Rule, respond};

/// Reply sent when the request carries no message.
pub const MISSING_MESSAGE_REPLY: &str =
    "I apologize, but I did not receive your message. Please try again.";

/// Reply sent when the request could not be handled at all.
pub const INTERNAL_ERROR_REPLY: &str =
    "I apologize, but I'm having technical difficulties. Please try again later.";

/// Inbound chat message.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
}

/// Outbound chat reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
}

impl ChatReply {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}
