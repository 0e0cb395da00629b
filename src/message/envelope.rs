use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::utils::error::{Error, Result};

/// Delivery scope of a message: the whole room, or a single agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    #[default]
    Everyone,
    Direct,
}

/// A single message exchanged between agents.
///
/// Notes on fields:
/// - `sender_id`: id of the originating agent, never empty
/// - `content`: any JSON-serializable body, not just strings
/// - `timestamp`: milliseconds since UNIX epoch; set at construction when absent
/// - `message_id`: opaque unique id; generated when the sender does not provide one
/// - `in_reply_to`: id of the message this one answers, if any (not required to exist)
/// - `audience`: delivery scope; `recipient_id` is required for `Direct` and
///   ignored for `Everyone`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub sender_id: String,
    pub content: Value,
    #[serde(default = "now_millis")]
    pub timestamp: i64,
    #[serde(default = "new_message_id")]
    pub message_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<String>,
    #[serde(default)]
    pub audience: Audience,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_id: Option<String>,
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn new_message_id() -> String {
    Uuid::new_v4().to_string()
}

impl Message {
    /// Creates a room-broadcast message with a fresh id and timestamp.
    pub fn new(sender_id: impl Into<String>, content: Value) -> Self {
        Self {
            sender_id: sender_id.into(),
            content,
            timestamp: now_millis(),
            message_id: new_message_id(),
            in_reply_to: None,
            audience: Audience::Everyone,
            recipient_id: None,
        }
    }

    /// Checks the envelope invariants before a message is sent.
    ///
    /// A `Direct` message without a recipient is invalid and must never be
    /// published.
    pub fn validate(&self) -> Result<()> {
        if self.sender_id.is_empty() {
            return Err(Error::InvalidArgument(
                "sender_id must not be empty".to_string(),
            ));
        }
        if self.audience == Audience::Direct && !has_recipient(self) {
            return Err(Error::InvalidArgument(
                "recipient_id required for direct messages".to_string(),
            ));
        }
        Ok(())
    }
}

fn has_recipient(msg: &Message) -> bool {
    msg.recipient_id.as_deref().is_some_and(|r| !r.is_empty())
}

/// Serializes a message into its JSON wire form.
pub fn encode(msg: &Message) -> Result<Vec<u8>> {
    serde_json::to_vec(msg)
        .map_err(|e| Error::InvalidArgument(format!("unserializable message: {e}")))
}

/// Parses a message from its JSON wire form.
///
/// Absent `timestamp`/`message_id` fields are filled with fresh defaults.
/// Malformed bytes, a missing or empty `sender_id`, or a direct message
/// without a recipient all yield `Error::Decode`.
pub fn decode(bytes: &[u8]) -> Result<Message> {
    let msg: Message =
        serde_json::from_slice(bytes).map_err(|e| Error::Decode(e.to_string()))?;

    if msg.sender_id.is_empty() {
        return Err(Error::Decode("missing sender_id".to_string()));
    }
    if msg.audience == Audience::Direct && !has_recipient(&msg) {
        return Err(Error::Decode(
            "direct message without recipient_id".to_string(),
        ));
    }
    Ok(msg)
}
