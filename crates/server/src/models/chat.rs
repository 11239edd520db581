//! Chat transcript entries.
//!
//! The transcript is stored as one JSON array per user in the shape the web
//! client renders: `{id, content, isBot, timestamp, type}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use calmly_core::MessageKind;

/// Id the web client gives its locally rendered greeting.
pub const WELCOME_MESSAGE_ID: &str = "welcome";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub content: String,
    pub is_bot: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
}

impl ChatMessage {
    /// A message typed by the student, id `user-<millis>`.
    #[must_use]
    pub fn from_user(content: impl Into<String>, kind: MessageKind, at: DateTime<Utc>) -> Self {
        Self {
            id: format!("user-{}", at.timestamp_millis()),
            content: content.into(),
            is_bot: false,
            timestamp: at,
            kind,
        }
    }

    /// A reply from the companion, id `bot-<millis>`.
    #[must_use]
    pub fn from_bot(content: impl Into<String>, kind: MessageKind, at: DateTime<Utc>) -> Self {
        Self {
            id: format!("bot-{}", at.timestamp_millis()),
            content: content.into(),
            is_bot: true,
            timestamp: at,
            kind,
        }
    }

    #[must_use]
    pub fn is_welcome(&self) -> bool {
        self.id == WELCOME_MESSAGE_ID
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_wire_format() {
        let at = Utc.timestamp_millis_opt(1_717_171_717_000).unwrap();
        let message = ChatMessage::from_bot("Hi there", MessageKind::Crisis, at);

        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["id"], "bot-1717171717000");
        assert_eq!(json["isBot"], true);
        assert_eq!(json["type"], "crisis");
    }

    #[test]
    fn test_missing_type_defaults_to_normal() {
        let message: ChatMessage = serde_json::from_str(
            r#"{"id":"welcome","content":"Hello!","isBot":true,"timestamp":"2024-05-01T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(message.kind, MessageKind::Normal);
        assert!(message.is_welcome());
    }
}
