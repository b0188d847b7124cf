use serde::{Deserialize, Serialize};

/// Inbound client events, tagged by the `event` field of each JSON frame.
///
/// Required identifiers are modeled as `Option` so a frame with a missing
/// field still deserializes; presence is checked by the dispatcher, which
/// answers with an `error` event instead of dropping the frame.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClientEvent {
    #[serde(rename_all = "camelCase")]
    Join { chat_id: Option<String> },

    #[serde(rename_all = "camelCase")]
    Leave { chat_id: Option<String> },

    #[serde(rename_all = "camelCase")]
    Typing {
        chat_id: Option<String>,
        #[serde(default)]
        is_typing: bool,
    },

    #[serde(rename_all = "camelCase")]
    MarkRead { message_id: Option<String> },
}

/// Outbound server events.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Ack to the caller after a join, emitted on every join including
    /// repeats of the same chat.
    #[serde(rename_all = "camelCase")]
    Joined {
        success: bool,
        chat_id: String,
        message: String,
    },

    #[serde(rename_all = "camelCase")]
    Left {
        success: bool,
        chat_id: String,
        message: String,
    },

    /// Notice to the other room members; `user_id` is omitted for
    /// connections the auth layer attached no identity to.
    #[serde(rename_all = "camelCase")]
    UserJoined {
        #[serde(skip_serializing_if = "Option::is_none")]
        user_id: Option<String>,
        user_name: String,
        chat_id: String,
    },

    #[serde(rename_all = "camelCase")]
    UserLeft {
        #[serde(skip_serializing_if = "Option::is_none")]
        user_id: Option<String>,
        user_name: String,
        chat_id: String,
    },

    #[serde(rename_all = "camelCase")]
    Typing {
        chat_id: String,
        sender_id: String,
        sender_name: String,
        is_typing: bool,
    },

    /// Read-receipt fan-out; goes to the full room, reader included.
    #[serde(rename_all = "camelCase")]
    MessageRead {
        message_id: String,
        read_by: String,
        read_by_name: String,
        read_at: String,
    },

    #[serde(rename_all = "camelCase")]
    Error { message: String },
}

impl ServerEvent {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error { message: message.into() }
    }
}
