use serde::{Deserialize, Serialize};

/// Platform message kind. Only `Text` is persisted for summaries.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    #[default]
    Text,
    Image,
    File,
    #[serde(other)]
    Other,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::File => "file",
            Self::Other => "other",
        }
    }
}

/// A normalised inbound platform event, delivered at least once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEvent {
    /// Stable platform event id. Redeliveries carry the same id.
    pub event_id: String,
    pub conversation_id: String,
    #[serde(default)]
    pub conversation_name: Option<String>,
    /// Acting user. Some platforms omit it for certain event types.
    #[serde(default)]
    pub sender_id: Option<String>,
    #[serde(default)]
    pub message_type: MessageType,
    #[serde(default)]
    pub text: String,
    /// Platform creation time in milliseconds since the epoch. `0` means
    /// unknown; the gateway records the receive time instead.
    #[serde(default)]
    pub timestamp_ms: i64,
}

/// A text message persisted for summarization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub conversation_id: String,
    pub sender_id: Option<String>,
    pub text: String,
    pub timestamp_ms: i64,
}

/// Text to deliver to a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub conversation_id: String,
    pub text: String,
}

impl OutgoingMessage {
    pub fn new(conversation_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            text: text.into(),
        }
    }
}
