//! Inbound event handling: dedup, activity tracking, message recording.

use super::Gateway;
use chrono::Utc;
use skydigest_core::{
    error::SkyError,
    message::{InboundEvent, MessageType, StoredMessage},
};
use std::sync::Arc;
use tracing::{debug, warn};

/// What happened to an inbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// The event id was already processed.
    Duplicate,
    /// Text stored for the next digest.
    Stored,
    /// A prefixed command was handled (and replied to).
    Command,
    /// Nothing to record: non-text or empty message.
    Ignored,
}

impl EventOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Duplicate => "duplicate",
            Self::Stored => "stored",
            Self::Command => "command",
            Self::Ignored => "ignored",
        }
    }
}

impl Gateway {
    /// Process one inbound event at most once.
    pub async fn handle_event(
        self: &Arc<Self>,
        event: InboundEvent,
    ) -> Result<EventOutcome, SkyError> {
        if event.conversation_id.trim().is_empty() {
            return Err(SkyError::InvalidInput("conversation id is empty".into()));
        }
        if !self.gate.claim(&event.event_id).await? {
            return Ok(EventOutcome::Duplicate);
        }

        if let Err(e) = self
            .with_storage_timeout(
                "upsert conversation",
                self.store
                    .upsert_seen(&event.conversation_id, event.conversation_name.as_deref()),
            )
            .await
        {
            warn!("failed to record activity for {}: {e}", event.conversation_id);
        }

        let text = event.text.trim();
        if event.message_type != MessageType::Text || text.is_empty() {
            debug!(
                "{} message in {} not recorded",
                event.message_type.as_str(),
                event.conversation_id
            );
            return Ok(EventOutcome::Ignored);
        }

        if self.parser.is_command(text) {
            self.handle_command(&event).await;
            return Ok(EventOutcome::Command);
        }

        let timestamp_ms = if event.timestamp_ms > 0 {
            event.timestamp_ms
        } else {
            debug!(
                "event {} has no timestamp, using receive time",
                event.event_id
            );
            Utc::now().timestamp_millis()
        };
        let message = StoredMessage {
            conversation_id: event.conversation_id.clone(),
            sender_id: event.sender_id.clone(),
            text: text.to_string(),
            timestamp_ms,
        };
        let inserted = self
            .with_storage_timeout(
                "save message",
                self.store.save_message(&message, Some(&event.event_id)),
            )
            .await?;
        if !inserted {
            debug!("identical message already stored in {}", event.conversation_id);
        }
        Ok(EventOutcome::Stored)
    }
}
