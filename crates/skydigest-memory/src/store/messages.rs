//! Message store: text messages kept for summarization.

use super::Store;
use skydigest_core::{error::SkyError, message::StoredMessage};

impl Store {
    /// Persist a text message. Returns `false` when an identical message
    /// (same conversation, timestamp and text) was already stored.
    pub async fn save_message(
        &self,
        message: &StoredMessage,
        event_id: Option<&str>,
    ) -> Result<bool, SkyError> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO messages \
             (conversation_id, event_id, sender_id, msg_type, text, ts_ms) \
             VALUES (?, ?, ?, 'text', ?, ?)",
        )
        .bind(&message.conversation_id)
        .bind(event_id)
        .bind(&message.sender_id)
        .bind(&message.text)
        .bind(message.timestamp_ms)
        .execute(&self.pool)
        .await
        .map_err(|e| SkyError::Storage(format!("save message failed: {e}")))?;

        Ok(result.rows_affected() == 1)
    }

    /// Messages with `start_ms <= ts_ms < end_ms`, oldest first.
    pub async fn get_messages_between(
        &self,
        conversation_id: &str,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<StoredMessage>, SkyError> {
        let rows: Vec<(String, Option<String>, String, i64)> = sqlx::query_as(
            "SELECT conversation_id, sender_id, text, ts_ms FROM messages \
             WHERE conversation_id = ? AND ts_ms >= ? AND ts_ms < ? \
             ORDER BY ts_ms ASC, id ASC",
        )
        .bind(conversation_id)
        .bind(start_ms)
        .bind(end_ms)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| SkyError::Storage(format!("query failed: {e}")))?;

        Ok(rows
            .into_iter()
            .map(|(conversation_id, sender_id, text, timestamp_ms)| StoredMessage {
                conversation_id,
                sender_id,
                text,
                timestamp_ms,
            })
            .collect())
    }

    /// Total stored messages for a conversation.
    pub async fn count_messages(&self, conversation_id: &str) -> Result<i64, SkyError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM messages WHERE conversation_id = ?")
                .bind(conversation_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| SkyError::Storage(format!("query failed: {e}")))?;

        Ok(count)
    }
}
