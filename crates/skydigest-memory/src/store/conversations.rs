//! Schedule store: per-conversation enable state, hour, timezone, language.
//!
//! Every mutation is one `INSERT .. ON CONFLICT DO UPDATE` statement that
//! creates the row with defaults if needed and then touches only the fields
//! it was given. Two writers changing different fields never clobber each
//! other.

use super::Store;
use skydigest_core::{
    conversation::{clamp_hour, Conversation, Language, SchedulePatch},
    error::SkyError,
};
use tracing::warn;

type ConversationRow = (
    String,
    Option<String>,
    bool,
    i64,
    String,
    String,
    String,
    String,
);

const SELECT_COLUMNS: &str = "SELECT id, name, enabled, summary_hour, timezone, language, \
     last_seen_at, created_at FROM conversations";

fn row_to_conversation(row: ConversationRow) -> Conversation {
    let (id, name, enabled, hour, timezone, language, last_seen_at, created_at) = row;
    let language = language.parse::<Language>().unwrap_or_else(|e| {
        warn!("conversation {id}: {e}, using default");
        Language::default()
    });
    Conversation {
        id,
        name,
        enabled,
        summary_hour: clamp_hour(hour),
        timezone,
        language,
        last_seen_at,
        created_at,
    }
}

impl Store {
    /// Record activity: create the conversation if absent, refresh
    /// `last_seen_at`, and update the display name when one is supplied.
    pub async fn upsert_seen(&self, id: &str, name: Option<&str>) -> Result<(), SkyError> {
        let name = name.map(str::trim).filter(|n| !n.is_empty());
        sqlx::query(
            "INSERT INTO conversations (id, name, summary_hour, timezone, language) \
             VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT(id) DO UPDATE SET \
                name = COALESCE(excluded.name, conversations.name), \
                last_seen_at = datetime('now')",
        )
        .bind(id)
        .bind(name)
        .bind(i64::from(self.defaults.hour))
        .bind(&self.defaults.timezone)
        .bind(self.defaults.language.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| SkyError::Storage(format!("upsert conversation failed: {e}")))?;

        Ok(())
    }

    /// Turn the daily digest on or off.
    pub async fn set_enabled(&self, id: &str, enabled: bool) -> Result<(), SkyError> {
        sqlx::query(
            "INSERT INTO conversations (id, enabled, summary_hour, timezone, language) \
             VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT(id) DO UPDATE SET \
                enabled = excluded.enabled, \
                updated_at = datetime('now')",
        )
        .bind(id)
        .bind(enabled)
        .bind(i64::from(self.defaults.hour))
        .bind(&self.defaults.timezone)
        .bind(self.defaults.language.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| SkyError::Storage(format!("set enabled failed: {e}")))?;

        Ok(())
    }

    /// Apply the provided schedule fields. Hours are clamped into 0-23.
    ///
    /// The timezone is stored as given; callers validate it first.
    pub async fn set_schedule(&self, id: &str, patch: &SchedulePatch) -> Result<(), SkyError> {
        let hour = patch.hour.map(|h| i64::from(clamp_hour(i64::from(h))));
        let timezone = patch.timezone.as_deref().map(str::trim).filter(|t| !t.is_empty());
        let language = patch.language.map(|l| l.as_str());

        sqlx::query(
            "INSERT INTO conversations (id, summary_hour, timezone, language) \
             VALUES (?, COALESCE(?, ?), COALESCE(?, ?), COALESCE(?, ?)) \
             ON CONFLICT(id) DO UPDATE SET \
                summary_hour = COALESCE(?, conversations.summary_hour), \
                timezone = COALESCE(?, conversations.timezone), \
                language = COALESCE(?, conversations.language), \
                updated_at = datetime('now')",
        )
        .bind(id)
        .bind(hour)
        .bind(i64::from(self.defaults.hour))
        .bind(timezone)
        .bind(&self.defaults.timezone)
        .bind(language)
        .bind(self.defaults.language.as_str())
        .bind(hour)
        .bind(timezone)
        .bind(language)
        .execute(&self.pool)
        .await
        .map_err(|e| SkyError::Storage(format!("set schedule failed: {e}")))?;

        Ok(())
    }

    /// Fetch one conversation.
    pub async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>, SkyError> {
        let row: Option<ConversationRow> =
            sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| SkyError::Storage(format!("query failed: {e}")))?;

        Ok(row.map(row_to_conversation))
    }

    /// All conversations with the daily digest switched on, the sole input of
    /// every scheduler pass.
    pub async fn get_enabled_conversations(&self) -> Result<Vec<Conversation>, SkyError> {
        let rows: Vec<ConversationRow> =
            sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE enabled = 1 ORDER BY id"))
                .fetch_all(&self.pool)
                .await
                .map_err(|e| SkyError::Storage(format!("query failed: {e}")))?;

        Ok(rows.into_iter().map(row_to_conversation).collect())
    }

    /// Number of conversations by enable state: `(enabled, total)`.
    pub async fn count_conversations(&self) -> Result<(i64, i64), SkyError> {
        let (enabled, total): (i64, i64) = sqlx::query_as(
            "SELECT COALESCE(SUM(enabled), 0), COUNT(*) FROM conversations",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| SkyError::Storage(format!("query failed: {e}")))?;

        Ok((enabled, total))
    }
}
