//! Summary execution lock.
//!
//! One row per `(conversation_id, date_key)` pair. The row is claimed with a
//! single `INSERT OR IGNORE` against the primary key, so exactly one caller
//! across every process wins. Rows are never released or deleted: a failed
//! run is not retried for the same date key.

use super::Store;
use skydigest_core::error::SkyError;
use std::fmt;

/// What caused a lock attempt. Recorded for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockTrigger {
    HourlyScan,
    DailyFallback,
    Manual,
    Range,
}

impl LockTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HourlyScan => "hourly_scan",
            Self::DailyFallback => "daily_fallback",
            Self::Manual => "manual",
            Self::Range => "range",
        }
    }
}

impl fmt::Display for LockTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Store {
    /// Try to claim the digest for `conversation_id` on `date_key`.
    ///
    /// Returns `true` for exactly one caller per pair, ever.
    pub async fn try_acquire_summary_lock(
        &self,
        conversation_id: &str,
        date_key: &str,
        trigger: LockTrigger,
    ) -> Result<bool, SkyError> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO summary_lock (conversation_id, date_key, trigger, worker_id) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(conversation_id)
        .bind(date_key)
        .bind(trigger.as_str())
        .bind(&self.worker_id)
        .execute(&self.pool)
        .await
        .map_err(|e| SkyError::Storage(format!("lock acquire failed: {e}")))?;

        Ok(result.rows_affected() == 1)
    }

    /// Whether the pair has already been claimed.
    pub async fn has_summary_lock(
        &self,
        conversation_id: &str,
        date_key: &str,
    ) -> Result<bool, SkyError> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT trigger FROM summary_lock WHERE conversation_id = ? AND date_key = ?",
        )
        .bind(conversation_id)
        .bind(date_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| SkyError::Storage(format!("query failed: {e}")))?;

        Ok(row.is_some())
    }

    /// Number of lock rows held for a conversation.
    pub async fn count_summary_locks(&self, conversation_id: &str) -> Result<i64, SkyError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM summary_lock WHERE conversation_id = ?")
                .bind(conversation_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| SkyError::Storage(format!("query failed: {e}")))?;

        Ok(count)
    }
}
