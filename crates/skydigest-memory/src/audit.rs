//! Audit log: records privileged commands and their outcome.

use skydigest_core::error::SkyError;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

/// An entry to write to the audit log.
pub struct AuditEntry {
    pub conversation_id: String,
    pub sender_id: Option<String>,
    /// Command verb, e.g. `login` or `runall`.
    pub command: String,
    pub status: AuditStatus,
    pub detail: Option<String>,
}

/// Status of an audited command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditStatus {
    Ok,
    Error,
    Denied,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
            Self::Denied => "denied",
        }
    }
}

/// Audit logger backed by SQLite.
#[derive(Clone)]
pub struct AuditLogger {
    pool: SqlitePool,
}

impl AuditLogger {
    /// Create a new audit logger sharing the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Write an entry to the audit log.
    pub async fn log(&self, entry: &AuditEntry) -> Result<(), SkyError> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            "INSERT INTO audit_log (id, conversation_id, sender_id, command, status, detail) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&entry.conversation_id)
        .bind(&entry.sender_id)
        .bind(&entry.command)
        .bind(entry.status.as_str())
        .bind(&entry.detail)
        .execute(&self.pool)
        .await
        .map_err(|e| SkyError::Storage(format!("audit log write failed: {e}")))?;

        debug!(
            "audit: {} {} {} [{}]",
            entry.conversation_id,
            entry.sender_id.as_deref().unwrap_or("-"),
            entry.command,
            entry.status.as_str(),
        );

        Ok(())
    }

    /// Count entries for a conversation with the given status.
    pub async fn count(&self, conversation_id: &str, status: AuditStatus) -> Result<i64, SkyError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM audit_log WHERE conversation_id = ? AND status = ?",
        )
        .bind(conversation_id)
        .bind(status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| SkyError::Storage(format!("query failed: {e}")))?;

        Ok(count)
    }
}
