//! SQLite-backed durable store.
//!
//! Split into focused submodules:
//! - `conversations`: the schedule store (per-conversation configuration)
//! - `messages`: insert-or-ignore text messages and window queries
//! - `locks`: the at-most-once-per-day summary execution lock

mod conversations;
mod locks;
mod messages;


pub use locks::LockTrigger;

use skydigest_core::{
    config::MemoryConfig, conversation::ScheduleDefaults, error::SkyError, shellexpand,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

/// Persistent store backed by SQLite.
///
/// Cheap to clone; clones share the connection pool. Several processes may
/// open the same database file: every cross-process guarantee relies on
/// single-statement upserts and unique-key inserts, never on in-process locks.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
    defaults: ScheduleDefaults,
    /// Identifies this process in `summary_lock` rows.
    worker_id: String,
}

impl Store {
    /// Create a new store, running migrations on first use.
    pub async fn new(config: &MemoryConfig, defaults: ScheduleDefaults) -> Result<Self, SkyError> {
        let db_path = shellexpand(&config.db_path);

        // Ensure parent directory exists.
        if let Some(parent) = std::path::Path::new(&db_path).parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SkyError::Storage(format!("failed to create data dir: {e}")))?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))
            .map_err(|e| SkyError::Storage(format!("invalid db path: {e}")))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(opts)
            .await
            .map_err(|e| SkyError::Storage(format!("failed to connect to sqlite: {e}")))?;

        Self::run_migrations(&pool).await?;

        info!("Store initialized at {db_path}");

        Ok(Self::from_pool(pool, defaults))
    }

    fn from_pool(pool: SqlitePool, defaults: ScheduleDefaults) -> Self {
        Self {
            pool,
            defaults,
            worker_id: Uuid::new_v4().to_string(),
        }
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Schedule values applied to newly created conversations.
    pub fn defaults(&self) -> &ScheduleDefaults {
        &self.defaults
    }

    /// Id of this process as recorded in lock rows.
    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    /// Close the pool. Subsequent calls fail with [`SkyError::Storage`].
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Run SQL migrations, tracking which have already been applied.
    async fn run_migrations(pool: &SqlitePool) -> Result<(), SkyError> {
        sqlx::raw_sql(
            "CREATE TABLE IF NOT EXISTS _migrations (
                name TEXT PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            );",
        )
        .execute(pool)
        .await
        .map_err(|e| SkyError::Storage(format!("failed to create migrations table: {e}")))?;

        let migrations: &[(&str, &str)] = &[
            (
                "001_conversations",
                include_str!("../../migrations/001_conversations.sql"),
            ),
            (
                "002_messages",
                include_str!("../../migrations/002_messages.sql"),
            ),
            (
                "003_summary_lock",
                include_str!("../../migrations/003_summary_lock.sql"),
            ),
            (
                "004_audit_log",
                include_str!("../../migrations/004_audit_log.sql"),
            ),
        ];

        for (name, sql) in migrations {
            let applied: Option<(String,)> =
                sqlx::query_as("SELECT name FROM _migrations WHERE name = ?")
                    .bind(name)
                    .fetch_optional(pool)
                    .await
                    .map_err(|e| {
                        SkyError::Storage(format!("failed to check migration {name}: {e}"))
                    })?;

            if applied.is_some() {
                continue;
            }

            sqlx::raw_sql(sql)
                .execute(pool)
                .await
                .map_err(|e| SkyError::Storage(format!("migration {name} failed: {e}")))?;

            // Another process may have applied the same migration concurrently.
            sqlx::query("INSERT OR IGNORE INTO _migrations (name) VALUES (?)")
                .bind(name)
                .execute(pool)
                .await
                .map_err(|e| {
                    SkyError::Storage(format!("failed to record migration {name}: {e}"))
                })?;
        }
        Ok(())
    }
}
