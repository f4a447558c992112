use crate::{
    conversation::Language,
    error::SkyError,
    message::{OutgoingMessage, StoredMessage},
};
use async_trait::async_trait;
use std::time::Duration;

/// Shared atomic key/value cache with expiry.
///
/// Backs the idempotency gate and the admin session store. Implementations
/// must make `set_if_absent` a single atomic operation on the server side so
/// that racing processes observe exactly one winner.
#[async_trait]
pub trait SharedCache: Send + Sync {
    /// Human-readable backend name, used in log lines.
    fn name(&self) -> &str;

    /// Store `value` under `key` only if the key is absent. Returns `true` if stored.
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration)
        -> Result<bool, SkyError>;

    /// Store `value` under `key`, replacing any previous value and resetting the expiry.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), SkyError>;

    /// Read a live value.
    async fn get(&self, key: &str) -> Result<Option<String>, SkyError>;

    /// Remove a key. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), SkyError>;
}

/// Input for one digest.
#[derive(Debug, Clone)]
pub struct SummaryRequest {
    pub conversation_id: String,
    /// Human label of the covered day (`YYYY-MM-DD`).
    pub day_label: String,
    pub language: Language,
    pub messages: Vec<StoredMessage>,
}

/// Output of the summarization pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub text: String,
    /// `true` when the model was unavailable and `text` is a marked fallback.
    pub degraded: bool,
}

/// Summarization pipeline.
///
/// Never fails: every upstream error is converted into a degraded summary.
#[async_trait]
pub trait Summarizer: Send + Sync {
    fn name(&self) -> &str;

    async fn summarize(&self, request: &SummaryRequest) -> Summary;
}

/// Outbound delivery channel. Best effort.
#[async_trait]
pub trait Delivery: Send + Sync {
    fn name(&self) -> &str;

    async fn send(&self, message: OutgoingMessage) -> Result<(), SkyError>;
}
