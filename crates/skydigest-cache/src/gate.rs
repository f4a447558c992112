//! Idempotency gate for at-least-once inbound events.

use skydigest_core::{error::SkyError, traits::SharedCache};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Remembers processed event ids for a retention window.
#[derive(Clone)]
pub struct IdempotencyGate {
    cache: Arc<dyn SharedCache>,
    prefix: String,
    ttl: Duration,
}

impl IdempotencyGate {
    pub fn new(cache: Arc<dyn SharedCache>, prefix: &str, ttl: Duration) -> Self {
        Self {
            cache,
            prefix: prefix.to_string(),
            ttl,
        }
    }

    fn key(&self, event_id: &str) -> String {
        format!("{}:event:{event_id}", self.prefix)
    }

    /// Claim an event id. `true` exactly once per id while the marker lives.
    pub async fn claim(&self, event_id: &str) -> Result<bool, SkyError> {
        let event_id = event_id.trim();
        if event_id.is_empty() {
            return Err(SkyError::InvalidInput("event id is empty".into()));
        }
        let claimed = self
            .cache
            .set_if_absent(&self.key(event_id), "1", self.ttl)
            .await?;
        if !claimed {
            debug!("duplicate event {event_id} dropped");
        }
        Ok(claimed)
    }
}
