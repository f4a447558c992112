//! Webhook delivery.
//!
//! POSTs `{"conversation_id": …, "text": …}` JSON to a configured URL. Long
//! texts are split into several posts.

use crate::utils::split_message;
use async_trait::async_trait;
use skydigest_core::{
    config::DeliveryConfig, error::SkyError, message::OutgoingMessage, traits::Delivery,
};
use std::time::Duration;
use tracing::{debug, warn};

/// Largest text sent in a single post, in bytes.
const MAX_CHUNK: usize = 4000;

pub struct WebhookDelivery {
    client: reqwest::Client,
    url: String,
}

impl WebhookDelivery {
    pub fn from_config(config: &DeliveryConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                warn!("webhook: failed to build http client ({e}), using defaults");
                reqwest::Client::new()
            });
        Self {
            client,
            url: config.webhook_url.trim().to_string(),
        }
    }
}

#[async_trait]
impl Delivery for WebhookDelivery {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn send(&self, message: OutgoingMessage) -> Result<(), SkyError> {
        for chunk in split_message(&message.text, MAX_CHUNK) {
            let body = serde_json::json!({
                "conversation_id": message.conversation_id,
                "text": chunk,
            });

            let resp = self
                .client
                .post(&self.url)
                .json(&body)
                .send()
                .await
                .map_err(|e| SkyError::Delivery(format!("webhook send failed: {e}")))?;

            let status = resp.status();
            if !status.is_success() {
                let error_text = resp.text().await.unwrap_or_default();
                return Err(SkyError::Delivery(format!(
                    "webhook send failed ({status}): {error_text}"
                )));
            }
        }
        debug!("webhook: delivered to {}", message.conversation_id);
        Ok(())
    }
}
