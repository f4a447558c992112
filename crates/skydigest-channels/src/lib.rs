//! # skydigest-channels
//!
//! Outbound delivery for skydigest replies and digests.

pub mod log;
pub mod utils;
pub mod webhook;

pub use log::LogDelivery;
pub use webhook::WebhookDelivery;

use skydigest_core::config::DeliveryConfig;
use skydigest_core::traits::Delivery;
use std::sync::Arc;
use tracing::info;

/// Build the delivery channel described by config.
pub fn build_delivery(config: &DeliveryConfig) -> Arc<dyn Delivery> {
    if config.webhook_url.trim().is_empty() {
        info!("delivery: no webhook configured, outbound text goes to the log");
        return Arc::new(LogDelivery);
    }
    Arc::new(WebhookDelivery::from_config(config))
}
