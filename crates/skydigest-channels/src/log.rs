//! Log-only delivery, used when no outbound endpoint is configured.

use async_trait::async_trait;
use skydigest_core::{error::SkyError, message::OutgoingMessage, traits::Delivery};
use tracing::info;

pub struct LogDelivery;

#[async_trait]
impl Delivery for LogDelivery {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, message: OutgoingMessage) -> Result<(), SkyError> {
        info!(
            conversation = %message.conversation_id,
            "outbound: {}",
            message.text
        );
        Ok(())
    }
}
