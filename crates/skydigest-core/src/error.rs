use thiserror::Error;

/// Top-level error type for skydigest.
#[derive(Debug, Error)]
pub enum SkyError {
    /// Durable storage (SQLite) failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Shared cache failure (Redis unreachable, protocol error).
    #[error("cache error: {0}")]
    Cache(String),

    /// A bounded external call ran out of time.
    #[error("timed out: {0}")]
    Timeout(String),

    /// Summarization provider failure.
    #[error("provider error: {0}")]
    Provider(String),

    /// Outbound delivery failure.
    #[error("delivery error: {0}")]
    Delivery(String),

    /// Malformed user or event input. Nothing was mutated.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Privileged operation without a valid grant.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SkyError {
    /// Infrastructure failures that the next scheduler tick may recover from.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Storage(_) | Self::Cache(_) | Self::Timeout(_) | Self::Io(_)
        )
    }

    /// Failures that should be shown to the user as-is.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::Unauthorized(_))
    }
}
