//! # skydigest-providers
//!
//! Summarization providers for skydigest. Every provider implements
//! [`Summarizer`](skydigest_core::traits::Summarizer) and degrades instead of
//! failing.

pub mod degraded;
pub mod openai;

pub use degraded::{degraded_summary, DegradedSummarizer};
pub use openai::OpenAiSummarizer;

use skydigest_core::config::SummarizerConfig;
use skydigest_core::traits::Summarizer;
use std::sync::Arc;
use tracing::warn;

/// Build the summarizer described by config.
pub fn build_summarizer(config: &SummarizerConfig) -> Arc<dyn Summarizer> {
    if config.api_key.trim().is_empty() {
        warn!("summarizer: no API key configured, digests will be degraded");
        return Arc::new(DegradedSummarizer);
    }
    Arc::new(OpenAiSummarizer::from_config(config))
}
