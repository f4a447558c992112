//! Digest execution path: lock, load, summarize, deliver.
//!
//! The lock row is the only guard. Once acquired it is never released, so a
//! run that fails downstream still consumes its date key.

use super::Gateway;
use crate::i18n;
use chrono::NaiveDate;
use skydigest_core::{
    conversation::{
        covered_day, covered_window_ms, format_date_key, resolve_timezone, Conversation,
    },
    traits::SummaryRequest,
};
use skydigest_memory::LockTrigger;
use std::time::Duration;
use tracing::{info, warn};

/// Result of one execution-path attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Digest delivered. `degraded` when the model was not used.
    Delivered { degraded: bool },
    /// The covered day held no text; a notice was delivered.
    Empty,
    /// Another run already owns the date key.
    AlreadyDone,
    /// The lock could not be checked; the key stays open for a later pass.
    LockUnavailable,
}

impl Gateway {
    /// Run the digest for `conv` under `date_key` (the local run date; the
    /// previous local day is summarized).
    pub(super) async fn run_summary(
        &self,
        conv: &Conversation,
        date_key: NaiveDate,
        trigger: LockTrigger,
    ) -> RunOutcome {
        let key = format_date_key(date_key);
        let acquired = self
            .with_storage_timeout(
                "acquire summary lock",
                self.store.try_acquire_summary_lock(&conv.id, &key, trigger),
            )
            .await;
        match acquired {
            Ok(true) => {}
            Ok(false) => return RunOutcome::AlreadyDone,
            Err(e) => {
                warn!("summary lock for {} on {key} unavailable: {e}", conv.id);
                return RunOutcome::LockUnavailable;
            }
        }

        let lang = conv.language;
        let tz = resolve_timezone(&conv.timezone, self.scheduler_config.default_tz());
        let day_label = format_date_key(covered_day(date_key));
        let (start_ms, end_ms) = covered_window_ms(tz, date_key);

        let messages = match self
            .with_storage_timeout(
                "load messages",
                self.store.get_messages_between(&conv.id, start_ms, end_ms),
            )
            .await
        {
            Ok(m) => m,
            Err(e) => {
                warn!("digest {} {day_label}: cannot load messages: {e}", conv.id);
                self.send_text(&conv.id, i18n::t("summary_unavailable", lang))
                    .await;
                return RunOutcome::Delivered { degraded: true };
            }
        };

        if messages.is_empty() {
            info!("digest {} {day_label}: no messages ({trigger})", conv.id);
            self.send_text(&conv.id, &i18n::empty_day(lang, &day_label))
                .await;
            return RunOutcome::Empty;
        }

        let request = SummaryRequest {
            conversation_id: conv.id.clone(),
            day_label: day_label.clone(),
            language: lang,
            messages,
        };
        let limit = Duration::from_secs(self.scheduler_config.summarize_timeout_secs);
        let summary = match tokio::time::timeout(limit, self.summarizer.summarize(&request)).await
        {
            Ok(summary) => summary,
            Err(_) => {
                warn!(
                    "digest {} {day_label}: {} timed out after {limit:?}",
                    conv.id,
                    self.summarizer.name()
                );
                self.send_text(&conv.id, i18n::t("summary_unavailable", lang))
                    .await;
                return RunOutcome::Delivered { degraded: true };
            }
        };

        self.send_text(&conv.id, &i18n::digest(lang, &day_label, &summary.text))
            .await;
        info!(
            "digest {} {day_label}: delivered ({trigger}, {} messages{})",
            conv.id,
            request.messages.len(),
            if summary.degraded { ", degraded" } else { "" }
        );
        RunOutcome::Delivered {
            degraded: summary.degraded,
        }
    }
}
