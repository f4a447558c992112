//! In-band command execution.
//!
//! Replies go back to the issuing conversation in its configured language.
//! Privileged commands are checked against the admin sessions here, never in
//! the parser.

use super::Gateway;
use crate::commands::{DateRange, ScheduleCommand};
use crate::i18n;
use chrono::{DateTime, NaiveDate, Utc};
use skydigest_cache::AdminError;
use skydigest_core::{
    conversation::{
        date_key_at, date_key_for_covered_day, parse_timezone, resolve_timezone, Conversation,
        SchedulePatch,
    },
    error::SkyError,
    message::InboundEvent,
};
use skydigest_memory::{AuditEntry, AuditStatus, LockTrigger};
use std::sync::Arc;
use tracing::{debug, info, warn};

impl Gateway {
    /// Parse and execute a prefixed command, replying in the conversation.
    pub(super) async fn handle_command(self: &Arc<Self>, event: &InboundEvent) {
        let conv_id = event.conversation_id.as_str();
        let conv = self.load_conversation(conv_id).await;
        let lang = conv.language;

        let reply = match self.parser.parse(&event.text) {
            Ok(Some(cmd)) => {
                info!("command '{}' in {conv_id}", cmd.verb());
                self.execute(cmd, event, &conv).await
            }
            Ok(None) => {
                debug!("unrecognised command in {conv_id}, not replying");
                None
            }
            Err(e) => {
                info!("rejected command in {conv_id}: {e}");
                Some(i18n::command_error(lang, &e))
            }
        };

        if let Some(text) = reply {
            self.send_text(conv_id, &text).await;
        }
    }

    /// Current row, or defaults when storage cannot be read.
    async fn load_conversation(&self, conv_id: &str) -> Conversation {
        let loaded = self
            .with_storage_timeout("load conversation", self.store.get_conversation(conv_id))
            .await;
        match loaded {
            Ok(Some(conv)) => conv,
            Ok(None) => self.default_conversation(conv_id),
            Err(e) => {
                warn!("failed to load {conv_id}, using defaults: {e}");
                self.default_conversation(conv_id)
            }
        }
    }

    fn default_conversation(&self, conv_id: &str) -> Conversation {
        let d = self.store.defaults();
        Conversation {
            id: conv_id.to_string(),
            name: None,
            enabled: true,
            summary_hour: d.hour,
            timezone: d.timezone.clone(),
            language: d.language,
            last_seen_at: String::new(),
            created_at: String::new(),
        }
    }

    /// Execute a parsed command. Returns the reply text, if any.
    ///
    /// `RunOnce` replies with the digest itself and only adds a text when the
    /// day is already done.
    pub(super) async fn execute(
        self: &Arc<Self>,
        cmd: ScheduleCommand,
        event: &InboundEvent,
        conv: &Conversation,
    ) -> Option<String> {
        let lang = conv.language;
        let conv_id = conv.id.as_str();
        let verb = cmd.verb();
        let unavailable = || Some(i18n::t("temporarily_unavailable", lang).to_string());

        if cmd.is_privileged()
            && !self
                .sessions
                .is_admin(event.sender_id.as_deref(), conv_id)
                .await
        {
            warn!("denied '{verb}' in {conv_id}: no admin session");
            self.audit_command(event, verb, AuditStatus::Denied, Some("no admin session"))
                .await;
            return Some(i18n::t("admin_required", lang).to_string());
        }

        match cmd {
            ScheduleCommand::Enable | ScheduleCommand::Disable => {
                let on = verb == "on";
                match self
                    .with_storage_timeout("set enabled", self.store.set_enabled(conv_id, on))
                    .await
                {
                    Ok(()) => Some(i18n::t(if on { "enabled" } else { "disabled" }, lang).into()),
                    Err(e) => {
                        warn!("set enabled for {conv_id} failed: {e}");
                        unavailable()
                    }
                }
            }
            ScheduleCommand::SetHour(hour) => self
                .apply_patch(conv_id, SchedulePatch::hour(hour))
                .await
                .map(|()| i18n::hour_set(lang, hour))
                .or_else(unavailable),
            ScheduleCommand::SetTimezone(raw) => match parse_timezone(&raw) {
                Some(tz) => self
                    .apply_patch(conv_id, SchedulePatch::timezone(tz.name()))
                    .await
                    .map(|()| i18n::timezone_set(lang, tz.name()))
                    .or_else(unavailable),
                None => Some(i18n::invalid_timezone(lang, &raw)),
            },
            ScheduleCommand::SetLanguage(new_lang) => self
                .apply_patch(conv_id, SchedulePatch::language(new_lang))
                .await
                .map(|()| i18n::language_set(new_lang))
                .or_else(unavailable),
            ScheduleCommand::RunOnce => {
                let key = date_key_at(self.conversation_tz(conv), Utc::now());
                match self.run_summary(conv, key, LockTrigger::Manual).await {
                    super::RunOutcome::AlreadyDone => {
                        Some(i18n::t("already_done", lang).to_string())
                    }
                    super::RunOutcome::LockUnavailable => unavailable(),
                    _ => None,
                }
            }
            ScheduleCommand::RunRange(range) => {
                if !self.range_is_past(conv, &range) {
                    return Some(i18n::t("range_not_past", lang).to_string());
                }
                let mut sent = 0;
                let mut skipped = 0;
                for day in range.iter() {
                    let key = date_key_for_covered_day(day);
                    match self.run_summary(conv, key, LockTrigger::Range).await {
                        super::RunOutcome::AlreadyDone => skipped += 1,
                        super::RunOutcome::LockUnavailable => {}
                        _ => sent += 1,
                    }
                }
                Some(i18n::range_done(lang, sent, skipped))
            }
            ScheduleCommand::RunAllRange(range) => {
                let subject = subject_of(event);
                if !self.range_is_past(conv, &range) {
                    return Some(i18n::t("range_not_past", lang).to_string());
                }
                let tally = match self.run_all_range(range, Utc::now()).await {
                    Ok(tally) => tally,
                    Err(e) => {
                        warn!("all range by {subject} failed: {e}");
                        let detail = e.to_string();
                        self.audit_command(event, verb, AuditStatus::Error, Some(&detail))
                            .await;
                        return unavailable();
                    }
                };
                let detail = format!(
                    "{}..{} conversations={} sent={} skipped={} deferred={}",
                    range.start,
                    range.end,
                    tally.conversations,
                    tally.sent,
                    tally.skipped,
                    tally.deferred
                );
                self.audit_command(event, verb, AuditStatus::Ok, Some(&detail))
                    .await;
                Some(i18n::all_range_done(
                    lang,
                    tally.conversations,
                    tally.sent,
                    tally.skipped,
                    tally.deferred,
                ))
            }
            ScheduleCommand::Login(code) => {
                let subject = subject_of(event);
                match self.sessions.login(subject, &code).await {
                    Ok(()) => {
                        self.audit_command(event, verb, AuditStatus::Ok, None).await;
                        Some(i18n::login_ok(lang, self.session_ttl.as_secs() / 3600))
                    }
                    Err(AdminError::InvalidCode) => {
                        warn!("admin login with invalid code in {conv_id}");
                        self.audit_command(
                            event,
                            verb,
                            AuditStatus::Denied,
                            Some("invalid code"),
                        )
                        .await;
                        Some(i18n::t("login_invalid", lang).to_string())
                    }
                    Err(AdminError::NotConfigured) => {
                        Some(i18n::t("login_not_configured", lang).to_string())
                    }
                    Err(AdminError::Cache(e)) => {
                        warn!("admin login failed: {e}");
                        let detail = e.to_string();
                        self.audit_command(event, verb, AuditStatus::Error, Some(&detail))
                            .await;
                        unavailable()
                    }
                }
            }
            ScheduleCommand::Logout => {
                if let Err(e) = self.sessions.logout(subject_of(event)).await {
                    warn!("admin logout failed: {e}");
                }
                self.audit_command(event, verb, AuditStatus::Ok, None).await;
                Some(i18n::t("logout_ok", lang).to_string())
            }
            ScheduleCommand::Status => Some(i18n::status(lang, conv)),
            ScheduleCommand::Help => Some(i18n::t("help", lang).to_string()),
        }
    }

    async fn apply_patch(&self, conv_id: &str, patch: SchedulePatch) -> Option<()> {
        match self
            .with_storage_timeout("set schedule", self.store.set_schedule(conv_id, &patch))
            .await
        {
            Ok(()) => Some(()),
            Err(e) => {
                warn!("set schedule for {conv_id} failed: {e}");
                None
            }
        }
    }

    fn conversation_tz(&self, conv: &Conversation) -> chrono_tz::Tz {
        resolve_timezone(&conv.timezone, self.scheduler_config.default_tz())
    }

    /// A range may only cover days that have fully ended for the requester.
    fn range_is_past(&self, conv: &Conversation, range: &DateRange) -> bool {
        let today: NaiveDate = date_key_at(self.conversation_tz(conv), Utc::now());
        range.end < today
    }

    /// Backfill `range` for every enabled conversation. Days that have not
    /// yet ended in a conversation's own timezone are deferred, so the
    /// scheduler still owns their date keys.
    async fn run_all_range(
        self: &Arc<Self>,
        range: DateRange,
        now: DateTime<Utc>,
    ) -> Result<BulkTally, SkyError> {
        let conversations = self
            .with_storage_timeout("load conversations", self.store.get_enabled_conversations())
            .await?;
        let mut tally = BulkTally {
            conversations: conversations.len(),
            ..Default::default()
        };

        let mut jobs: Vec<(Conversation, NaiveDate)> = Vec::new();
        for conv in conversations {
            let today = date_key_at(self.conversation_tz(&conv), now);
            for day in range.iter() {
                if day < today {
                    jobs.push((conv.clone(), date_key_for_covered_day(day)));
                } else {
                    tally.deferred += 1;
                }
            }
        }
        if tally.deferred > 0 {
            info!(
                "all range {}..{}: {} day(s) not yet ended locally, deferred",
                range.start, range.end, tally.deferred
            );
        }

        let report = self.run_jobs(jobs, LockTrigger::Range).await;
        tally.sent = report.delivered + report.empty;
        tally.skipped = report.already_done;
        Ok(tally)
    }

    async fn audit_command(
        &self,
        event: &InboundEvent,
        command: &str,
        status: AuditStatus,
        detail: Option<&str>,
    ) {
        let entry = AuditEntry {
            conversation_id: event.conversation_id.clone(),
            sender_id: event.sender_id.clone(),
            command: command.to_string(),
            status,
            detail: detail.map(str::to_string),
        };
        if let Err(e) = self.audit.log(&entry).await {
            warn!("audit write failed: {e}");
        }
    }
}

/// Outcome counts of a bulk backfill.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(super) struct BulkTally {
    pub conversations: usize,
    pub sent: usize,
    pub skipped: usize,
    /// Conversation-days skipped because they have not ended locally.
    pub deferred: usize,
}

/// Session subject: the sender, or the conversation when no sender is known.
fn subject_of(event: &InboundEvent) -> &str {
    event
        .sender_id
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(&event.conversation_id)
}
