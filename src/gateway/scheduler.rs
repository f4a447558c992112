//! Scheduler loops: the hourly scan and the daily fallback pass.
//!
//! Each pass reads the enabled conversations, picks the due ones, and runs
//! them concurrently as independent tasks. A pass still running when the next
//! tick fires is left alone and the new tick is skipped.

use super::{Gateway, RunOutcome};
use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use skydigest_core::conversation::{
    date_key_at, local_hour_at, resolve_timezone, Conversation,
};
use skydigest_memory::LockTrigger;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Tally of one pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassReport {
    pub candidates: usize,
    pub delivered: usize,
    pub degraded: usize,
    pub empty: usize,
    pub already_done: usize,
    pub lock_unavailable: usize,
}

impl PassReport {
    pub(super) fn record(&mut self, outcome: RunOutcome) {
        match outcome {
            RunOutcome::Delivered { degraded } => {
                self.delivered += 1;
                if degraded {
                    self.degraded += 1;
                }
            }
            RunOutcome::Empty => self.empty += 1,
            RunOutcome::AlreadyDone => self.already_done += 1,
            RunOutcome::LockUnavailable => self.lock_unavailable += 1,
        }
    }
}

/// Holds an in-flight flag for the lifetime of a pass.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn enter(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Time until the next `:minute` past the hour, strictly after `now`.
pub(crate) fn until_next_minute(now: DateTime<Utc>, minute: u32) -> Duration {
    let current = u64::from(now.minute()) * 60 + u64::from(now.second());
    let target = u64::from(minute.min(59)) * 60;
    let secs = if target > current {
        target - current
    } else {
        3600 - current + target
    };
    Duration::from_secs(secs)
}

/// Next instant strictly after `now` at which the wall clock in `tz` reads
/// `hour:minute`. Days on which that time does not exist are skipped.
pub(crate) fn next_local_occurrence(
    tz: Tz,
    now: DateTime<Utc>,
    hour: u32,
    minute: u32,
) -> DateTime<Utc> {
    let time = NaiveTime::from_hms_opt(hour.min(23), minute.min(59), 0).unwrap_or(NaiveTime::MIN);
    let mut day = now.with_timezone(&tz).date_naive();
    for _ in 0..3 {
        if let Some(at) = tz.from_local_datetime(&day.and_time(time)).earliest() {
            let at = at.with_timezone(&Utc);
            if at > now {
                return at;
            }
        }
        day = day.checked_add_days(Days::new(1)).unwrap_or(day);
    }
    now + chrono::Duration::days(1)
}

impl Gateway {
    /// Background task: hourly scan at `scan_minute`.
    pub(super) async fn periodic_scan_loop(self: Arc<Self>) {
        info!(
            "scheduler: hourly scan at *:{:02}",
            self.scheduler_config.scan_minute
        );
        loop {
            let wait = until_next_minute(Utc::now(), self.scheduler_config.scan_minute);
            tokio::time::sleep(wait).await;

            let gw = self.clone();
            tokio::spawn(async move {
                gw.periodic_scan_at(Utc::now()).await;
            });
        }
    }

    /// Background task: daily fallback pass in the default timezone.
    pub(super) async fn fallback_loop(self: Arc<Self>) {
        let tz = self.scheduler_config.default_tz();
        let (hour, minute) = (
            self.scheduler_config.fallback_hour,
            self.scheduler_config.fallback_minute,
        );
        info!("scheduler: daily fallback at {hour:02}:{minute:02} ({tz})");
        loop {
            let now = Utc::now();
            let next = next_local_occurrence(tz, now, hour, minute);
            let wait = (next - now).to_std().unwrap_or(Duration::from_secs(60));
            tokio::time::sleep(wait).await;

            let gw = self.clone();
            tokio::spawn(async move {
                gw.fallback_pass_at(Utc::now()).await;
            });
        }
    }

    /// One hourly scan as of `now`. `None` if a scan is already running.
    pub async fn periodic_scan_at(self: &Arc<Self>, now: DateTime<Utc>) -> Option<PassReport> {
        let Some(_guard) = InFlight::enter(&self.scan_in_flight) else {
            warn!("scheduler: previous hourly scan still running, skipping tick");
            return None;
        };
        let report = self.run_pass(now, LockTrigger::HourlyScan).await;
        info!("scheduler: hourly scan done {report:?}");
        Some(report)
    }

    /// One fallback pass as of `now`. `None` if a fallback pass is already running.
    pub async fn fallback_pass_at(self: &Arc<Self>, now: DateTime<Utc>) -> Option<PassReport> {
        let Some(_guard) = InFlight::enter(&self.fallback_in_flight) else {
            warn!("scheduler: previous fallback pass still running, skipping");
            return None;
        };
        let report = self.run_pass(now, LockTrigger::DailyFallback).await;
        info!("scheduler: daily fallback done {report:?}");
        Some(report)
    }

    async fn run_pass(self: &Arc<Self>, now: DateTime<Utc>, trigger: LockTrigger) -> PassReport {
        let conversations = match self
            .with_storage_timeout("load conversations", self.store.get_enabled_conversations())
            .await
        {
            Ok(c) => c,
            Err(e) => {
                warn!("scheduler: cannot read schedule, nothing due this tick: {e}");
                return PassReport::default();
            }
        };

        let default_tz = self.scheduler_config.default_tz();
        let jobs: Vec<(Conversation, NaiveDate)> = conversations
            .into_iter()
            .filter_map(|conv| {
                let tz = resolve_timezone(&conv.timezone, default_tz);
                let due = trigger == LockTrigger::DailyFallback
                    || local_hour_at(tz, now) == conv.summary_hour;
                due.then(|| {
                    let key = date_key_at(tz, now);
                    (conv, key)
                })
            })
            .collect();

        self.run_jobs(jobs, trigger).await
    }

    /// Run every `(conversation, date key)` job as its own task and tally. At
    /// most `max_concurrent_runs` jobs run at once.
    pub(super) async fn run_jobs(
        self: &Arc<Self>,
        jobs: Vec<(Conversation, NaiveDate)>,
        trigger: LockTrigger,
    ) -> PassReport {
        let mut report = PassReport {
            candidates: jobs.len(),
            ..Default::default()
        };
        let mut handles = Vec::with_capacity(jobs.len());
        for (conv, key) in jobs {
            let gw = self.clone();
            let limit = self.run_limit.clone();
            handles.push(tokio::spawn(async move {
                let Ok(_permit) = limit.acquire_owned().await else {
                    return RunOutcome::LockUnavailable;
                };
                gw.run_summary(&conv, key, trigger).await
            }));
        }
        for h in handles {
            match h.await {
                Ok(outcome) => report.record(outcome),
                Err(e) => {
                    error!("scheduler: digest task failed: {e}");
                    report.lock_unavailable += 1;
                }
            }
        }
        report
    }
}
