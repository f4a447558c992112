//! Gateway: connects inbound events, the stores, the scheduler, and delivery.
//!
//! Includes: idempotent ingest, in-band command execution with admin gating
//! and audit logging, the digest execution path, the periodic and fallback
//! scheduler passes, and graceful shutdown.

mod commands;
mod ingest;
mod runner;
mod scheduler;


pub use ingest::EventOutcome;
pub use runner::RunOutcome;
pub use scheduler::PassReport;

use crate::commands::CommandParser;
use skydigest_cache::{AdminSessions, IdempotencyGate};
use skydigest_core::{
    config::{ApiConfig, Config, SchedulerConfig},
    error::SkyError,
    message::OutgoingMessage,
    traits::{Delivery, SharedCache, Summarizer},
};
use skydigest_memory::{AuditLogger, Store};
use std::future::Future;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{info, warn};

/// The central gateway.
pub struct Gateway {
    pub(super) store: Store,
    pub(super) audit: AuditLogger,
    pub(super) gate: IdempotencyGate,
    pub(super) sessions: AdminSessions,
    pub(super) parser: CommandParser,
    pub(super) summarizer: Arc<dyn Summarizer>,
    pub(super) delivery: Arc<dyn Delivery>,
    pub(super) scheduler_config: SchedulerConfig,
    pub(super) session_ttl: Duration,
    /// Bounds digest runs in flight across every pass and backfill.
    pub(super) run_limit: Arc<Semaphore>,
    /// Set while a periodic scan pass is running.
    pub(super) scan_in_flight: AtomicBool,
    /// Set while a fallback pass is running.
    pub(super) fallback_in_flight: AtomicBool,
    pub(super) uptime: Instant,
}

impl Gateway {
    /// Create a new gateway. `cache` backs both the idempotency gate and the
    /// admin sessions.
    pub fn new(
        config: &Config,
        store: Store,
        cache: Arc<dyn SharedCache>,
        summarizer: Arc<dyn Summarizer>,
        delivery: Arc<dyn Delivery>,
    ) -> Self {
        let audit = AuditLogger::new(store.pool().clone());
        let gate = IdempotencyGate::new(
            cache.clone(),
            &config.cache.key_prefix,
            config.cache.idempotency_ttl(),
        );
        let sessions = AdminSessions::new(
            cache,
            &config.cache.key_prefix,
            &config.admin.code,
            config.admin.session_ttl(),
        );
        Self {
            store,
            audit,
            gate,
            sessions,
            parser: CommandParser::from_config(&config.commands),
            summarizer,
            delivery,
            scheduler_config: config.scheduler.clone(),
            session_ttl: config.admin.session_ttl(),
            run_limit: Arc::new(Semaphore::new(config.scheduler.max_concurrent_runs.max(1))),
            scan_in_flight: AtomicBool::new(false),
            fallback_in_flight: AtomicBool::new(false),
            uptime: Instant::now(),
        }
    }

    /// Run the scheduler loops and the event API until Ctrl-C.
    pub async fn run(self: Arc<Self>, api_config: ApiConfig) -> anyhow::Result<()> {
        info!(
            "skydigest gateway running | summarizer: {} | delivery: {} | scheduler: {}",
            self.summarizer.name(),
            self.delivery.name(),
            if self.scheduler_config.enabled {
                "enabled"
            } else {
                "disabled"
            },
        );

        let mut handles = Vec::new();

        if self.scheduler_config.enabled {
            let gw = self.clone();
            handles.push(tokio::spawn(async move { gw.periodic_scan_loop().await }));

            if self.scheduler_config.fallback_enabled {
                let gw = self.clone();
                handles.push(tokio::spawn(async move { gw.fallback_loop().await }));
            }
        }

        if api_config.enabled {
            let gw = self.clone();
            handles.push(tokio::spawn(async move {
                crate::api::serve(api_config, gw).await;
            }));
        }

        tokio::signal::ctrl_c().await?;
        info!("Received shutdown signal");

        self.shutdown(&handles).await;
        Ok(())
    }

    /// Graceful shutdown: stop background loops, close the store.
    async fn shutdown(&self, handles: &[tokio::task::JoinHandle<()>]) {
        info!("Shutting down...");
        for h in handles {
            h.abort();
        }
        self.store.close().await;
        info!("Shutdown complete.");
    }

    /// Seconds since start.
    pub fn uptime_secs(&self) -> u64 {
        self.uptime.elapsed().as_secs()
    }

    /// Bound a storage call by the configured timeout.
    pub(super) async fn with_storage_timeout<T>(
        &self,
        what: &str,
        fut: impl Future<Output = Result<T, SkyError>>,
    ) -> Result<T, SkyError> {
        let limit = Duration::from_secs(self.scheduler_config.storage_timeout_secs);
        match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => Err(SkyError::Timeout(format!("{what} after {limit:?}"))),
        }
    }

    /// Best-effort delivery of a text to a conversation.
    pub(super) async fn send_text(&self, conversation_id: &str, text: &str) {
        let limit = Duration::from_secs(self.scheduler_config.delivery_timeout_secs);
        let msg = OutgoingMessage::new(conversation_id, text);
        match tokio::time::timeout(limit, self.delivery.send(msg)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("delivery to {conversation_id} failed: {e}"),
            Err(_) => warn!("delivery to {conversation_id} timed out after {limit:?}"),
        }
    }
}
