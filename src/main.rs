mod api;
mod commands;
mod gateway;
mod i18n;

use clap::{Parser, Subcommand};
use skydigest_cache::FallbackCache;
use skydigest_core::{
    config::{self, shellexpand, Config},
    traits::SharedCache,
};
use skydigest_memory::Store;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// How long startup waits for the store to become reachable.
const STORE_READY_TIMEOUT: Duration = Duration::from_secs(60);
const STORE_RETRY_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Parser)]
#[command(
    name = "skydigest",
    version,
    about = "Scheduled daily chat digests for group conversations"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml", env = "SKYDIGEST_CONFIG")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scheduler worker and the event API.
    Start,
    /// Print configuration and conversation counts.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli.config)?;

    match cli.command {
        Commands::Start => {
            let _guard = init_tracing(&cfg);

            let store = open_store_with_retry(&cfg).await?;
            let cache = FallbackCache::from_config(&cfg.cache).await;
            let cache: Arc<dyn SharedCache> = Arc::new(cache);
            let summarizer = skydigest_providers::build_summarizer(&cfg.summarizer);
            let delivery = skydigest_channels::build_delivery(&cfg.delivery);

            let gw = gateway::Gateway::new(&cfg, store, cache, summarizer, delivery);
            Arc::new(gw).run(cfg.api.clone()).await?;
        }
        Commands::Status => {
            println!("skydigest status\n");
            println!("Config: {}", cli.config);
            println!("Database: {}", shellexpand(&cfg.memory.db_path));
            println!(
                "Cache: {}",
                if cfg.cache.redis_url.is_empty() {
                    "process-local"
                } else {
                    "redis"
                }
            );
            println!(
                "Scheduler: {} (scan at *:{:02}, fallback {} at {:02}:{:02} {})",
                on_off(cfg.scheduler.enabled),
                cfg.scheduler.scan_minute,
                on_off(cfg.scheduler.fallback_enabled),
                cfg.scheduler.fallback_hour,
                cfg.scheduler.fallback_minute,
                cfg.scheduler.default_timezone,
            );
            println!(
                "Summarizer: {}",
                if cfg.summarizer.api_key.is_empty() {
                    "degraded (no API key)".to_string()
                } else {
                    cfg.summarizer.model.clone()
                }
            );
            println!(
                "Delivery: {}",
                if cfg.delivery.webhook_url.is_empty() {
                    "log"
                } else {
                    "webhook"
                }
            );
            println!(
                "Admin login: {}",
                if cfg.admin.code.is_empty() {
                    "not configured"
                } else {
                    "configured"
                }
            );
            println!();

            let store = Store::new(&cfg.memory, cfg.scheduler.schedule_defaults()).await?;
            let (enabled, total) = store.count_conversations().await?;
            println!("Conversations: {enabled} enabled / {total} known");
            store.close().await;
        }
    }

    Ok(())
}

fn on_off(on: bool) -> &'static str {
    if on {
        "enabled"
    } else {
        "disabled"
    }
}

/// Console plus daily-rolling file logging. The returned guard flushes the
/// file writer on drop.
fn init_tracing(cfg: &Config) -> tracing_appender::non_blocking::WorkerGuard {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.app.log_level.as_str()));

    let log_dir = format!("{}/logs", shellexpand(&cfg.app.data_dir));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "skydigest.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
        .init();

    guard
}

/// Open the store, retrying while the database is not reachable yet.
async fn open_store_with_retry(cfg: &Config) -> anyhow::Result<Store> {
    let started = tokio::time::Instant::now();
    loop {
        match Store::new(&cfg.memory, cfg.scheduler.schedule_defaults()).await {
            Ok(store) => return Ok(store),
            Err(e) if started.elapsed() + STORE_RETRY_INTERVAL < STORE_READY_TIMEOUT => {
                warn!("store not ready, retrying in {STORE_RETRY_INTERVAL:?}: {e}");
                tokio::time::sleep(STORE_RETRY_INTERVAL).await;
            }
            Err(e) => {
                anyhow::bail!("store not ready after {STORE_READY_TIMEOUT:?}: {e}");
            }
        }
    }
}
