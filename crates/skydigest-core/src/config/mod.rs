mod defaults;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::conversation::{parse_timezone, Language, ScheduleDefaults};
use crate::error::SkyError;
use defaults::*;

/// Top-level skydigest configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub commands: CommandConfig,
    #[serde(default)]
    pub summarizer: SummarizerConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

/// General process settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

/// Durable store config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

/// Shared cache config. An empty `redis_url` means process-local only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub redis_url: String,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// How long a processed event id is remembered.
    #[serde(default = "default_idempotency_ttl")]
    pub idempotency_ttl_secs: u64,
    /// Per-operation timeout against the shared cache.
    #[serde(default = "default_cache_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: String::new(),
            key_prefix: default_key_prefix(),
            idempotency_ttl_secs: default_idempotency_ttl(),
            timeout_ms: default_cache_timeout_ms(),
        }
    }
}

impl CacheConfig {
    pub fn idempotency_ttl(&self) -> Duration {
        Duration::from_secs(self.idempotency_ttl_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Digest scheduler config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Minute past each hour at which the periodic scan fires.
    #[serde(default = "default_scan_minute")]
    pub scan_minute: u32,
    #[serde(default = "default_true")]
    pub fallback_enabled: bool,
    /// Daily fallback pass time, in `default_timezone`.
    #[serde(default = "default_fallback_hour")]
    pub fallback_hour: u32,
    #[serde(default = "default_fallback_minute")]
    pub fallback_minute: u32,
    #[serde(default = "default_timezone")]
    pub default_timezone: String,
    #[serde(default = "default_summary_hour")]
    pub default_hour: u32,
    #[serde(default)]
    pub default_language: Language,
    #[serde(default = "default_storage_timeout")]
    pub storage_timeout_secs: u64,
    #[serde(default = "default_summarize_timeout")]
    pub summarize_timeout_secs: u64,
    #[serde(default = "default_delivery_timeout")]
    pub delivery_timeout_secs: u64,
    /// Upper bound on digest runs in flight at once, across all passes.
    #[serde(default = "default_max_concurrent_runs")]
    pub max_concurrent_runs: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            scan_minute: default_scan_minute(),
            fallback_enabled: true,
            fallback_hour: default_fallback_hour(),
            fallback_minute: default_fallback_minute(),
            default_timezone: default_timezone(),
            default_hour: default_summary_hour(),
            default_language: Language::default(),
            storage_timeout_secs: default_storage_timeout(),
            summarize_timeout_secs: default_summarize_timeout(),
            delivery_timeout_secs: default_delivery_timeout(),
            max_concurrent_runs: default_max_concurrent_runs(),
        }
    }
}

impl SchedulerConfig {
    /// Values for newly created conversation rows.
    pub fn schedule_defaults(&self) -> ScheduleDefaults {
        ScheduleDefaults {
            hour: self.default_hour.min(23),
            timezone: self.default_timezone.clone(),
            language: self.default_language,
        }
    }

    /// The system default zone. Falls back to UTC if the configured name is invalid.
    pub fn default_tz(&self) -> chrono_tz::Tz {
        parse_timezone(&self.default_timezone).unwrap_or(chrono_tz::UTC)
    }
}

/// Admin session config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Shared login code. Empty = admin login disabled.
    #[serde(default)]
    pub code: String,
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            code: String::new(),
            session_ttl_secs: default_session_ttl(),
        }
    }
}

impl AdminConfig {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

/// In-band command config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandConfig {
    #[serde(default = "default_command_prefix")]
    pub prefix: String,
    /// Largest accepted `range` span, counted in days inclusive.
    #[serde(default = "default_max_range_days")]
    pub max_range_days: u32,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            prefix: default_command_prefix(),
            max_range_days: default_max_range_days(),
        }
    }
}

/// OpenAI-compatible summarizer config. Empty `api_key` = degraded summaries only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    #[serde(default = "default_openai_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_openai_base_url(),
            model: default_openai_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            max_input_chars: default_max_input_chars(),
            timeout_secs: default_provider_timeout(),
        }
    }
}

/// Outbound delivery config. Empty `webhook_url` = log-only delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    #[serde(default)]
    pub webhook_url: String,
    #[serde(default = "default_delivery_timeout")]
    pub timeout_secs: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            webhook_url: String::new(),
            timeout_secs: default_delivery_timeout(),
        }
    }
}

/// Inbound event API config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_api_host")]
    pub host: String,
    #[serde(default = "default_api_port")]
    pub port: u16,
    /// Bearer token for the event endpoint. Empty = no auth (for local-only use).
    #[serde(default)]
    pub api_key: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_api_host(),
            port: default_api_port(),
            api_key: String::new(),
        }
    }
}

impl Config {
    /// Fill empty secrets from the environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Fill empty secrets through `lookup`. File values win over the environment.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let targets: [(&str, &mut String); 5] = [
            ("SKYDIGEST_ADMIN_CODE", &mut self.admin.code),
            ("OPENAI_API_KEY", &mut self.summarizer.api_key),
            ("REDIS_URL", &mut self.cache.redis_url),
            ("SKYDIGEST_DELIVERY_URL", &mut self.delivery.webhook_url),
            ("SKYDIGEST_API_KEY", &mut self.api.api_key),
        ];
        for (key, slot) in targets {
            if !slot.is_empty() {
                continue;
            }
            if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
                *slot = value.trim().to_string();
            }
        }
    }

    /// Reject values the scheduler cannot work with.
    pub fn validate(&self) -> Result<(), SkyError> {
        let s = &self.scheduler;
        if s.scan_minute > 59 {
            return Err(SkyError::Config(format!(
                "scheduler.scan_minute must be 0-59, got {}",
                s.scan_minute
            )));
        }
        if s.fallback_hour > 23 || s.fallback_minute > 59 {
            return Err(SkyError::Config(format!(
                "scheduler fallback time {:02}:{:02} is not a valid time of day",
                s.fallback_hour, s.fallback_minute
            )));
        }
        if s.default_hour > 23 {
            return Err(SkyError::Config(format!(
                "scheduler.default_hour must be 0-23, got {}",
                s.default_hour
            )));
        }
        if parse_timezone(&s.default_timezone).is_none() {
            return Err(SkyError::Config(format!(
                "scheduler.default_timezone '{}' is not an IANA zone",
                s.default_timezone
            )));
        }
        if s.max_concurrent_runs == 0 {
            return Err(SkyError::Config(
                "scheduler.max_concurrent_runs must be at least 1".into(),
            ));
        }
        if self.commands.prefix.trim().is_empty() {
            return Err(SkyError::Config("commands.prefix must not be empty".into()));
        }
        if self.commands.max_range_days == 0 {
            return Err(SkyError::Config(
                "commands.max_range_days must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist. Environment overrides
/// are applied and the result is validated either way.
pub fn load(path: &str) -> Result<Config, SkyError> {
    let path = Path::new(path);
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SkyError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str::<Config>(&content)
            .map_err(|e| SkyError::Config(format!("failed to parse config: {}", e)))?
    } else {
        tracing::info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        Config::default()
    };

    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}
