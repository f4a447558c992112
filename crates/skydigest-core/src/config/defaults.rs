//! Default value functions used by serde for config deserialization.

pub fn default_name() -> String {
    "skydigest".to_string()
}

pub fn default_data_dir() -> String {
    "~/.skydigest".to_string()
}

pub fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_true() -> bool {
    true
}

pub fn default_db_path() -> String {
    "~/.skydigest/data/skydigest.db".to_string()
}

pub fn default_key_prefix() -> String {
    "skydigest".to_string()
}

pub fn default_idempotency_ttl() -> u64 {
    24 * 60 * 60
}

pub fn default_cache_timeout_ms() -> u64 {
    2_000
}

pub fn default_scan_minute() -> u32 {
    0
}

pub fn default_fallback_hour() -> u32 {
    8
}

pub fn default_fallback_minute() -> u32 {
    0
}

pub fn default_timezone() -> String {
    "Asia/Taipei".to_string()
}

pub fn default_summary_hour() -> u32 {
    8
}

pub fn default_storage_timeout() -> u64 {
    10
}

pub fn default_summarize_timeout() -> u64 {
    120
}

pub fn default_delivery_timeout() -> u64 {
    20
}

pub fn default_max_concurrent_runs() -> usize {
    4
}

pub fn default_session_ttl() -> u64 {
    6 * 60 * 60
}

pub fn default_command_prefix() -> String {
    "#summary".to_string()
}

pub fn default_max_range_days() -> u32 {
    31
}

pub fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

pub fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

pub fn default_temperature() -> f32 {
    0.4
}

pub fn default_max_tokens() -> u32 {
    900
}

pub fn default_max_input_chars() -> usize {
    12_000
}

pub fn default_provider_timeout() -> u64 {
    60
}

pub fn default_api_host() -> String {
    "127.0.0.1".to_string()
}

pub fn default_api_port() -> u16 {
    8080
}
