use super::*;
use std::collections::HashMap;
use std::io::Write;

#[test]
fn test_defaults_match_documented_values() {
    let cfg = Config::default();
    assert_eq!(cfg.cache.idempotency_ttl_secs, 86_400);
    assert_eq!(cfg.admin.session_ttl_secs, 21_600);
    assert_eq!(cfg.scheduler.default_hour, 8);
    assert_eq!(cfg.scheduler.default_timezone, "Asia/Taipei");
    assert_eq!(cfg.scheduler.fallback_hour, 8);
    assert_eq!(cfg.commands.prefix, "#summary");
    assert_eq!(cfg.commands.max_range_days, 31);
    assert_eq!(cfg.scheduler.max_concurrent_runs, 4);
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_partial_toml_fills_defaults() {
    let toml_str = r#"
        [scheduler]
        scan_minute = 15
        default_language = "en"

        [admin]
        code = "hunter2"
    "#;
    let cfg: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(cfg.scheduler.scan_minute, 15);
    assert_eq!(cfg.scheduler.default_language, Language::En);
    assert_eq!(cfg.scheduler.default_hour, 8);
    assert_eq!(cfg.admin.code, "hunter2");
    assert_eq!(cfg.admin.session_ttl_secs, 21_600);
    assert!(cfg.api.enabled);
}

#[test]
fn test_schedule_defaults_from_scheduler_config() {
    let cfg = SchedulerConfig {
        default_hour: 9,
        default_timezone: "Asia/Tokyo".to_string(),
        default_language: Language::En,
        ..Default::default()
    };
    let d = cfg.schedule_defaults();
    assert_eq!(d.hour, 9);
    assert_eq!(d.timezone, "Asia/Tokyo");
    assert_eq!(d.language, Language::En);
    assert_eq!(cfg.default_tz(), chrono_tz::Asia::Tokyo);
}

#[test]
fn test_env_overrides_fill_only_empty_values() {
    let env: HashMap<&str, &str> = [
        ("SKYDIGEST_ADMIN_CODE", "from-env"),
        ("OPENAI_API_KEY", "sk-env"),
        ("REDIS_URL", "  "),
    ]
    .into_iter()
    .collect();

    let mut cfg = Config::default();
    cfg.summarizer.api_key = "sk-file".to_string();
    cfg.apply_overrides_from(|k| env.get(k).map(|v| v.to_string()));

    assert_eq!(cfg.admin.code, "from-env");
    assert_eq!(cfg.summarizer.api_key, "sk-file");
    assert!(cfg.cache.redis_url.is_empty(), "blank env values are ignored");
}

#[test]
fn test_validate_rejects_bad_values() {
    let mut cfg = Config::default();
    cfg.scheduler.scan_minute = 60;
    assert!(cfg.validate().is_err());

    let mut cfg = Config::default();
    cfg.scheduler.default_timezone = "Nowhere/Special".to_string();
    assert!(cfg.validate().is_err());

    let mut cfg = Config::default();
    cfg.commands.max_range_days = 0;
    assert!(cfg.validate().is_err());

    let mut cfg = Config::default();
    cfg.scheduler.fallback_hour = 24;
    assert!(cfg.validate().is_err());

    let mut cfg = Config::default();
    cfg.scheduler.max_concurrent_runs = 0;
    assert!(cfg.validate().is_err());
}

#[test]
fn test_load_missing_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    let cfg = load(path.to_str().unwrap()).unwrap();
    assert_eq!(cfg.scheduler.default_hour, 8);
}

#[test]
fn test_load_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(f, "[commands]\nprefix = \"!digest\"\nmax_range_days = 7").unwrap();

    let cfg = load(path.to_str().unwrap()).unwrap();
    assert_eq!(cfg.commands.prefix, "!digest");
    assert_eq!(cfg.commands.max_range_days, 7);
}

#[test]
fn test_load_rejects_invalid_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[scheduler]\nscan_minute = 75\n").unwrap();
    assert!(load(path.to_str().unwrap()).is_err());
}

#[test]
fn test_shellexpand_home() {
    if let Some(home) = std::env::var_os("HOME") {
        let expanded = shellexpand("~/x/y.db");
        assert_eq!(expanded, format!("{}/x/y.db", home.to_string_lossy()));
    }
    assert_eq!(shellexpand("/abs/path"), "/abs/path");
}
