use super::*;
use skydigest_core::conversation::Language;

#[test]
fn test_all_keys_exist_in_both_languages() {
    let keys = [
        "enabled",
        "disabled",
        "already_done",
        "summary_unavailable",
        "login_invalid",
        "login_not_configured",
        "logout_ok",
        "admin_required",
        "temporarily_unavailable",
        "range_not_past",
        "on",
        "off",
        "status_header",
        "help",
    ];
    for key in keys {
        for lang in [Language::Zh, Language::En] {
            assert_ne!(t(key, lang), "???", "missing {key} for {lang}");
        }
        assert_ne!(t(key, Language::Zh), t(key, Language::En), "{key} untranslated");
    }
}

#[test]
fn test_unknown_key() {
    assert_eq!(t("no_such_key", Language::En), "???");
}

#[test]
fn test_hour_is_zero_padded() {
    assert_eq!(hour_set(Language::En, 7), "Daily digest time set to 07:00.");
    assert!(hour_set(Language::Zh, 21).contains("21:00"));
}

#[test]
fn test_digest_header() {
    assert_eq!(
        digest(Language::Zh, "2025-08-19", "- a"),
        "【2025-08-19 日聊摘】\n- a"
    );
    assert!(digest(Language::En, "2025-08-19", "- a").starts_with("[Chat digest for 2025-08-19]"));
}

#[test]
fn test_help_lists_every_verb() {
    let help = t("help", Language::En);
    for verb in ["on / off", "at ", "tz ", "lang ", "once", "range ", "all range", "login", "status"] {
        assert!(help.contains(verb), "help misses {verb}");
    }
}

#[test]
fn test_command_error_rendering() {
    use crate::commands::CommandError;
    let err = CommandError::RangeTooLong { days: 365, max: 31 };
    assert!(command_error(Language::En, &err).contains("365"));
    assert!(command_error(Language::Zh, &err).contains("31"));
}

#[test]
fn test_all_range_done_reports_deferred_days() {
    let zh = all_range_done(Language::Zh, 3, 4, 1, 2);
    assert!(zh.contains("3 个群"));
    assert!(zh.contains("2 天次当地尚未结束"));
    let en = all_range_done(Language::En, 3, 4, 1, 2);
    assert!(en.contains("2 not yet ended locally"));
}
