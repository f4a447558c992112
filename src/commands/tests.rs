use super::*;

fn parser() -> CommandParser {
    CommandParser::new("#summary", 31)
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[test]
fn test_plain_text_is_not_a_command() {
    let p = parser();
    assert_eq!(p.parse("good morning").unwrap(), None);
    assert_eq!(p.parse("let's talk about #summary later").unwrap(), None);
    assert_eq!(p.parse("#summaryon").unwrap(), None);
    assert!(!p.is_command("hello"));
}

#[test]
fn test_unknown_verb_is_none_but_still_a_command() {
    let p = parser();
    assert_eq!(p.parse("#summary dance").unwrap(), None);
    assert_eq!(p.parse("#summary all things").unwrap(), None);
    assert!(p.is_command("#summary dance"));
}

#[test]
fn test_bare_prefix_is_help() {
    assert_eq!(parser().parse("#summary").unwrap(), Some(ScheduleCommand::Help));
}

#[test]
fn test_toggle_and_simple_verbs() {
    let p = parser();
    assert_eq!(p.parse("#summary on").unwrap(), Some(ScheduleCommand::Enable));
    assert_eq!(p.parse("#SUMMARY OFF").unwrap(), Some(ScheduleCommand::Disable));
    assert_eq!(p.parse("#summary once").unwrap(), Some(ScheduleCommand::RunOnce));
    assert_eq!(p.parse("#summary logout").unwrap(), Some(ScheduleCommand::Logout));
    assert_eq!(p.parse("#summary status").unwrap(), Some(ScheduleCommand::Status));
    assert_eq!(p.parse("#summary help").unwrap(), Some(ScheduleCommand::Help));
}

#[test]
fn test_leading_mentions_are_ignored() {
    let p = parser();
    assert_eq!(
        p.parse("@_user_1 #summary on").unwrap(),
        Some(ScheduleCommand::Enable)
    );
    assert_eq!(
        p.parse("  @bot @other   #summary at 9").unwrap(),
        Some(ScheduleCommand::SetHour(9))
    );
    assert_eq!(p.parse("@bot").unwrap(), None);
}

#[test]
fn test_set_hour() {
    let p = parser();
    assert_eq!(p.parse("#summary at 7").unwrap(), Some(ScheduleCommand::SetHour(7)));
    assert_eq!(p.parse("#summary at 21:30").unwrap(), Some(ScheduleCommand::SetHour(21)));
    assert_eq!(p.parse("#summary at 99").unwrap(), Some(ScheduleCommand::SetHour(23)));
    assert_eq!(p.parse("#summary at -4").unwrap(), Some(ScheduleCommand::SetHour(0)));
}

#[test]
fn test_set_hour_rejects_garbage() {
    let p = parser();
    assert_eq!(
        p.parse("#summary at abc"),
        Err(CommandError::InvalidHour("abc".into()))
    );
    assert_eq!(
        p.parse("#summary at 8:xx"),
        Err(CommandError::InvalidHour("8:xx".into()))
    );
    assert_eq!(p.parse("#summary at"), Err(CommandError::MissingArgument("at")));
}

#[test]
fn test_timezone_keeps_case() {
    assert_eq!(
        parser().parse("#Summary TZ America/New_York").unwrap(),
        Some(ScheduleCommand::SetTimezone("America/New_York".into()))
    );
}

#[test]
fn test_language() {
    let p = parser();
    assert_eq!(
        p.parse("#summary lang EN").unwrap(),
        Some(ScheduleCommand::SetLanguage(Language::En))
    );
    assert_eq!(
        p.parse("#summary lang fr"),
        Err(CommandError::InvalidLanguage("fr".into()))
    );
}

#[test]
fn test_login_keeps_code_case() {
    assert_eq!(
        parser().parse("#summary login HunTer2").unwrap(),
        Some(ScheduleCommand::Login("HunTer2".into()))
    );
    assert_eq!(
        parser().parse("#summary login"),
        Err(CommandError::MissingArgument("login"))
    );
}

#[test]
fn test_range() {
    let cmd = parser()
        .parse("#summary range 2025-08-01 to 2025-08-10")
        .unwrap()
        .unwrap();
    let ScheduleCommand::RunRange(range) = cmd else {
        panic!("expected range, got {cmd:?}");
    };
    assert_eq!(range.start, date("2025-08-01"));
    assert_eq!(range.days(), 10);
    assert_eq!(range.iter().count(), 10);
    assert_eq!(range.iter().last(), Some(date("2025-08-10")));
    assert!(!ScheduleCommand::RunRange(range).is_privileged());
}

#[test]
fn test_single_day_range() {
    let cmd = parser()
        .parse("#summary range 2025-08-01 TO 2025-08-01")
        .unwrap()
        .unwrap();
    assert_eq!(
        cmd,
        ScheduleCommand::RunRange(DateRange {
            start: date("2025-08-01"),
            end: date("2025-08-01"),
        })
    );
}

#[test]
fn test_range_end_before_start() {
    assert_eq!(
        parser().parse("#summary range 2025-08-10 to 2025-08-01"),
        Err(CommandError::RangeReversed {
            start: date("2025-08-10"),
            end: date("2025-08-01"),
        })
    );
}

#[test]
fn test_range_span_limit() {
    let p = parser();
    assert_eq!(
        p.parse("#summary range 2025-01-01 to 2025-12-31"),
        Err(CommandError::RangeTooLong { days: 365, max: 31 })
    );
    assert!(p.parse("#summary range 2025-01-01 to 2025-01-31").is_ok());
    assert_eq!(
        p.parse("#summary range 2025-01-01 to 2025-02-01"),
        Err(CommandError::RangeTooLong { days: 32, max: 31 })
    );
}

#[test]
fn test_range_malformed() {
    let p = parser();
    assert_eq!(
        p.parse("#summary range 2025-01-01"),
        Err(CommandError::MalformedRange)
    );
    assert_eq!(
        p.parse("#summary range 2025-01-01 until 2025-01-02"),
        Err(CommandError::MalformedRange)
    );
    assert_eq!(
        p.parse("#summary range 2025-13-01 to 2025-01-02"),
        Err(CommandError::InvalidDate("2025-13-01".into()))
    );
}

#[test]
fn test_all_range_is_privileged() {
    let cmd = parser()
        .parse("#summary all range 2025-08-01 to 2025-08-03")
        .unwrap()
        .unwrap();
    assert!(cmd.is_privileged());
    assert_eq!(cmd.verb(), "all range");
    assert!(matches!(cmd, ScheduleCommand::RunAllRange(r) if r.days() == 3));
}

#[test]
fn test_custom_prefix() {
    let p = CommandParser::new("!digest", 7);
    assert_eq!(p.parse("!DIGEST on").unwrap(), Some(ScheduleCommand::Enable));
    assert_eq!(p.parse("#summary on").unwrap(), None);
    assert_eq!(
        p.parse("!digest range 2025-01-01 to 2025-01-08"),
        Err(CommandError::RangeTooLong { days: 8, max: 7 })
    );
}

#[test]
fn test_multibyte_text_does_not_panic() {
    let p = parser();
    assert_eq!(p.parse("摘要摘要摘要").unwrap(), None);
    assert_eq!(p.parse("#summar摘").unwrap(), None);
}
