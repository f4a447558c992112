//! In-band schedule commands.
//!
//! Commands live behind a reserved prefix (`#summary` by default) inside
//! ordinary chat text. Parsing is pure: it never touches storage and never
//! checks authorization. Privileged variants are tagged and the caller
//! decides.

#[cfg(test)]
mod tests;

use chrono::{Days, NaiveDate};
use skydigest_core::config::CommandConfig;
use skydigest_core::conversation::{clamp_hour, Language};
use thiserror::Error;

/// Inclusive span of local calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Number of days covered, both ends included.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Every covered day, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        std::iter::successors(Some(self.start), |d| d.checked_add_days(Days::new(1)))
            .take_while(move |d| *d <= end)
    }
}

/// A parsed schedule command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleCommand {
    Enable,
    Disable,
    SetHour(u32),
    SetTimezone(String),
    SetLanguage(Language),
    RunOnce,
    RunRange(DateRange),
    RunAllRange(DateRange),
    Login(String),
    Logout,
    Status,
    Help,
}

impl ScheduleCommand {
    /// Cross-tenant commands that need an admin session.
    pub fn is_privileged(&self) -> bool {
        matches!(self, Self::RunAllRange(_))
    }

    /// Short verb, used in logs and the audit trail. Never includes arguments.
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Enable => "on",
            Self::Disable => "off",
            Self::SetHour(_) => "at",
            Self::SetTimezone(_) => "tz",
            Self::SetLanguage(_) => "lang",
            Self::RunOnce => "once",
            Self::RunRange(_) => "range",
            Self::RunAllRange(_) => "all range",
            Self::Login(_) => "login",
            Self::Logout => "logout",
            Self::Status => "status",
            Self::Help => "help",
        }
    }
}

/// A recognised verb with unusable arguments. Nothing is mutated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("missing argument for '{0}'")]
    MissingArgument(&'static str),

    #[error("invalid hour '{0}'")]
    InvalidHour(String),

    #[error("unsupported language '{0}'")]
    InvalidLanguage(String),

    #[error("invalid date '{0}'")]
    InvalidDate(String),

    #[error("malformed range")]
    MalformedRange,

    #[error("range end {end} is before start {start}")]
    RangeReversed { start: NaiveDate, end: NaiveDate },

    #[error("range spans {days} days, limit is {max}")]
    RangeTooLong { days: i64, max: u32 },
}

/// Parser for prefixed schedule commands.
#[derive(Debug, Clone)]
pub struct CommandParser {
    prefix: String,
    max_range_days: u32,
}

impl CommandParser {
    pub fn new(prefix: &str, max_range_days: u32) -> Self {
        Self {
            prefix: prefix.trim().to_string(),
            max_range_days,
        }
    }

    pub fn from_config(config: &CommandConfig) -> Self {
        Self::new(&config.prefix, config.max_range_days)
    }

    /// Text after the prefix, or `None` if `text` is not addressed to us.
    fn body<'a>(&self, text: &'a str) -> Option<&'a str> {
        let text = strip_mentions(text);
        let head = text.get(..self.prefix.len())?;
        if !head.eq_ignore_ascii_case(&self.prefix) {
            return None;
        }
        let rest = &text[self.prefix.len()..];
        match rest.chars().next() {
            None => Some(rest),
            Some(c) if c.is_whitespace() => Some(rest.trim()),
            Some(_) => None,
        }
    }

    /// Whether `text` starts with the command prefix, known verb or not.
    pub fn is_command(&self, text: &str) -> bool {
        self.body(text).is_some()
    }

    /// Parse `text`.
    ///
    /// `Ok(None)` for text without the prefix or with an unknown verb.
    /// `Err` for a known verb with bad arguments.
    pub fn parse(&self, text: &str) -> Result<Option<ScheduleCommand>, CommandError> {
        let Some(body) = self.body(text) else {
            return Ok(None);
        };
        let args: Vec<&str> = body.split_whitespace().collect();
        let Some(verb) = args.first() else {
            return Ok(Some(ScheduleCommand::Help));
        };
        let arg = args.get(1).copied();

        let cmd = match verb.to_ascii_lowercase().as_str() {
            "on" => ScheduleCommand::Enable,
            "off" => ScheduleCommand::Disable,
            "at" => {
                let raw = arg.ok_or(CommandError::MissingArgument("at"))?;
                ScheduleCommand::SetHour(parse_hour(raw)?)
            }
            "tz" => ScheduleCommand::SetTimezone(
                arg.ok_or(CommandError::MissingArgument("tz"))?.to_string(),
            ),
            "lang" => {
                let raw = arg.ok_or(CommandError::MissingArgument("lang"))?;
                ScheduleCommand::SetLanguage(
                    raw.parse()
                        .map_err(|_| CommandError::InvalidLanguage(raw.to_string()))?,
                )
            }
            "once" => ScheduleCommand::RunOnce,
            "range" => ScheduleCommand::RunRange(self.parse_range(&args[1..])?),
            "all" => {
                if !arg.is_some_and(|a| a.eq_ignore_ascii_case("range")) {
                    return Ok(None);
                }
                ScheduleCommand::RunAllRange(self.parse_range(&args[2..])?)
            }
            "login" => ScheduleCommand::Login(
                arg.ok_or(CommandError::MissingArgument("login"))?.to_string(),
            ),
            "logout" => ScheduleCommand::Logout,
            "status" => ScheduleCommand::Status,
            "help" => ScheduleCommand::Help,
            _ => return Ok(None),
        };
        Ok(Some(cmd))
    }

    /// `<start> to <end>`, ISO dates, bounded span.
    fn parse_range(&self, args: &[&str]) -> Result<DateRange, CommandError> {
        let [start, to, end] = args else {
            return Err(CommandError::MalformedRange);
        };
        if !to.eq_ignore_ascii_case("to") {
            return Err(CommandError::MalformedRange);
        }
        let range = DateRange {
            start: parse_date(start)?,
            end: parse_date(end)?,
        };
        if range.end < range.start {
            return Err(CommandError::RangeReversed {
                start: range.start,
                end: range.end,
            });
        }
        if range.days() > i64::from(self.max_range_days) {
            return Err(CommandError::RangeTooLong {
                days: range.days(),
                max: self.max_range_days,
            });
        }
        Ok(range)
    }
}

/// Drop leading `@name` tokens.
fn strip_mentions(text: &str) -> &str {
    let mut rest = text.trim_start();
    while rest.starts_with('@') {
        rest = match rest.find(char::is_whitespace) {
            Some(i) => rest[i..].trim_start(),
            None => "",
        };
    }
    rest
}

/// `H` or `H:MM`. Minutes are accepted and ignored; the hour is clamped.
fn parse_hour(raw: &str) -> Result<u32, CommandError> {
    let invalid = || CommandError::InvalidHour(raw.to_string());
    let (hour, minutes) = match raw.split_once(':') {
        Some((h, m)) => (h, Some(m)),
        None => (raw, None),
    };
    if let Some(m) = minutes {
        if m.is_empty() || !m.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
    }
    let hour: i64 = hour.parse().map_err(|_| invalid())?;
    Ok(clamp_hour(hour))
}

fn parse_date(raw: &str) -> Result<NaiveDate, CommandError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| CommandError::InvalidDate(raw.to_string()))
}
