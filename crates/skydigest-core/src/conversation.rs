//! Conversation schedule types and calendar helpers.
//!
//! A conversation's `timezone` decides both when its daily digest is due and
//! which calendar day a date key refers to.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Summary output language.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Zh,
    En,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Zh => "zh",
            Self::En => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zh" => Ok(Self::Zh),
            "en" => Ok(Self::En),
            other => Err(format!("unsupported language '{other}' (expected zh or en)")),
        }
    }
}

/// A chat tenant tracked by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub name: Option<String>,
    pub enabled: bool,
    /// Local hour (0-23) at which the daily digest is due.
    pub summary_hour: u32,
    /// IANA zone name. May be stale or invalid; resolve with [`resolve_timezone`].
    pub timezone: String,
    pub language: Language,
    pub last_seen_at: String,
    pub created_at: String,
}

/// Field-level schedule update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulePatch {
    pub hour: Option<u32>,
    pub timezone: Option<String>,
    pub language: Option<Language>,
}

impl SchedulePatch {
    pub fn hour(hour: u32) -> Self {
        Self {
            hour: Some(hour),
            ..Default::default()
        }
    }

    pub fn timezone(tz: impl Into<String>) -> Self {
        Self {
            timezone: Some(tz.into()),
            ..Default::default()
        }
    }

    pub fn language(language: Language) -> Self {
        Self {
            language: Some(language),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hour.is_none() && self.timezone.is_none() && self.language.is_none()
    }
}

/// Values applied to a conversation row the first time it is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleDefaults {
    pub hour: u32,
    pub timezone: String,
    pub language: Language,
}

impl Default for ScheduleDefaults {
    fn default() -> Self {
        Self {
            hour: 8,
            timezone: "Asia/Taipei".to_string(),
            language: Language::Zh,
        }
    }
}

/// Clamp an hour into 0..=23.
pub fn clamp_hour(hour: i64) -> u32 {
    hour.clamp(0, 23) as u32
}

/// Parse an IANA zone name, accepting any letter case.
pub fn parse_timezone(name: &str) -> Option<Tz> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    name.parse::<Tz>()
        .ok()
        .or_else(|| Tz::from_str_insensitive(name).ok())
}

/// Resolve a stored zone name, falling back to `default` when it is invalid.
pub fn resolve_timezone(name: &str, default: Tz) -> Tz {
    parse_timezone(name).unwrap_or(default)
}

/// The calendar date of `now` in `tz`. This is the date key for a run at `now`.
pub fn date_key_at(tz: Tz, now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// The local hour of `now` in `tz`.
pub fn local_hour_at(tz: Tz, now: DateTime<Utc>) -> u32 {
    now.with_timezone(&tz).hour()
}

/// Format a date key as stored in the lock table (`YYYY-MM-DD`).
pub fn format_date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// UTC instant of local midnight starting `date` in `tz`.
///
/// Zones that skip midnight on a DST change resolve to the first valid
/// instant of that day.
pub fn local_midnight(tz: Tz, date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    let mut probe = naive;
    for _ in 0..4 {
        if let Some(dt) = tz.from_local_datetime(&probe).earliest() {
            return dt.with_timezone(&Utc);
        }
        probe += chrono::Duration::minutes(30);
    }
    Utc.from_utc_datetime(&naive)
}

/// The covered day of a digest keyed by `date_key`: the previous local day.
pub fn covered_day(date_key: NaiveDate) -> NaiveDate {
    date_key.checked_sub_days(Days::new(1)).unwrap_or(date_key)
}

/// The date key whose digest covers `day`.
pub fn date_key_for_covered_day(day: NaiveDate) -> NaiveDate {
    day.checked_add_days(Days::new(1)).unwrap_or(day)
}

/// Millisecond window `[start, end)` of the day covered by `date_key` in `tz`.
pub fn covered_window_ms(tz: Tz, date_key: NaiveDate) -> (i64, i64) {
    let start = local_midnight(tz, covered_day(date_key));
    let end = local_midnight(tz, date_key);
    (start.timestamp_millis(), end.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_language_parse() {
        assert_eq!("zh".parse::<Language>().unwrap(), Language::Zh);
        assert_eq!("EN".parse::<Language>().unwrap(), Language::En);
        assert!("fr".parse::<Language>().is_err());
    }

    #[test]
    fn test_clamp_hour() {
        assert_eq!(clamp_hour(-3), 0);
        assert_eq!(clamp_hour(9), 9);
        assert_eq!(clamp_hour(99), 23);
    }

    #[test]
    fn test_parse_timezone_case_insensitive() {
        assert_eq!(parse_timezone("Asia/Tokyo"), Some(chrono_tz::Asia::Tokyo));
        assert_eq!(parse_timezone("asia/tokyo"), Some(chrono_tz::Asia::Tokyo));
        assert!(parse_timezone("Mars/Olympus").is_none());
        assert!(parse_timezone("").is_none());
    }

    #[test]
    fn test_resolve_timezone_falls_back() {
        let tz = resolve_timezone("nope", chrono_tz::Asia::Taipei);
        assert_eq!(tz, chrono_tz::Asia::Taipei);
    }

    #[test]
    fn test_date_key_crosses_midnight_by_zone() {
        // 2025-08-19T23:30Z is already 2025-08-20 07:30 in Taipei.
        let now = utc("2025-08-19T23:30:00Z");
        assert_eq!(
            date_key_at(chrono_tz::Asia::Taipei, now),
            NaiveDate::from_ymd_opt(2025, 8, 20).unwrap()
        );
        assert_eq!(
            date_key_at(chrono_tz::UTC, now),
            NaiveDate::from_ymd_opt(2025, 8, 19).unwrap()
        );
        assert_eq!(local_hour_at(chrono_tz::Asia::Taipei, now), 7);
    }

    #[test]
    fn test_covered_window_is_previous_local_day() {
        let key = NaiveDate::from_ymd_opt(2025, 8, 20).unwrap();
        let (start, end) = covered_window_ms(chrono_tz::Asia::Taipei, key);
        assert_eq!(start, utc("2025-08-18T16:00:00Z").timestamp_millis());
        assert_eq!(end, utc("2025-08-19T16:00:00Z").timestamp_millis());
    }

    #[test]
    fn test_covered_day_roundtrip() {
        let day = NaiveDate::from_ymd_opt(2025, 2, 28).unwrap();
        let key = date_key_for_covered_day(day);
        assert_eq!(key, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        assert_eq!(covered_day(key), day);
        assert_eq!(format_date_key(key), "2025-03-01");
    }
}
