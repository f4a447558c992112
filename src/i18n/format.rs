//! Format helpers for strings with interpolation.

use super::t;
use crate::commands::CommandError;
use skydigest_core::conversation::{Conversation, Language};

/// Format the hour-set confirmation.
pub fn hour_set(lang: Language, hour: u32) -> String {
    match lang {
        Language::Zh => format!("已更新本群每日摘要时间为 {hour:02}:00。"),
        Language::En => format!("Daily digest time set to {hour:02}:00."),
    }
}

pub fn timezone_set(lang: Language, tz: &str) -> String {
    match lang {
        Language::Zh => format!("已更新本群摘要时区为 {tz}。"),
        Language::En => format!("Timezone set to {tz}."),
    }
}

pub fn invalid_timezone(lang: Language, tz: &str) -> String {
    match lang {
        Language::Zh => format!("无法识别的时区：{tz}（例如 Asia/Taipei）"),
        Language::En => format!("Unknown timezone: {tz} (e.g. Asia/Taipei)"),
    }
}

/// Rendered in the new language, so the reply confirms the switch.
pub fn language_set(new_lang: Language) -> String {
    match new_lang {
        Language::Zh => "已更新本群摘要语言为 zh。".to_string(),
        Language::En => "Digest language set to en.".to_string(),
    }
}

pub fn login_ok(lang: Language, ttl_hours: u64) -> String {
    match lang {
        Language::Zh => format!("管理员已登录，有效期 {ttl_hours} 小时。"),
        Language::En => format!("Admin session started, valid for {ttl_hours} hours."),
    }
}

/// Digest header plus body.
pub fn digest(lang: Language, day: &str, body: &str) -> String {
    match lang {
        Language::Zh => format!("【{day} 日聊摘】\n{body}"),
        Language::En => format!("[Chat digest for {day}]\n{body}"),
    }
}

/// Notice for a covered day without any stored text.
pub fn empty_day(lang: Language, day: &str) -> String {
    match lang {
        Language::Zh => format!("（提示）{day} 无聊天记录，略过摘要。"),
        Language::En => format!("(notice) No messages on {day}, digest skipped."),
    }
}

pub fn range_done(lang: Language, sent: usize, skipped: usize) -> String {
    match lang {
        Language::Zh => format!("区间摘要完成：已处理 {sent} 天，{skipped} 天先前已完成。"),
        Language::En => {
            format!("Range digest finished: {sent} day(s) processed, {skipped} already done.")
        }
    }
}

pub fn all_range_done(
    lang: Language,
    conversations: usize,
    sent: usize,
    skipped: usize,
    deferred: usize,
) -> String {
    match lang {
        Language::Zh => format!(
            "全部群区间摘要完成：{conversations} 个群，已处理 {sent} 天次，{skipped} 天次先前已完成，{deferred} 天次当地尚未结束。"
        ),
        Language::En => format!(
            "Bulk range finished: {conversations} chat(s), {sent} day(s) processed, {skipped} already done, {deferred} not yet ended locally."
        ),
    }
}

/// Current schedule of a conversation.
pub fn status(lang: Language, conv: &Conversation) -> String {
    let header = t("status_header", lang);
    let state = if conv.enabled { t("on", lang) } else { t("off", lang) };
    let hour = conv.summary_hour;
    match lang {
        Language::Zh => format!(
            "{header}\n每日摘要：{state}\n时间：{hour:02}:00\n时区：{}\n语言：{}",
            conv.timezone, conv.language
        ),
        Language::En => format!(
            "{header}\nDaily digest: {state}\nTime: {hour:02}:00\nTimezone: {}\nLanguage: {}",
            conv.timezone, conv.language
        ),
    }
}

/// User-facing rendering of a parse failure.
pub fn command_error(lang: Language, err: &CommandError) -> String {
    let zh = lang == Language::Zh;
    match err {
        CommandError::MissingArgument(verb) => {
            if zh {
                format!("指令 {verb} 缺少参数。")
            } else {
                format!("Command {verb} needs an argument.")
            }
        }
        CommandError::InvalidHour(raw) => {
            if zh {
                format!("无效的小时：{raw}（请输入 0-23）")
            } else {
                format!("Invalid hour: {raw} (use 0-23)")
            }
        }
        CommandError::InvalidLanguage(raw) => {
            if zh {
                format!("不支持的语言：{raw}（仅支持 zh 或 en）")
            } else {
                format!("Unsupported language: {raw} (zh or en)")
            }
        }
        CommandError::InvalidDate(raw) => {
            if zh {
                format!("无效的日期：{raw}（格式 YYYY-MM-DD）")
            } else {
                format!("Invalid date: {raw} (format YYYY-MM-DD)")
            }
        }
        CommandError::MalformedRange => {
            if zh {
                "区间格式：range <开始> to <结束>".to_string()
            } else {
                "Usage: range <start> to <end>".to_string()
            }
        }
        CommandError::RangeReversed { start, end } => {
            if zh {
                format!("结束日期 {end} 早于开始日期 {start}。")
            } else {
                format!("End date {end} is before start date {start}.")
            }
        }
        CommandError::RangeTooLong { days, max } => {
            if zh {
                format!("区间共 {days} 天，超过上限 {max} 天。")
            } else {
                format!("The range spans {days} days, more than the {max}-day limit.")
            }
        }
    }
}
