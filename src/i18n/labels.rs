//! Static labels.

use skydigest_core::conversation::Language;

pub(super) fn lookup(key: &str, lang: Language) -> Option<&'static str> {
    let zh = lang == Language::Zh;
    let s = match key {
        "enabled" => {
            if zh {
                "已开启本群每日摘要。"
            } else {
                "Daily digest enabled for this chat."
            }
        }
        "disabled" => {
            if zh {
                "已关闭本群每日摘要。"
            } else {
                "Daily digest disabled for this chat."
            }
        }
        "already_done" => {
            if zh {
                "今日摘要已完成，略过。"
            } else {
                "Today's digest has already been sent."
            }
        }
        "summary_unavailable" => {
            if zh {
                "(降级) 摘要服务暂不可用。"
            } else {
                "(degraded) The summary service is unavailable."
            }
        }
        "login_invalid" => {
            if zh {
                "管理员密码错误。"
            } else {
                "Invalid admin code."
            }
        }
        "login_not_configured" => {
            if zh {
                "未配置管理员密码，无法登录。"
            } else {
                "Admin login is not configured."
            }
        }
        "logout_ok" => {
            if zh {
                "已登出管理员。"
            } else {
                "Admin session ended."
            }
        }
        "admin_required" => {
            if zh {
                "此指令需要管理员权限，请先登录。"
            } else {
                "This command requires an admin session. Log in first."
            }
        }
        "temporarily_unavailable" => {
            if zh {
                "暂时无法处理，请稍后再试。"
            } else {
                "Temporarily unavailable, please try again later."
            }
        }
        "range_not_past" => {
            if zh {
                "区间结束日期必须早于今天。"
            } else {
                "The range must end before today."
            }
        }
        "on" => {
            if zh {
                "开启"
            } else {
                "on"
            }
        }
        "off" => {
            if zh {
                "关闭"
            } else {
                "off"
            }
        }
        "status_header" => {
            if zh {
                "本群摘要设定"
            } else {
                "Digest settings for this chat"
            }
        }
        "help" => {
            if zh {
                "可用指令：\n\
                 on / off：开启或关闭每日摘要\n\
                 at <时>：设定每日摘要时间 (0-23)\n\
                 tz <时区>：设定时区，例如 Asia/Taipei\n\
                 lang <zh|en>：设定摘要语言\n\
                 once：立即整理昨日摘要\n\
                 range <开始> to <结束>：补做区间摘要 (YYYY-MM-DD)\n\
                 all range <开始> to <结束>：为所有群补做 (需管理员)\n\
                 login <密码> / logout：管理员登录与登出\n\
                 status：查看本群设定"
            } else {
                "Commands:\n\
                 on / off: enable or disable the daily digest\n\
                 at <hour>: set the daily digest hour (0-23)\n\
                 tz <zone>: set the timezone, e.g. Asia/Taipei\n\
                 lang <zh|en>: set the digest language\n\
                 once: summarize yesterday now\n\
                 range <start> to <end>: backfill digests (YYYY-MM-DD)\n\
                 all range <start> to <end>: backfill every chat (admin)\n\
                 login <code> / logout: admin session\n\
                 status: show this chat's settings"
            }
        }
        _ => return None,
    };
    Some(s)
}
