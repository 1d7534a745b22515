//! UI Builder module for formatting replies
//!
//! Every reply is rendered as Telegram HTML; user-provided text (dish names,
//! display names, photo names) is escaped before it is placed in a template.

use teloxide::utils::html::escape;

use crate::localization::{t_args_lang, t_lang};
use crate::members::GroupMember;
use crate::menu::Menu;
use crate::orders::{DailySummary, PeriodSummary, SummaryPeriod};
use crate::photos::{Photo, PhotoOwner};

/// Format a VND amount with dot thousands separators ("35000" -> "35.000đ")
pub fn format_price(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::new();

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    let sign = if amount < 0 { "-" } else { "" };
    format!("{sign}{grouped}đ")
}

/// Today's orders grouped by dish with the people who ordered each
pub fn format_daily_summary(summary: &DailySummary, language_code: Option<&str>) -> String {
    if summary.total == 0 {
        return t_lang("summary-empty", language_code);
    }

    let mut message = format!("{}\n\n", t_lang("summary-header", language_code));
    for group in &summary.per_dish {
        let count = group.count.to_string();
        message.push_str(&t_args_lang(
            "summary-dish-line",
            &[("dish", escape(&group.dish).as_str()), ("count", count.as_str())],
            language_code,
        ));
        message.push('\n');

        let names: Vec<String> = group.orderers.iter().map(|name| escape(name)).collect();
        message.push_str(&format!("   └ {}\n\n", names.join(", ")));
    }

    let total = summary.total.to_string();
    message.push_str(&t_args_lang("summary-total", &[("count", total.as_str())], language_code));
    message
}

/// Dish counts for a week or month, most ordered first
pub fn format_period_summary(
    summary: &PeriodSummary,
    period: SummaryPeriod,
    language_code: Option<&str>,
) -> String {
    let (empty_key, header_key) = match period {
        SummaryPeriod::Week => ("weekly-empty", "weekly-header"),
        SummaryPeriod::Month => ("monthly-empty", "monthly-header"),
    };

    if summary.total == 0 {
        return t_lang(empty_key, language_code);
    }

    let mut message = format!("{}\n\n", t_lang(header_key, language_code));
    for entry in &summary.per_dish {
        let count = entry.count.to_string();
        message.push_str(&t_args_lang(
            "summary-dish-line",
            &[("dish", escape(&entry.dish).as_str()), ("count", count.as_str())],
            language_code,
        ));
        message.push('\n');
    }

    let total = summary.total.to_string();
    message.push('\n');
    message.push_str(&t_args_lang("summary-total", &[("count", total.as_str())], language_code));
    message
}

/// The active menu, with prices when the menu carries them
pub fn format_menu(menu: &Menu, language_code: Option<&str>) -> String {
    let dishes = menu.list_dish_names();
    if dishes.is_empty() {
        return t_lang("menu-empty", language_code);
    }

    let mut message = t_lang("menu-header", language_code);
    for dish in &dishes {
        message.push('\n');
        match menu.price_of(dish) {
            Some(price) => {
                message.push_str(&format!("• {} - {}", escape(dish), format_price(price)))
            }
            None => message.push_str(&format!("• {}", escape(dish))),
        }
    }
    message
}

/// Members who have not ordered yet, one per line
pub fn format_pending_members(members: &[GroupMember], language_code: Option<&str>) -> String {
    if members.is_empty() {
        return t_lang("pending-none", language_code);
    }

    let mut message = t_lang("pending-header", language_code);
    for member in members {
        message.push('\n');
        match &member.username {
            Some(username) => message.push_str(&format!(
                "• {} (@{})",
                escape(&member.display_name),
                escape(username)
            )),
            None => message.push_str(&format!("• {}", escape(&member.display_name))),
        }
    }
    message
}

/// Photo names visible to the caller, personal ones marked apart from group ones
pub fn format_photo_list(photos: &[Photo], language_code: Option<&str>) -> String {
    if photos.is_empty() {
        return t_lang("photos-empty", language_code);
    }

    let mut message = t_lang("photos-header", language_code);
    for photo in photos {
        let key = match photo.owner {
            PhotoOwner::User(_) => "photos-personal",
            PhotoOwner::Chat(_) => "photos-group",
        };
        message.push('\n');
        message.push_str(&t_args_lang(
            key,
            &[("name", escape(&photo.photo_name).as_str())],
            language_code,
        ));
    }
    message
}
