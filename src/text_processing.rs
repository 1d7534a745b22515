//! # Text Processing Module
//!
//! This module provides text processing utilities for the lunch order bot,
//! including tolerant name normalization and menu text parsing.
//!
//! ## Features
//!
//! - Diacritic-insensitive normalization for Vietnamese dish names ("Trà tắc" ≡ "tra tac")
//! - Free-text menu line extraction (bullet stripping, title line removal)
//! - Structured "name - price" item parsing for persistent menus

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, trace};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::menu::MenuItem;

/// Normalize a user-entered string for tolerant comparison
///
/// Lower-cases, decomposes to NFD, drops combining marks, maps the Vietnamese
/// stroked `đ` to `d` and trims surrounding whitespace. The function is pure
/// and total: two strings with the same normalized form name the same dish.
///
/// # Examples
///
/// ```rust
/// use lunch_order_bot::text_processing::normalize;
///
/// assert_eq!(normalize("  Trà Tắc Đá "), "tra tac da");
/// assert_eq!(normalize("CƠM GÀ"), normalize("com ga"));
/// ```
pub fn normalize(input: &str) -> String {
    input
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| match c {
            'đ' => 'd',
            other => other,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

lazy_static! {
    static ref BULLET_PREFIX: Regex =
        Regex::new(r"^[-•]\s*").expect("Bullet prefix pattern should be valid");
    static ref PRICED_ITEM: Regex = Regex::new(
        r"^\s*(?:[-•*]\s*)?(?P<name>.+?)\s*[-–:]\s*(?P<price>\d[\d.,]*)\s*(?P<unit>k|K|đ|d|vnd|VND)?\s*$"
    )
    .expect("Priced item pattern should be valid");
}

/// Normalized words that mark a menu title line rather than a dish
const TITLE_MARKERS: [&str; 2] = ["thuc don", "menu"];

/// Extract dish names from a free-text daily menu
///
/// Splits on line breaks, strips a leading `-` or `•` bullet, and drops blank
/// lines and title lines (any line whose normalized words include "thực đơn"
/// or "menu"). Menu order is preserved.
///
/// # Examples
///
/// ```rust
/// use lunch_order_bot::text_processing::parse_menu_lines;
///
/// let text = "Em gửi thực đơn hôm nay ạ\n- Cơm gà\n• Phở bò\n\n  Bún chả  ";
/// assert_eq!(parse_menu_lines(text), vec!["Cơm gà", "Phở bò", "Bún chả"]);
/// ```
pub fn parse_menu_lines(text: &str) -> Vec<String> {
    let dishes: Vec<String> = text
        .lines()
        .map(|line| BULLET_PREFIX.replace(line.trim(), "").trim().to_string())
        .filter(|line| !line.is_empty())
        .filter(|line| !is_title_line(line))
        .collect();

    debug!(dish_count = dishes.len(), "Parsed free-text menu");
    dishes
}

// Markers match whole words only, so "Menudo" stays a dish
fn is_title_line(line: &str) -> bool {
    let words = normalize(line)
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let padded = format!(" {} ", words);
    TITLE_MARKERS
        .iter()
        .any(|marker| padded.contains(&format!(" {} ", marker)))
}

/// Parse a price token such as `35000`, `35.000`, `35,000` or `35` with a `k` suffix
pub fn parse_price(digits: &str, unit: Option<&str>) -> Option<i64> {
    let cleaned: String = digits.chars().filter(|c| c.is_ascii_digit()).collect();
    let value: i64 = cleaned.parse().ok()?;
    match unit {
        Some(u) if u.eq_ignore_ascii_case("k") => value.checked_mul(1000),
        _ => Some(value),
    }
}

/// Parse structured menu input into priced items
///
/// Every line of the form `name - price` (also `name: price`, optional `k`
/// thousands suffix or `đ`/`vnd` currency) becomes an item; other lines are
/// skipped. Returns an empty vector when nothing matched, which callers treat
/// as malformed input.
///
/// # Examples
///
/// ```rust
/// use lunch_order_bot::text_processing::parse_menu_items;
///
/// let items = parse_menu_items("Cơm gà - 35000\nPhở bò: 40k\nghi chú");
/// assert_eq!(items.len(), 2);
/// assert_eq!(items[0].name, "Cơm gà");
/// assert_eq!(items[1].price, 40000);
/// ```
pub fn parse_menu_items(text: &str) -> Vec<MenuItem> {
    let mut items = Vec::new();

    for (line_number, line) in text.lines().enumerate() {
        trace!("Processing menu line {}: '{}'", line_number, line);
        let Some(caps) = PRICED_ITEM.captures(line) else {
            continue;
        };

        let name = caps["name"].trim().to_string();
        if name.is_empty() {
            continue;
        }

        let unit = caps.name("unit").map(|m| m.as_str());
        match parse_price(&caps["price"], unit) {
            Some(price) => items.push(MenuItem { name, price }),
            None => debug!(line_number, "Skipping menu line with unparsable price"),
        }
    }

    debug!(item_count = items.len(), "Parsed structured menu");
    items
}
