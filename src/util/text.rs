//! Text helpers: keyword splitting, date handling, display truncation.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Split a comma-joined keyword string into trimmed, non-empty badges.
///
/// `"a, b ,c"` yields exactly `["a", "b", "c"]`.
pub fn split_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|keyword| !keyword.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a backend date string leniently.
///
/// The backend's JSON layer has emitted RFC 2822 (`Wed, 01 May 2024 ...`),
/// RFC 3339, and bare `YYYY-MM-DD` across revisions; ordering and display
/// must tolerate all three. Returns `None` for anything unrecognized.
pub fn parse_date_flexible(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

/// Sort key for an optional backend date: `None` sorts before any real
/// date, so descending order puts undated items last.
pub fn date_sort_key(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(parse_date_flexible)
}

/// Short display form (`01 May 2024`) of a backend date string, falling
/// back to the raw text when unparseable.
pub fn format_short_date(raw: &str) -> String {
    match parse_date_flexible(raw) {
        Some(dt) => dt.format("%d %b %Y").to_string(),
        None => raw.to_string(),
    }
}

/// `HH:MM` local-time display for a toast timestamp; current time when
/// the update carries none.
pub fn format_clock_time(raw: Option<&str>) -> String {
    let time = raw
        .and_then(parse_date_flexible)
        .unwrap_or_else(Utc::now)
        .with_timezone(&Local);
    time.format("%H:%M").to_string()
}

/// Truncate a string to a display width, appending `…` when cut.
///
/// Width-aware (CJK, emoji) via `unicode-width`; never splits inside a
/// wide character.
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(text) <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let budget = max_width.saturating_sub(1); // room for the ellipsis
    let mut width = 0;
    let mut result = String::new();
    for ch in text.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if width + ch_width > budget {
            break;
        }
        width += ch_width;
        result.push(ch);
    }
    result.push('…');
    result
}

/// Remove control characters that would corrupt terminal output.
///
/// Toast and card text comes straight off the network; a titular with an
/// embedded escape sequence must not reprogram the terminal.
pub fn strip_control_chars(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || *c == '\n')
        .collect()
}
