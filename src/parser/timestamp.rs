//! Timestamp handling for process start times.
//!
//! `ps -o lstart` prints local time as `Mon Jan  2 15:04:05 2024`. PowerShell
//! serializes `StartTime` as `/Date(<epoch ms>)/` (Windows PowerShell) or as an
//! RFC 3339 string (PowerShell 7). Both are turned into `DateTime<Local>`.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// Canonical textual form of an `lstart` timestamp, whitespace collapsed.
pub const LSTART_FORMAT: &str = "%a %b %-d %H:%M:%S %Y";

/// Textual form written back into `StartTime` on Windows.
pub const WIN32_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// `lstart` without its leading weekday.
const LSTART_PARSE_FORMAT: &str = "%b %d %H:%M:%S %Y";

static WIN32_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^/Date\((-?\d+)(?:[+-]\d{4})?\)/$").expect("valid /Date()/ regex")
});

/// Collapses whitespace runs to a single space.
pub fn normalize_lstart(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parses an `lstart` style timestamp in local time.
///
/// The weekday token is not checked against the date.
pub fn parse_lstart(s: &str) -> Option<DateTime<Local>> {
    let normalized = normalize_lstart(s);
    let (_weekday, date) = normalized.split_once(' ')?;
    let naive = NaiveDateTime::parse_from_str(date, LSTART_PARSE_FORMAT).ok()?;
    // Ambiguous local times (DST fold) resolve to the earlier instant.
    Local.from_local_datetime(&naive).earliest()
}

/// Parses a PowerShell `StartTime` value.
pub fn parse_win32_date(s: &str) -> Option<DateTime<Local>> {
    if let Some(caps) = WIN32_DATE_RE.captures(s.trim()) {
        let millis: i64 = caps[1].parse().ok()?;
        return Utc
            .timestamp_millis_opt(millis)
            .single()
            .map(|dt| dt.with_timezone(&Local));
    }
    DateTime::parse_from_rfc3339(s.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Local))
}

/// Parses any start time form this crate writes into a record.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Local>> {
    if let Ok(dt) = DateTime::parse_from_str(s.trim(), WIN32_FORMAT) {
        return Some(dt.with_timezone(&Local));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s.trim()) {
        return Some(dt.with_timezone(&Local));
    }
    parse_lstart(s)
}

pub fn format_lstart(dt: &DateTime<Local>) -> String {
    dt.format(LSTART_FORMAT).to_string()
}

pub fn format_win32(dt: &DateTime<Local>) -> String {
    dt.format(WIN32_FORMAT).to_string()
}

/// Whole seconds between `start` and `now`, truncated toward zero.
pub fn elapsed_seconds(now: DateTime<Local>, start: DateTime<Local>) -> i64 {
    (now - start).num_seconds()
}
