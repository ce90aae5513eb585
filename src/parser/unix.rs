//! Parser for whitespace separated `ps` output lines.

use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use regex::Regex;

use super::timestamp::{elapsed_seconds, normalize_lstart, parse_lstart, parse_timestamp};
use super::ParseError;
use crate::record::ProcessRecord;

/// Leading `lstart` column, e.g. `Mon Jan  2 15:04:05 2024`.
static LSTART_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\w+\s+\w+\s+\d+\s+\d\d:\d\d:\d\d\s+\d+").expect("valid lstart regex")
});

pub const START_TIME_KEY: &str = "start_time";
pub const ELAPSED_TIME_KEY: &str = "elapsed_time";
pub const USER_KEY: &str = "user";

/// Splits `s` on whitespace runs into at most `limit` fields.
///
/// The last field keeps the remainder of the line, internal whitespace included.
pub fn split_fields(s: &str, limit: usize) -> Vec<&str> {
    let mut out = Vec::with_capacity(limit);
    let mut rest = s.trim();
    while !rest.is_empty() && out.len() < limit {
        if out.len() + 1 == limit {
            out.push(rest);
            break;
        }
        match rest.find(char::is_whitespace) {
            Some(idx) => {
                out.push(&rest[..idx]);
                rest = rest[idx..].trim_start();
            }
            None => {
                out.push(rest);
                break;
            }
        }
    }
    out
}

/// Parses one `ps` line into a record.
///
/// Returns `Ok(None)` when the record is filtered out by `lookup_user`.
/// Values are assigned to `keys` positionally; empty values are skipped, so a
/// blank column shifts the following values one key to the left.
pub fn parse_line(
    line: &str,
    keys: &[String],
    lookup_user: Option<&[String]>,
    now: DateTime<Local>,
) -> Result<Option<ProcessRecord>, ParseError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let mut remaining_keys = keys.len();
    let mut values: Vec<String> = Vec::with_capacity(keys.len());

    // The timestamp contains spaces, so it is cut out before splitting.
    let rest = match LSTART_RE.find(line) {
        Some(m) => {
            if parse_lstart(m.as_str()).is_none() {
                return Err(ParseError::Timestamp(m.as_str().to_string()));
            }
            values.push(normalize_lstart(m.as_str()));
            remaining_keys = remaining_keys.saturating_sub(1);
            &line[m.end()..]
        }
        None => line,
    };
    values.extend(split_fields(rest, remaining_keys).into_iter().map(str::to_string));

    let mut record = ProcessRecord::new();
    for (key, value) in keys.iter().zip(values.into_iter().filter(|v| !v.is_empty())) {
        record.insert(key.as_str(), value);
    }

    if let Some(start_time) = record.get_str(START_TIME_KEY) {
        let start = parse_timestamp(start_time)
            .ok_or_else(|| ParseError::Timestamp(start_time.to_string()))?;
        record.insert(ELAPSED_TIME_KEY, elapsed_seconds(now, start));
    }

    if let Some(users) = lookup_user {
        let allowed = record
            .get_str(USER_KEY)
            .is_some_and(|user| users.iter().any(|u| u == user));
        if !allowed {
            return Ok(None);
        }
    }

    Ok(Some(record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Platform;
    use chrono::{Duration, TimeZone};

    const SAMPLE: &str = "Mon Jan  2 15:04:05 2024 alice    1234     1  00:00:01  1.5  2.3  10240  20480 S  myproc  myproc --flag";

    fn keys() -> Vec<String> {
        Platform::Linux.default_keys()
    }

    fn sample_start() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 2, 15, 4, 5).earliest().unwrap()
    }

    #[test]
    fn test_split_fields_keeps_remainder_in_last_field() {
        assert_eq!(split_fields("a  b   c d ", 2), vec!["a", "b   c d"]);
        assert_eq!(split_fields("  a b ", 5), vec!["a", "b"]);
        assert!(split_fields("a b", 0).is_empty());
        assert!(split_fields("   ", 3).is_empty());
    }

    #[test]
    fn test_parse_full_default_line() {
        let now = sample_start() + Duration::seconds(3600);
        let record = parse_line(SAMPLE, &keys(), None, now).unwrap().unwrap();

        assert_eq!(record.get_str("start_time"), Some("Mon Jan 2 15:04:05 2024"));
        assert_eq!(record.get_str("user"), Some("alice"));
        assert_eq!(record.get_str("pid"), Some("1234"));
        assert_eq!(record.get_str("parent_pid"), Some("1"));
        assert_eq!(record.get_str("cpu_time"), Some("00:00:01"));
        assert_eq!(record.get_str("cpu_percent"), Some("1.5"));
        assert_eq!(record.get_str("memory_percent"), Some("2.3"));
        assert_eq!(record.get_str("mem_rss"), Some("10240"));
        assert_eq!(record.get_str("mem_size"), Some("20480"));
        assert_eq!(record.get_str("state"), Some("S"));
        assert_eq!(record.get_str("proc_name"), Some("myproc"));
        assert_eq!(record.get_str("command"), Some("myproc --flag"));
        assert_eq!(record.get("elapsed_time"), Some(&serde_json::json!(3600)));
        assert_eq!(record.len(), keys().len() + 1);
    }

    #[test]
    fn test_start_time_in_the_future_gives_negative_elapsed() {
        let now = sample_start() - Duration::seconds(10);
        let record = parse_line(SAMPLE, &keys(), None, now).unwrap().unwrap();
        assert_eq!(record.get("elapsed_time"), Some(&serde_json::json!(-10)));
    }

    #[test]
    fn test_blank_column_shifts_left() {
        // Missing %cpu column: values move one key to the left.
        let line = "Mon Jan  2 15:04:05 2024 alice 1234 1 00:00:01  2.3 10240 20480 S myproc myproc";
        let record = parse_line(line, &keys(), None, sample_start()).unwrap().unwrap();
        assert_eq!(record.get_str("cpu_percent"), Some("2.3"));
        assert_eq!(record.get_str("memory_percent"), Some("10240"));
        assert_eq!(record.get_str("command"), None);
        assert!(record.iter().all(|(_, v)| v.as_str() != Some("")));
    }

    #[test]
    fn test_short_line_leaves_trailing_keys_unset() {
        let line = "Mon Jan  2 15:04:05 2024 alice 1234";
        let record = parse_line(line, &keys(), None, sample_start()).unwrap().unwrap();
        assert_eq!(record.get_str("pid"), Some("1234"));
        assert!(!record.contains_key("parent_pid"));
        assert!(!record.contains_key("command"));
        assert!(record.contains_key("elapsed_time"));
    }

    #[test]
    fn test_missing_timestamp_puts_first_field_in_start_time() {
        let line = "alice 1234 1 00:00:01 1.5 2.3 10240 20480 S myproc myproc";
        let err = parse_line(line, &keys(), None, Local::now()).unwrap_err();
        assert!(matches!(err, ParseError::Timestamp(_)));
    }

    #[test]
    fn test_invalid_calendar_date_is_an_error() {
        let line = "Mon Feb 31 15:04:05 2024 alice 1234";
        assert!(matches!(
            parse_line(line, &keys(), None, Local::now()),
            Err(ParseError::Timestamp(_))
        ));
    }

    #[test]
    fn test_custom_keys_without_start_time() {
        let keys = vec!["user".to_string(), "pid".to_string(), "command".to_string()];
        let record = parse_line("root 1 /sbin/init splash", &keys, None, Local::now())
            .unwrap()
            .unwrap();
        assert_eq!(record.get_str("command"), Some("/sbin/init splash"));
        assert!(!record.contains_key("elapsed_time"));
    }

    #[test]
    fn test_lookup_user_filters() {
        let users = vec!["bob".to_string()];
        assert!(parse_line(SAMPLE, &keys(), Some(&users), sample_start())
            .unwrap()
            .is_none());

        let users = vec!["bob".to_string(), "alice".to_string()];
        assert!(parse_line(SAMPLE, &keys(), Some(&users), sample_start())
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_lookup_user_drops_records_without_user() {
        let keys = vec!["pid".to_string()];
        let users = vec!["alice".to_string()];
        assert!(parse_line("1234", &keys, Some(&users), Local::now())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_carriage_return_is_stripped() {
        let line = format!("{SAMPLE}\r\n");
        let record = parse_line(&line, &keys(), None, sample_start()).unwrap().unwrap();
        assert_eq!(record.get_str("command"), Some("myproc --flag"));
    }
}
