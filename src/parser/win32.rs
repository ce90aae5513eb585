//! Parser for the compressed JSON objects printed by PowerShell.

use chrono::{DateTime, Local};
use serde_json::Value;

use super::timestamp::{elapsed_seconds, format_win32, parse_win32_date};
use super::ParseError;
use crate::record::ProcessRecord;

pub const START_TIME_KEY: &str = "StartTime";
pub const CPU_KEY: &str = "CPU";
pub const ELAPSED_TIME_KEY: &str = "ElapsedTime";

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_missing(value: Option<&Value>) -> bool {
    value.map_or(true, Value::is_null)
}

/// Parses one JSON object line into a record projected onto `keys`.
///
/// Objects without a start time or CPU value (processes the current user may
/// not inspect) yield `Ok(None)`.
pub fn parse_line(
    line: &str,
    keys: &[String],
    now: DateTime<Local>,
) -> Result<Option<ProcessRecord>, ParseError> {
    let value: Value = serde_json::from_str(line.trim())?;
    let mut data = match value {
        Value::Object(map) => map,
        other => return Err(ParseError::NotAnObject(json_kind(&other))),
    };

    if is_missing(data.get(START_TIME_KEY)) || is_missing(data.get(CPU_KEY)) {
        return Ok(None);
    }

    let start = match data.get(START_TIME_KEY) {
        Some(Value::String(raw)) => {
            parse_win32_date(raw).ok_or_else(|| ParseError::Timestamp(raw.clone()))?
        }
        Some(other) => return Err(ParseError::Timestamp(other.to_string())),
        None => return Ok(None),
    };
    data.insert(START_TIME_KEY.to_string(), Value::String(format_win32(&start)));

    let mut record = ProcessRecord::new();
    for (key, value) in data {
        if keys.iter().any(|k| *k == key) {
            record.insert(key, value);
        }
    }
    record.insert(ELAPSED_TIME_KEY, elapsed_seconds(now, start));

    Ok(Some(record))
}
