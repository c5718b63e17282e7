//! Timestamp helpers for the console views

use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, TimeZone, Utc};

const LOCAL_INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// `2024/1/5 3:04:05 PM` in local time; `-` when absent, raw when unparseable
pub fn format_timestamp(raw: Option<&str>) -> String {
    let raw = match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => raw,
        None => return "-".to_string(),
    };

    match DateTime::parse_from_rfc3339(raw) {
        Ok(parsed) => parsed
            .with_timezone(&Local)
            .format("%Y/%-m/%-d %-I:%M:%S %p")
            .to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Local `YYYY-MM-DDTHH:MM` (or full RFC 3339) to UTC RFC 3339 with
/// milliseconds. Blank or unparseable input yields an empty string.
pub fn to_rfc3339(input: &str) -> String {
    let input = input.trim();
    if input.is_empty() {
        return String::new();
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(input) {
        return parsed
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::Millis, true);
    }

    NaiveDateTime::parse_from_str(input, LOCAL_INPUT_FORMAT)
        .ok()
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|local| {
            local
                .with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Millis, true)
        })
        .unwrap_or_default()
}

/// RFC 3339 to the local `YYYY-MM-DDTHH:MM` editing form
pub fn to_local_input(raw: Option<&str>) -> String {
    raw.and_then(|r| DateTime::parse_from_rfc3339(r.trim()).ok())
        .map(|parsed| parsed.with_timezone(&Local).format(LOCAL_INPUT_FORMAT).to_string())
        .unwrap_or_default()
}
