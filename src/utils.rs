use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::str::FromStr;
use tracing::warn;

/// Read a non-empty environment variable
pub fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read and parse an environment variable, warning and returning `None` on bad values
pub fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    let raw = env_var(name)?;
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring invalid value for {}: '{}'", name, raw);
            None
        }
    }
}

/// Parse an end-time argument into milliseconds since epoch (UTC)
///
/// Accepted forms:
/// * epoch milliseconds: `1700000000000`
/// * RFC 3339: `2023-11-14T22:13:20Z`
/// * `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DDTHH:MM:SS`
/// * `YYYY-MM-DD` (midnight)
pub fn parse_until(input: &str) -> Result<i64, String> {
    let s = input.trim();

    if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
        return s
            .parse::<i64>()
            .map_err(|e| format!("Invalid timestamp '{}': {}", s, e));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.timestamp_millis());
    }

    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc().timestamp_millis());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc().timestamp_millis());
        }
    }

    Err(format!(
        "Invalid time '{}'. Use epoch milliseconds, RFC 3339, 'YYYY-MM-DD HH:MM:SS' or 'YYYY-MM-DD'",
        s
    ))
}
