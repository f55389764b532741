//! Shared HTTP plumbing for exchange connectors
//!
//! Builds the reqwest client, executes GET requests, and maps transport and
//! HTTP-level failures onto [`AppError`] variants.

use crate::constants::USER_AGENT;
use crate::error::{AppError, Result};
use crate::models::RawCandle;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Build the HTTP client shared by all connectors
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))
}

/// GET `url` with query parameters and decode the JSON body
pub async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    query: &[(&str, String)],
) -> Result<T> {
    debug!("GET {} {:?}", url, query);

    let response = client
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|e| classify_transport_error(&e))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| AppError::Network(format!("Failed to read response body: {}", e)))?;

    if !status.is_success() {
        warn!("Request to {} failed with status {}", url, status);
        return Err(classify_status(status, &body));
    }

    serde_json::from_str::<T>(&body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        AppError::Parse(format!("Failed to parse response from {}: {} ({})", url, e, preview))
    })
}

fn classify_transport_error(err: &reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::Network(format!("Request timeout: {}", err))
    } else if err.is_connect() {
        AppError::Network(format!("Connection failed: {}", err))
    } else {
        AppError::Network(err.to_string())
    }
}

/// Map a non-success HTTP status and its body onto the error taxonomy
pub fn classify_status(status: StatusCode, body: &str) -> AppError {
    let detail = format!("HTTP {}: {}", status.as_u16(), body.trim());
    match status.as_u16() {
        418 | 429 => AppError::RateLimit(detail),
        401 => AppError::Authentication(detail),
        403 | 451 => AppError::GeoRestricted(detail),
        503 => AppError::Maintenance(detail),
        500..=599 => AppError::Exchange(detail),
        _ => classify_message(&detail),
    }
}

/// Map an exchange-reported error message onto the error taxonomy
pub fn classify_message(message: &str) -> AppError {
    let lower = message.to_lowercase();

    if lower.contains("invalid symbol")
        || lower.contains("symbol invalid")
        || lower.contains("not exist")
        || lower.contains("not found")
        || lower.contains("unknown symbol")
    {
        AppError::InvalidSymbol(message.to_string())
    } else if lower.contains("too many") || lower.contains("rate limit") {
        AppError::RateLimit(message.to_string())
    } else if lower.contains("maintenance") || lower.contains("temporarily unavailable") {
        AppError::Maintenance(message.to_string())
    } else if lower.contains("restricted location") || lower.contains("region") {
        AppError::GeoRestricted(message.to_string())
    } else if lower.contains("api key") || lower.contains("signature") {
        AppError::Authentication(message.to_string())
    } else {
        AppError::Exchange(message.to_string())
    }
}

/// Parse an exchange number that may arrive as a JSON string or number
pub fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

pub fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Parse an optional string field, treating "" as missing
pub fn opt_f64(value: Option<&str>) -> Option<f64> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
}

/// Parse a kline row laid out as `[open_time, open, high, low, close, volume, ...]`
pub fn raw_candle_from_row(row: &[Value], exchange: &str) -> Result<RawCandle> {
    if row.len() < 6 {
        return Err(AppError::Parse(format!(
            "{} kline row has {} elements, expected at least 6",
            exchange,
            row.len()
        )));
    }

    let field = |idx: usize, name: &str| -> Result<f64> {
        value_as_f64(&row[idx]).ok_or_else(|| {
            AppError::Parse(format!("{} kline: invalid {} '{}'", exchange, name, row[idx]))
        })
    };

    let timestamp = value_as_i64(&row[0]).ok_or_else(|| {
        AppError::Parse(format!("{} kline: invalid open time '{}'", exchange, row[0]))
    })?;

    Ok(RawCandle {
        timestamp,
        open: field(1, "open")?,
        high: field(2, "high")?,
        low: field(3, "low")?,
        close: field(4, "close")?,
        volume: field(5, "volume")?,
    })
}
