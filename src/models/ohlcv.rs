use chrono::{DateTime, SecondsFormat};
use serde::{Deserialize, Serialize};

/// Candle as returned by a single page fetch, before presentation fields are attached
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawCandle {
    /// Open time of the interval (milliseconds since epoch)
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Volume in base-asset units
    pub volume: f64,
}

impl RawCandle {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// OHLCV (Open, High, Low, Close, Volume) record handed to formatters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Open time of the interval (milliseconds since epoch)
    pub timestamp: i64,

    /// ISO-8601 rendering of `timestamp`
    pub datetime: String,

    /// Opening price
    pub open: f64,

    /// Highest price
    pub high: f64,

    /// Lowest price
    pub low: f64,

    /// Closing price
    pub close: f64,

    /// Trading volume (base asset)
    pub volume: f64,
}

impl From<RawCandle> for Candle {
    fn from(raw: RawCandle) -> Self {
        Self {
            timestamp: raw.timestamp,
            datetime: iso8601(raw.timestamp),
            open: raw.open,
            high: raw.high,
            low: raw.low,
            close: raw.close,
            volume: raw.volume,
        }
    }
}

/// Format a millisecond timestamp as `2023-11-14T22:13:20.000Z`
///
/// Out-of-range timestamps fall back to the raw number.
pub fn iso8601(timestamp_ms: i64) -> String {
    match DateTime::from_timestamp_millis(timestamp_ms) {
        Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
        None => timestamp_ms.to_string(),
    }
}
