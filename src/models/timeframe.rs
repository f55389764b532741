use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Candlestick timeframe for historical data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
pub enum Timeframe {
    /// 1-minute candles
    #[serde(rename = "1m")]
    #[value(name = "1m")]
    Minute1,
    /// 5-minute candles
    #[serde(rename = "5m")]
    #[value(name = "5m")]
    Minute5,
    /// 15-minute candles
    #[serde(rename = "15m")]
    #[value(name = "15m")]
    Minute15,
    /// 30-minute candles
    #[serde(rename = "30m")]
    #[value(name = "30m")]
    Minute30,
    /// 1-hour candles
    #[serde(rename = "1h")]
    #[value(name = "1h")]
    Hour1,
    /// 4-hour candles
    #[serde(rename = "4h")]
    #[value(name = "4h")]
    Hour4,
    /// Daily candles
    #[serde(rename = "1d")]
    #[value(name = "1d")]
    Day1,
    /// Weekly candles
    #[serde(rename = "1w")]
    #[value(name = "1w")]
    Week1,
}

const MINUTE_MS: i64 = 60_000;

impl Timeframe {
    /// Convert to interval string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Minute1 => "1m",
            Timeframe::Minute5 => "5m",
            Timeframe::Minute15 => "15m",
            Timeframe::Minute30 => "30m",
            Timeframe::Hour1 => "1h",
            Timeframe::Hour4 => "4h",
            Timeframe::Day1 => "1d",
            Timeframe::Week1 => "1w",
        }
    }

    /// Length of one candle in milliseconds
    pub fn duration_ms(&self) -> i64 {
        match self {
            Timeframe::Minute1 => MINUTE_MS,
            Timeframe::Minute5 => 5 * MINUTE_MS,
            Timeframe::Minute15 => 15 * MINUTE_MS,
            Timeframe::Minute30 => 30 * MINUTE_MS,
            Timeframe::Hour1 => 60 * MINUTE_MS,
            Timeframe::Hour4 => 4 * 60 * MINUTE_MS,
            Timeframe::Day1 => 24 * 60 * MINUTE_MS,
            Timeframe::Week1 => 7 * 24 * 60 * MINUTE_MS,
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Default for Timeframe {
    fn default() -> Self {
        Timeframe::Hour1
    }
}
