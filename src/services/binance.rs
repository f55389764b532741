//! Binance spot REST connector
//!
//! Endpoints:
//! - `GET /api/v3/exchangeInfo` - market list
//! - `GET /api/v3/ticker/24hr` - 24h ticker
//! - `GET /api/v3/klines` - candles, ascending, max 1000 per request

use crate::error::Result;
use crate::models::{iso8601, Market, RawCandle, Ticker, Timeframe};
use crate::services::exchange::ExchangeConnector;
use crate::services::http::{get_json, opt_f64, raw_candle_from_row};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Base URL for the Binance spot API
pub const BASE_URL: &str = "https://api.binance.com";

#[derive(Debug, Deserialize)]
struct ExchangeInfo {
    symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SymbolInfo {
    symbol: String,
    status: String,
    base_asset: String,
    quote_asset: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ticker24h {
    last_price: Option<String>,
    bid_price: Option<String>,
    ask_price: Option<String>,
    high_price: Option<String>,
    low_price: Option<String>,
    volume: Option<String>,
    quote_volume: Option<String>,
    price_change: Option<String>,
    price_change_percent: Option<String>,
    close_time: Option<i64>,
}

/// Binance kline interval string
pub fn binance_interval(timeframe: Timeframe) -> &'static str {
    match timeframe {
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

#[derive(Debug, Clone)]
pub struct BinanceConnector {
    client: Client,
    base_url: String,
}

impl BinanceConnector {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, BASE_URL)
    }

    /// Point the connector at a custom base URL (mock servers, mirrors)
    pub fn with_base_url(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl ExchangeConnector for BinanceConnector {
    fn id(&self) -> &str {
        "binance"
    }

    async fn load_markets(&self) -> Result<Vec<Market>> {
        let info: ExchangeInfo = get_json(&self.client, &self.url("/api/v3/exchangeInfo"), &[]).await?;

        let markets: Vec<Market> = info
            .symbols
            .into_iter()
            .map(|s| Market::new(&s.symbol, &s.base_asset, &s.quote_asset, s.status == "TRADING"))
            .collect();

        debug!("Loaded {} binance markets", markets.len());
        Ok(markets)
    }

    async fn fetch_ticker(&self, market: &Market) -> Result<Ticker> {
        let raw: Ticker24h = get_json(
            &self.client,
            &self.url("/api/v3/ticker/24hr"),
            &[("symbol", market.id.clone())],
        )
        .await?;

        Ok(Ticker {
            symbol: market.symbol.clone(),
            last: opt_f64(raw.last_price.as_deref()),
            bid: opt_f64(raw.bid_price.as_deref()),
            ask: opt_f64(raw.ask_price.as_deref()),
            high: opt_f64(raw.high_price.as_deref()),
            low: opt_f64(raw.low_price.as_deref()),
            volume: opt_f64(raw.volume.as_deref()),
            quote_volume: opt_f64(raw.quote_volume.as_deref()),
            change: opt_f64(raw.price_change.as_deref()),
            percentage: opt_f64(raw.price_change_percent.as_deref()),
            timestamp: raw.close_time,
            datetime: raw.close_time.map(iso8601),
        })
    }

    async fn fetch_ohlcv_page(
        &self,
        market_id: &str,
        timeframe: Timeframe,
        limit: usize,
        since: Option<i64>,
    ) -> Result<Vec<RawCandle>> {
        let mut query = vec![
            ("symbol", market_id.to_string()),
            ("interval", binance_interval(timeframe).to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(since) = since {
            query.push(("startTime", since.to_string()));
        }

        let rows: Vec<Vec<Value>> = get_json(&self.client, &self.url("/api/v3/klines"), &query).await?;

        let mut candles = rows
            .iter()
            .map(|row| raw_candle_from_row(row, "binance"))
            .collect::<Result<Vec<_>>>()?;
        candles.sort_by_key(|c| c.timestamp);

        Ok(candles)
    }
}
