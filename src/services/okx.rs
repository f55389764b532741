//! OKX spot REST connector (v5 API)
//!
//! OKX responses look like `{ "code": "0", "msg": "", "data": [...] }`; any code
//! other than `"0"` is an error. Candles come newest first and are paged with
//! `after` (older than) / `before` (newer than) cursors.

use crate::error::{AppError, Result};
use crate::models::{iso8601, Market, RawCandle, Ticker, Timeframe};
use crate::services::exchange::ExchangeConnector;
use crate::services::http::{classify_message, get_json, opt_f64, raw_candle_from_row};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Base URL for the OKX v5 API
pub const BASE_URL: &str = "https://www.okx.com";

/// History endpoint covers the full candle archive (max 100 per request)
pub const OKX_HISTORY_KLINES_PATH: &str = "/api/v5/market/history-candles";

#[derive(Debug, Deserialize)]
struct OkxResponse<T> {
    code: String,
    msg: String,
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

impl<T> OkxResponse<T> {
    fn into_data(self) -> Result<Vec<T>> {
        if self.code != "0" {
            return Err(classify_message(&format!(
                "OKX API error (code {}): {}",
                self.code, self.msg
            )));
        }
        Ok(self.data)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Instrument {
    inst_id: String,
    base_ccy: String,
    quote_ccy: String,
    state: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OkxTicker {
    last: Option<String>,
    ask_px: Option<String>,
    bid_px: Option<String>,
    open24h: Option<String>,
    high24h: Option<String>,
    low24h: Option<String>,
    vol24h: Option<String>,
    vol_ccy24h: Option<String>,
    ts: Option<String>,
}

/// OKX candle bar string
pub fn okx_interval(timeframe: Timeframe) -> &'static str {
    match timeframe {
        Timeframe::Minute1 => "1m",
        Timeframe::Minute5 => "5m",
        Timeframe::Minute15 => "15m",
        Timeframe::Minute30 => "30m",
        Timeframe::Hour1 => "1H",
        Timeframe::Hour4 => "4H",
        Timeframe::Day1 => "1Dutc",
        Timeframe::Week1 => "1Wutc",
    }
}

#[derive(Debug, Clone)]
pub struct OkxConnector {
    client: Client,
    base_url: String,
}

impl OkxConnector {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, BASE_URL)
    }

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
impl ExchangeConnector for OkxConnector {
    fn id(&self) -> &str {
        "okx"
    }

    async fn load_markets(&self) -> Result<Vec<Market>> {
        let response: OkxResponse<Instrument> = get_json(
            &self.client,
            &self.url("/api/v5/public/instruments"),
            &[("instType", "SPOT".to_string())],
        )
        .await?;

        let markets: Vec<Market> = response
            .into_data()?
            .into_iter()
            .map(|i| Market::new(&i.inst_id, &i.base_ccy, &i.quote_ccy, i.state == "live"))
            .collect();

        debug!("Loaded {} okx markets", markets.len());
        Ok(markets)
    }

    async fn fetch_ticker(&self, market: &Market) -> Result<Ticker> {
        let response: OkxResponse<OkxTicker> = get_json(
            &self.client,
            &self.url("/api/v5/market/ticker"),
            &[("instId", market.id.clone())],
        )
        .await?;

        let raw = response
            .into_data()?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::InvalidSymbol(format!("No ticker returned for {}", market.id)))?;

        let timestamp = raw.ts.as_deref().and_then(|ts| ts.parse::<i64>().ok());
        let ticker = Ticker {
            symbol: market.symbol.clone(),
            last: opt_f64(raw.last.as_deref()),
            bid: opt_f64(raw.bid_px.as_deref()),
            ask: opt_f64(raw.ask_px.as_deref()),
            high: opt_f64(raw.high24h.as_deref()),
            low: opt_f64(raw.low24h.as_deref()),
            volume: opt_f64(raw.vol24h.as_deref()),
            // For spot instruments volCcy24h is quoted in the quote currency
            quote_volume: opt_f64(raw.vol_ccy24h.as_deref()),
            change: None,
            percentage: None,
            timestamp,
            datetime: timestamp.map(iso8601),
        };

        Ok(ticker.with_change_from_open(opt_f64(raw.open24h.as_deref())))
    }

    async fn fetch_ohlcv_page(
        &self,
        market_id: &str,
        timeframe: Timeframe,
        limit: usize,
        since: Option<i64>,
    ) -> Result<Vec<RawCandle>> {
        let mut query = vec![
            ("instId", market_id.to_string()),
            ("bar", okx_interval(timeframe).to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(since) = since {
            // `before`/`after` are exclusive bounds
            let after = since + limit as i64 * timeframe.duration_ms();
            query.push(("before", (since - 1).to_string()));
            query.push(("after", after.to_string()));
        }

        let response: OkxResponse<Vec<Value>> =
            get_json(&self.client, &self.url(OKX_HISTORY_KLINES_PATH), &query).await?;

        let mut candles = response
            .into_data()?
            .iter()
            .map(|row| raw_candle_from_row(row, "okx"))
            .collect::<Result<Vec<_>>>()?;
        candles.sort_by_key(|c| c.timestamp);

        Ok(candles)
    }
}
