//! Bybit spot REST connector (v5 API)
//!
//! Bybit wraps every payload in `{ retCode, retMsg, result, time }` and returns
//! klines newest first. Pages are reversed to ascending order before returning.

use crate::error::{AppError, Result};
use crate::models::{iso8601, Market, RawCandle, Ticker, Timeframe};
use crate::services::exchange::ExchangeConnector;
use crate::services::http::{classify_message, get_json, opt_f64, raw_candle_from_row};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Base URL for the Bybit v5 API
pub const BASE_URL: &str = "https://api.bybit.com";

const CATEGORY: &str = "spot";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BybitResponse<T> {
    ret_code: i64,
    ret_msg: String,
    result: Option<T>,
    time: Option<i64>,
}

impl<T> BybitResponse<T> {
    /// Unwrap the `result` payload, mapping a non-zero `retCode` onto an error
    fn into_result(self) -> Result<(T, Option<i64>)> {
        if self.ret_code != 0 {
            return Err(classify_message(&format!(
                "Bybit API error (code {}): {}",
                self.ret_code, self.ret_msg
            )));
        }
        let time = self.time;
        self.result
            .map(|result| (result, time))
            .ok_or_else(|| AppError::Parse("Bybit response missing result".to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct ListResult<T> {
    // Error responses carry an empty `result` object
    #[serde(default = "Vec::new")]
    list: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstrumentInfo {
    symbol: String,
    base_coin: String,
    quote_coin: String,
    status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BybitTicker {
    last_price: Option<String>,
    bid1_price: Option<String>,
    ask1_price: Option<String>,
    high_price24h: Option<String>,
    low_price24h: Option<String>,
    volume24h: Option<String>,
    turnover24h: Option<String>,
    prev_price24h: Option<String>,
    price24h_pcnt: Option<String>,
}

/// Bybit kline interval string
pub fn bybit_interval(timeframe: Timeframe) -> &'static str {
    match timeframe {
        Timeframe::Minute1 => "1",
        Timeframe::Minute5 => "5",
        Timeframe::Minute15 => "15",
        Timeframe::Minute30 => "30",
        Timeframe::Hour1 => "60",
        Timeframe::Hour4 => "240",
        Timeframe::Day1 => "D",
        Timeframe::Week1 => "W",
    }
}

#[derive(Debug, Clone)]
pub struct BybitConnector {
    client: Client,
    base_url: String,
}

impl BybitConnector {
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
impl ExchangeConnector for BybitConnector {
    fn id(&self) -> &str {
        "bybit"
    }

    async fn load_markets(&self) -> Result<Vec<Market>> {
        let response: BybitResponse<ListResult<InstrumentInfo>> = get_json(
            &self.client,
            &self.url("/v5/market/instruments-info"),
            &[("category", CATEGORY.to_string())],
        )
        .await?;
        let (result, _) = response.into_result()?;

        let markets: Vec<Market> = result
            .list
            .into_iter()
            .map(|i| Market::new(&i.symbol, &i.base_coin, &i.quote_coin, i.status == "Trading"))
            .collect();

        debug!("Loaded {} bybit markets", markets.len());
        Ok(markets)
    }

    async fn fetch_ticker(&self, market: &Market) -> Result<Ticker> {
        let response: BybitResponse<ListResult<BybitTicker>> = get_json(
            &self.client,
            &self.url("/v5/market/tickers"),
            &[("category", CATEGORY.to_string()), ("symbol", market.id.clone())],
        )
        .await?;
        let (result, time) = response.into_result()?;

        let raw = result
            .list
            .into_iter()
            .next()
            .ok_or_else(|| AppError::InvalidSymbol(format!("No ticker returned for {}", market.id)))?;

        let ticker = Ticker {
            symbol: market.symbol.clone(),
            last: opt_f64(raw.last_price.as_deref()),
            bid: opt_f64(raw.bid1_price.as_deref()),
            ask: opt_f64(raw.ask1_price.as_deref()),
            high: opt_f64(raw.high_price24h.as_deref()),
            low: opt_f64(raw.low_price24h.as_deref()),
            volume: opt_f64(raw.volume24h.as_deref()),
            quote_volume: opt_f64(raw.turnover24h.as_deref()),
            change: None,
            // Bybit reports the 24h change as a fraction
            percentage: opt_f64(raw.price24h_pcnt.as_deref()).map(|p| p * 100.0),
            timestamp: time,
            datetime: time.map(iso8601),
        };

        Ok(ticker.with_change_from_open(opt_f64(raw.prev_price24h.as_deref())))
    }

    async fn fetch_ohlcv_page(
        &self,
        market_id: &str,
        timeframe: Timeframe,
        limit: usize,
        since: Option<i64>,
    ) -> Result<Vec<RawCandle>> {
        let mut query = vec![
            ("category", CATEGORY.to_string()),
            ("symbol", market_id.to_string()),
            ("interval", bybit_interval(timeframe).to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(since) = since {
            // Bybit anchors pages at `end`, so bound the window explicitly
            let end = since + limit as i64 * timeframe.duration_ms() - 1;
            query.push(("start", since.to_string()));
            query.push(("end", end.to_string()));
        }

        let response: BybitResponse<ListResult<Vec<Value>>> =
            get_json(&self.client, &self.url("/v5/market/kline"), &query).await?;
        let (result, _) = response.into_result()?;

        let mut candles = result
            .list
            .iter()
            .map(|row| raw_candle_from_row(row, "bybit"))
            .collect::<Result<Vec<_>>>()?;
        candles.sort_by_key(|c| c.timestamp);

        Ok(candles)
    }
}
