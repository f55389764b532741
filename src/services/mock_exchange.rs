//! In-memory exchange used by unit tests
//!
//! Serves a contiguous synthetic candle history and records every page request.

use crate::error::{AppError, Result};
use crate::models::{Market, RawCandle, Ticker, Timeframe};
use crate::services::exchange::ExchangeConnector;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// One recorded `fetch_ohlcv_page` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCall {
    pub limit: usize,
    pub since: Option<i64>,
}

pub struct MockExchange {
    id: String,
    page_limit: usize,
    markets: Vec<Market>,
    history: Vec<RawCandle>,
    /// Extra candles appended past the requested window
    overshoot: usize,
    /// Per-call failure plan, consumed front to back; `true` fails that call
    failures: Mutex<VecDeque<bool>>,
    fail_all: bool,
    fail_markets: bool,
    calls: Mutex<Vec<PageCall>>,
}

/// Hour-aligned open time of the newest mock candle
pub const LAST_OPEN: i64 = 1_699_999_200_000;

impl MockExchange {
    /// `count` contiguous candles of `timeframe`, the newest opening at `last_open`
    pub fn new(id: &str, page_limit: usize, timeframe: Timeframe, count: usize, last_open: i64) -> Self {
        let step = timeframe.duration_ms();
        let first = last_open - (count as i64 - 1) * step;
        let history = (0..count as i64)
            .map(|i| {
                let price = 100.0 + i as f64;
                RawCandle::new(first + i * step, price, price + 1.0, price - 1.0, price + 0.5, 10.0)
            })
            .collect();

        Self {
            id: id.to_string(),
            page_limit,
            markets: vec![
                Market::new("BTCUSDT", "BTC", "USDT", true),
                Market::new("ETHUSDT", "ETH", "USDT", true),
            ],
            history,
            overshoot: 0,
            failures: Mutex::new(VecDeque::new()),
            fail_all: false,
            fail_markets: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Hourly history with the newest candle at [`LAST_OPEN`]
    pub fn hourly(page_limit: usize, count: usize) -> Self {
        Self::new("mock", page_limit, Timeframe::Hour1, count, LAST_OPEN)
    }

    pub fn with_failures(self, plan: &[bool]) -> Self {
        *self.failures.lock().unwrap() = plan.iter().copied().collect();
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_all = true;
        self
    }

    pub fn failing_markets(mut self) -> Self {
        self.fail_markets = true;
        self
    }

    pub fn with_overshoot(mut self, extra: usize) -> Self {
        self.overshoot = extra;
        self
    }

    pub fn calls(&self) -> Vec<PageCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn first_open(&self) -> i64 {
        self.history.first().map(|c| c.timestamp).unwrap_or(0)
    }
}

#[async_trait]
impl ExchangeConnector for MockExchange {
    fn id(&self) -> &str {
        &self.id
    }

    fn page_limit(&self) -> usize {
        self.page_limit
    }

    async fn load_markets(&self) -> Result<Vec<Market>> {
        if self.fail_markets {
            return Err(AppError::Network("markets unavailable".to_string()));
        }
        Ok(self.markets.clone())
    }

    async fn fetch_ticker(&self, market: &Market) -> Result<Ticker> {
        if market.base == "ETH" {
            return Err(AppError::Exchange("ticker unavailable".to_string()));
        }
        Ok(Ticker {
            symbol: market.symbol.clone(),
            last: Some(42_000.0),
            bid: Some(41_999.5),
            ask: Some(42_000.5),
            ..Default::default()
        })
    }

    async fn fetch_ohlcv_page(
        &self,
        _market_id: &str,
        _timeframe: Timeframe,
        limit: usize,
        since: Option<i64>,
    ) -> Result<Vec<RawCandle>> {
        self.calls.lock().unwrap().push(PageCall { limit, since });

        let planned_failure = self.failures.lock().unwrap().pop_front().unwrap_or(false);
        if self.fail_all || planned_failure {
            return Err(AppError::Network(format!("mock failure at limit {}", limit)));
        }

        let page = match since {
            None => {
                let start = self.history.len().saturating_sub(limit);
                self.history[start..].to_vec()
            }
            Some(since) => self
                .history
                .iter()
                .filter(|c| c.timestamp >= since)
                .take(limit + self.overshoot)
                .copied()
                .collect(),
        };

        Ok(page)
    }
}
