//! Exchange connector abstraction
//!
//! Every supported exchange implements [`ExchangeConnector`]. The paginator and
//! the fetcher service only ever talk to this trait, so connectors can be swapped
//! for in-memory fakes in tests.

use crate::constants::page_limit_for;
use crate::error::Result;
use crate::models::{Market, RawCandle, Ticker, Timeframe};
use crate::services::{binance::BinanceConnector, bybit::BybitConnector, okx::OkxConnector};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;

#[async_trait]
pub trait ExchangeConnector: Send + Sync {
    /// Lowercase exchange id, e.g. "binance"
    fn id(&self) -> &str;

    /// Maximum candles one `fetch_ohlcv_page` call may return
    fn page_limit(&self) -> usize {
        page_limit_for(self.id())
    }

    /// Load the spot market list
    async fn load_markets(&self) -> Result<Vec<Market>>;

    /// Fetch the 24h ticker for a market
    async fn fetch_ticker(&self, market: &Market) -> Result<Ticker>;

    /// Fetch one page of candles, ascending by open time
    ///
    /// With `since = None` the exchange returns its most recent `limit` candles.
    /// Otherwise candles start at or after `since`. The result never exceeds
    /// `limit` entries for a well-behaved exchange.
    async fn fetch_ohlcv_page(
        &self,
        market_id: &str,
        timeframe: Timeframe,
        limit: usize,
        since: Option<i64>,
    ) -> Result<Vec<RawCandle>>;
}

/// Construct the connector for `exchange`, or `None` when no implementation exists
pub fn build_connector(exchange: &str, client: Client) -> Option<Arc<dyn ExchangeConnector>> {
    match exchange {
        "binance" => Some(Arc::new(BinanceConnector::new(client))),
        "bybit" => Some(Arc::new(BybitConnector::new(client))),
        "okx" => Some(Arc::new(OkxConnector::new(client))),
        _ => None,
    }
}
