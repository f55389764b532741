//! Fetcher service
//!
//! The facade the CLI talks to. Owns the exchange registry, resolves symbols
//! against loaded markets and runs the paginator for historical requests.

use crate::error::{AppError, Result};
use crate::models::{
    FetchRequest, FetcherConfig, OhlcvFetch, ProgressCallback, Ticker, TickerEntry, Timeframe,
};
use crate::services::exchange_registry::ExchangeRegistry;
use crate::services::ohlcv_paginator::OhlcvPaginator;
use tracing::{debug, info};

pub struct CryptoFetcher {
    registry: ExchangeRegistry,
    max_retries_per_request: usize,
}

impl CryptoFetcher {
    pub fn new(registry: ExchangeRegistry, max_retries_per_request: usize) -> Self {
        Self {
            registry,
            max_retries_per_request,
        }
    }

    /// Initialize the configured exchanges and wrap them in a fetcher
    pub async fn from_config(config: &FetcherConfig) -> Result<Self> {
        let registry = ExchangeRegistry::initialize(config).await?;
        info!(
            "Available exchanges: {}",
            registry.available_exchanges().join(", ")
        );
        Ok(Self::new(registry, config.max_retries_per_request))
    }

    pub fn registry(&self) -> &ExchangeRegistry {
        &self.registry
    }

    pub fn available_exchanges(&self) -> Vec<String> {
        self.registry.available_exchanges()
    }

    /// Unified symbols of every market on `exchange`, sorted
    pub fn exchange_symbols(&self, exchange: &str) -> Result<Vec<String>> {
        let registered = self.registry.get(exchange)?;
        let mut symbols: Vec<String> = registered.markets.iter().map(|m| m.symbol.clone()).collect();
        symbols.sort();
        symbols.dedup();
        Ok(symbols)
    }

    /// Case-insensitive substring search over the symbol list
    ///
    /// Returns at most `limit` symbols together with the total number of matches.
    pub fn search_symbols(
        &self,
        exchange: &str,
        query: Option<&str>,
        limit: usize,
    ) -> Result<(Vec<String>, usize)> {
        let symbols = self.exchange_symbols(exchange)?;
        let matching: Vec<String> = match query {
            Some(query) => {
                let needle = query.to_uppercase();
                symbols
                    .into_iter()
                    .filter(|s| s.to_uppercase().contains(&needle))
                    .collect()
            }
            None => symbols,
        };

        let total = matching.len();
        Ok((matching.into_iter().take(limit).collect(), total))
    }

    /// Whether `symbol` is listed on `exchange`
    ///
    /// Fails only when the exchange itself is unknown.
    pub fn validate_symbol(&self, exchange: &str, symbol: &str) -> Result<bool> {
        Ok(self.registry.get(exchange)?.resolve(symbol).is_some())
    }

    pub async fn fetch_ticker(&self, exchange: &str, symbol: &str) -> Result<Ticker> {
        let registered = self.registry.get(exchange)?;
        let market = registered
            .require_market(symbol)
            .map_err(|e| e.fetch_context(exchange, symbol))?;

        debug!("Fetching ticker {} ({}) on {}", market.symbol, market.id, registered.id());
        registered
            .connector
            .fetch_ticker(market)
            .await
            .map_err(|e| e.fetch_context(exchange, symbol))
    }

    /// Fetch tickers one after another, capturing per-symbol failures
    pub async fn fetch_multiple_tickers(
        &self,
        exchange: &str,
        symbols: &[String],
    ) -> Result<Vec<(String, TickerEntry)>> {
        // An unknown exchange fails the whole request rather than every row
        self.registry.get(exchange)?;

        let mut results = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let entry = match self.fetch_ticker(exchange, symbol).await {
                Ok(ticker) => TickerEntry::Data(ticker),
                Err(e) => TickerEntry::Failed {
                    error: e.root_cause().to_string(),
                },
            };
            results.push((symbol.clone(), entry));
        }
        Ok(results)
    }

    /// Paginated historical candles for `symbol`
    ///
    /// With `until = None` the most recent `total_limit` candles are returned,
    /// otherwise the `total_limit` candles ending at `until`.
    pub async fn fetch_ohlcv(
        &self,
        exchange: &str,
        symbol: &str,
        timeframe: Timeframe,
        total_limit: usize,
        until: Option<i64>,
        progress: Option<&ProgressCallback>,
    ) -> Result<OhlcvFetch> {
        let registered = self.registry.get(exchange)?;
        let market = registered
            .require_market(symbol)
            .map_err(|e| e.fetch_context(exchange, symbol))?;

        let request = FetchRequest {
            symbol: market.id.clone(),
            timeframe,
            total_limit,
            until,
        };

        OhlcvPaginator::new(registered.connector.as_ref())
            .with_max_retries(self.max_retries_per_request)
            .with_progress(progress)
            .fetch(&request)
            .await
            .map_err(|e| e.fetch_context(exchange, symbol))
    }
}

impl std::fmt::Debug for CryptoFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptoFetcher")
            .field("exchanges", &self.registry.available_exchanges())
            .field("max_retries_per_request", &self.max_retries_per_request)
            .finish()
    }
}

/// True when `err` was caused by a symbol missing from the exchange
pub fn is_symbol_error(err: &AppError) -> bool {
    matches!(err.root_cause(), AppError::InvalidSymbol(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_MAX_RETRIES_PER_REQUEST;
    use crate::models::FetchCompletion;
    use crate::services::exchange::ExchangeConnector;
    use crate::services::mock_exchange::MockExchange;
    use std::sync::Arc;

    async fn fetcher_with(exchange: MockExchange) -> CryptoFetcher {
        let connector: Arc<dyn ExchangeConnector> = Arc::new(exchange);
        let registry = ExchangeRegistry::from_connectors(vec![connector]).await;
        CryptoFetcher::new(registry, DEFAULT_MAX_RETRIES_PER_REQUEST)
    }

    #[tokio::test]
    async fn test_symbol_listing_and_search() {
        let fetcher = fetcher_with(MockExchange::hourly(100, 10)).await;

        assert_eq!(fetcher.available_exchanges(), vec!["mock".to_string()]);
        assert_eq!(
            fetcher.exchange_symbols("mock").unwrap(),
            vec!["BTC/USDT".to_string(), "ETH/USDT".to_string()]
        );

        let (shown, total) = fetcher.search_symbols("mock", Some("eth"), 10).unwrap();
        assert_eq!(shown, vec!["ETH/USDT".to_string()]);
        assert_eq!(total, 1);

        let (shown, total) = fetcher.search_symbols("mock", None, 1).unwrap();
        assert_eq!(shown.len(), 1);
        assert_eq!(total, 2);
    }

    #[tokio::test]
    async fn test_validate_symbol() {
        let fetcher = fetcher_with(MockExchange::hourly(100, 10)).await;

        assert!(fetcher.validate_symbol("mock", "btc/usdt").unwrap());
        assert!(fetcher.validate_symbol("mock", "ETHUSDT").unwrap());
        assert!(!fetcher.validate_symbol("mock", "DOGE/USDT").unwrap());
        assert!(fetcher.validate_symbol("nowhere", "BTC/USDT").is_err());
    }

    #[tokio::test]
    async fn test_fetch_ticker_wraps_errors() {
        let fetcher = fetcher_with(MockExchange::hourly(100, 10)).await;

        let ticker = fetcher.fetch_ticker("mock", "BTC/USDT").await.unwrap();
        assert_eq!(ticker.symbol, "BTC/USDT");
        assert_eq!(ticker.last, Some(42_000.0));

        let err = fetcher.fetch_ticker("mock", "DOGE/USDT").await.unwrap_err();
        assert!(matches!(err, AppError::Fetch { .. }));
        assert!(is_symbol_error(&err));
    }

    #[tokio::test]
    async fn test_fetch_multiple_tickers_captures_failures() {
        let fetcher = fetcher_with(MockExchange::hourly(100, 10)).await;
        let symbols = vec!["BTC/USDT".to_string(), "ETH/USDT".to_string()];

        let results = fetcher.fetch_multiple_tickers("mock", &symbols).await.unwrap();

        assert_eq!(results.len(), 2);
        assert!(matches!(results[0].1, TickerEntry::Data(_)));
        match &results[1].1 {
            TickerEntry::Failed { error } => assert!(error.contains("ticker unavailable")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_multiple_tickers_unknown_exchange() {
        let fetcher = fetcher_with(MockExchange::hourly(100, 10)).await;
        let err = fetcher
            .fetch_multiple_tickers("nowhere", &["BTC/USDT".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnknownExchange { .. }));
    }

    #[tokio::test]
    async fn test_fetch_ohlcv_resolves_symbol() {
        let fetcher = fetcher_with(MockExchange::hourly(100, 1000)).await;

        let result = fetcher
            .fetch_ohlcv("mock", "btc/usdt", Timeframe::Hour1, 250, None, None)
            .await
            .unwrap();

        assert_eq!(result.candles.len(), 250);
        assert_eq!(result.completion, FetchCompletion::Complete);
    }

    #[tokio::test]
    async fn test_fetch_ohlcv_unknown_symbol_skips_fetch() {
        let fetcher = fetcher_with(MockExchange::hourly(100, 1000)).await;

        let err = fetcher
            .fetch_ohlcv("mock", "DOGE/USDT", Timeframe::Hour1, 10, None, None)
            .await
            .unwrap_err();
        assert!(is_symbol_error(&err));
    }

    #[tokio::test]
    async fn test_fetch_ohlcv_wraps_page_errors() {
        let fetcher = fetcher_with(MockExchange::hourly(100, 1000).failing()).await;

        let err = fetcher
            .fetch_ohlcv("mock", "BTC/USDT", Timeframe::Hour1, 10, None, None)
            .await
            .unwrap_err();
        match err {
            AppError::Fetch { exchange, symbol, source } => {
                assert_eq!(exchange, "mock");
                assert_eq!(symbol, "BTC/USDT");
                assert!(matches!(*source, AppError::Network(_)));
            }
            other => panic!("expected Fetch, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_ohlcv_unknown_exchange() {
        let fetcher = fetcher_with(MockExchange::hourly(100, 1000)).await;
        let err = fetcher
            .fetch_ohlcv("nowhere", "BTC/USDT", Timeframe::Hour1, 10, None, None)
            .await
            .unwrap_err();
        match err {
            AppError::UnknownExchange { available, .. } => {
                assert_eq!(available, vec!["mock".to_string()])
            }
            other => panic!("expected UnknownExchange, got {:?}", other),
        }
    }
}
