//! Registry of initialized exchanges
//!
//! Built once at startup, then read-only. Each entry pairs a connector with the
//! market list it loaded, so symbol checks never hit the network again.

use crate::error::{AppError, Result};
use crate::models::{FetcherConfig, Market};
use crate::services::exchange::{build_connector, ExchangeConnector};
use crate::services::http::build_client;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// An exchange whose markets loaded successfully
pub struct RegisteredExchange {
    pub connector: Arc<dyn ExchangeConnector>,
    pub markets: Vec<Market>,
}

impl RegisteredExchange {
    pub fn id(&self) -> &str {
        self.connector.id()
    }

    pub fn page_limit(&self) -> usize {
        self.connector.page_limit()
    }

    /// Find a market by unified symbol or native id
    pub fn resolve(&self, symbol: &str) -> Option<&Market> {
        self.markets.iter().find(|m| m.matches(symbol))
    }

    /// Resolve a symbol or fail with `InvalidSymbol`
    pub fn require_market(&self, symbol: &str) -> Result<&Market> {
        self.resolve(symbol).ok_or_else(|| {
            AppError::InvalidSymbol(format!("{} is not listed on {}", symbol, self.id()))
        })
    }
}

pub struct ExchangeRegistry {
    exchanges: BTreeMap<String, RegisteredExchange>,
    /// (exchange, reason) for exchanges that failed to initialize
    failures: Vec<(String, String)>,
}

impl ExchangeRegistry {
    /// Build connectors for the configured exchanges and load their markets
    ///
    /// Exchanges that fail to load are skipped with a warning and recorded in
    /// [`failures`](Self::failures).
    pub async fn initialize(config: &FetcherConfig) -> Result<Self> {
        let client = build_client(config.request_timeout)?;

        let mut connectors = Vec::new();
        let mut failures = Vec::new();
        for name in &config.exchanges {
            match build_connector(name, client.clone()) {
                Some(connector) => connectors.push(connector),
                None => {
                    warn!("No connector available for exchange '{}'", name);
                    failures.push((name.clone(), "unsupported exchange".to_string()));
                }
            }
        }

        let mut registry = Self::from_connectors(connectors).await;
        registry.failures.extend(failures);
        Ok(registry)
    }

    /// Load markets for the given connectors concurrently
    pub async fn from_connectors(connectors: Vec<Arc<dyn ExchangeConnector>>) -> Self {
        let loads = connectors.into_iter().map(|connector| async move {
            let result = connector.load_markets().await;
            (connector, result)
        });

        let mut exchanges = BTreeMap::new();
        let mut failures = Vec::new();

        for (connector, result) in join_all(loads).await {
            let id = connector.id().to_string();
            match result {
                Ok(markets) => {
                    info!("Initialized {} with {} markets", id, markets.len());
                    exchanges.insert(id, RegisteredExchange { connector, markets });
                }
                Err(e) => {
                    warn!("Failed to initialize {}: {}", id, e);
                    failures.push((id, e.to_string()));
                }
            }
        }

        Self {
            exchanges,
            failures,
        }
    }

    /// Look up an initialized exchange
    pub fn get(&self, name: &str) -> Result<&RegisteredExchange> {
        self.exchanges
            .get(&name.to_lowercase())
            .ok_or_else(|| AppError::UnknownExchange {
                name: name.to_string(),
                available: self.available_exchanges(),
            })
    }

    /// Sorted ids of initialized exchanges
    pub fn available_exchanges(&self) -> Vec<String> {
        self.exchanges.keys().cloned().collect()
    }

    pub fn failures(&self) -> &[(String, String)] {
        &self.failures
    }
}
