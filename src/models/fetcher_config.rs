use crate::constants::{
    DEFAULT_EXCHANGES, DEFAULT_MAX_RETRIES_PER_REQUEST, DEFAULT_TIMEOUT_SECS,
};
use crate::utils;
use std::time::Duration;
use tracing::warn;

/// Configuration for exchange access and pagination
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Exchange ids to initialize (e.g. ["binance", "okx"])
    pub exchanges: Vec<String>,

    /// HTTP timeout for each exchange request
    pub request_timeout: Duration,

    /// Page-size reduction retries allowed per paginated request
    pub max_retries_per_request: usize,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            exchanges: DEFAULT_EXCHANGES.iter().map(|s| s.to_string()).collect(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries_per_request: DEFAULT_MAX_RETRIES_PER_REQUEST,
        }
    }
}

impl FetcherConfig {
    /// Build config from environment variables, falling back to defaults
    ///
    /// * `CRYPTO_FETCHER_EXCHANGES` - comma-separated exchange ids
    /// * `CRYPTO_FETCHER_TIMEOUT_SECS` - HTTP timeout in seconds
    /// * `CRYPTO_FETCHER_MAX_RETRIES` - retry budget per paginated request
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(raw) = utils::env_var("CRYPTO_FETCHER_EXCHANGES") {
            let exchanges = parse_exchange_list(&raw);
            if exchanges.is_empty() {
                warn!("CRYPTO_FETCHER_EXCHANGES is empty, using defaults");
            } else {
                config.exchanges = exchanges;
            }
        }

        if let Some(secs) = utils::env_parse::<u64>("CRYPTO_FETCHER_TIMEOUT_SECS") {
            if secs == 0 {
                warn!("CRYPTO_FETCHER_TIMEOUT_SECS must be positive, using default");
            } else {
                config.request_timeout = Duration::from_secs(secs);
            }
        }

        if let Some(retries) = utils::env_parse::<usize>("CRYPTO_FETCHER_MAX_RETRIES") {
            config.max_retries_per_request = retries;
        }

        config
    }

    /// Restrict initialization to a single exchange
    pub fn only(mut self, exchange: &str) -> Self {
        self.exchanges = vec![exchange.to_lowercase()];
        self
    }
}

/// Parse a comma-separated exchange list, dropping blanks and duplicates
pub fn parse_exchange_list(raw: &str) -> Vec<String> {
    let mut exchanges: Vec<String> = Vec::new();
    for name in raw.split(',').map(|s| s.trim().to_lowercase()) {
        if !name.is_empty() && !exchanges.contains(&name) {
            exchanges.push(name);
        }
    }
    exchanges
}
