//! Exchange and Pagination Constants
//!
//! Static tables shared by the connectors and the OHLCV paginator.
//!
//! ## Page Limits
//!
//! Each exchange caps how many candles a single klines request may return.
//! Requests larger than the cap are split into pages by the paginator.
//! Exchanges without an entry use [`DEFAULT_PAGE_LIMIT`].

/// Page limit used for exchanges without a specific entry
pub const DEFAULT_PAGE_LIMIT: usize = 200;

/// Page size used when a larger page fetch fails
pub const RETRY_PAGE_SIZE: usize = 50;

/// Size-reduction retries allowed across one paginated request
pub const DEFAULT_MAX_RETRIES_PER_REQUEST: usize = 3;

/// Default HTTP timeout for exchange requests (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Exchanges initialized when no explicit list is configured
pub const DEFAULT_EXCHANGES: &[&str] = &["binance", "bybit", "okx"];

/// Exchanges with a connector implementation
pub const SUPPORTED_EXCHANGES: &[&str] = &["binance", "bybit", "okx"];

/// User agent sent with every exchange request
pub const USER_AGENT: &str = concat!("crypto-fetcher/", env!("CARGO_PKG_VERSION"));

/// Maximum candles returned by one klines request on `exchange`
pub fn page_limit_for(exchange: &str) -> usize {
    match exchange {
        "binance" => 1000,
        "bybit" => 1000,
        "okx" => 100,
        "kraken" => 720,
        "coinbase" => 300,
        "kucoin" => 1500,
        "huobi" => 2000,
        _ => DEFAULT_PAGE_LIMIT,
    }
}
