pub mod binance;
pub mod bybit;
pub mod crypto_fetcher;
pub mod exchange;
pub mod exchange_registry;
pub mod formatter;
pub mod http;
pub mod ohlcv_paginator;
pub mod okx;

#[cfg(test)]
pub mod mock_exchange;

pub use crypto_fetcher::{is_symbol_error, CryptoFetcher};
pub use exchange::{build_connector, ExchangeConnector};
pub use exchange_registry::{ExchangeRegistry, RegisteredExchange};
pub use ohlcv_paginator::OhlcvPaginator;
