mod fetch_request;
mod market;
mod ohlcv;
mod output_format;
mod ticker;
mod timeframe;
pub mod fetcher_config;

pub use fetch_request::{FetchCompletion, FetchRequest, OhlcvFetch};
pub use fetcher_config::FetcherConfig;
pub use market::Market;
pub use ohlcv::{iso8601, Candle, RawCandle};
pub use output_format::OutputFormat;
pub use ticker::{Ticker, TickerEntry};
pub use timeframe::Timeframe;

/// Observer invoked with (completed, total) after each fetched page
pub type ProgressCallback = Box<dyn Fn(usize, usize) + Send + Sync>;
