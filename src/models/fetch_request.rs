use super::{Candle, Timeframe};

/// Caller intent for one historical OHLCV fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Market to fetch (already resolved to the exchange-native id)
    pub symbol: String,
    pub timeframe: Timeframe,
    /// Number of candles requested
    pub total_limit: usize,
    /// Upper bound on candle open time (ms). `None` means "most recent candles"
    pub until: Option<i64>,
}

impl FetchRequest {
    pub fn latest(symbol: &str, timeframe: Timeframe, total_limit: usize) -> Self {
        Self {
            symbol: symbol.to_string(),
            timeframe,
            total_limit,
            until: None,
        }
    }

    pub fn until(symbol: &str, timeframe: Timeframe, total_limit: usize, until: i64) -> Self {
        Self {
            symbol: symbol.to_string(),
            timeframe,
            total_limit,
            until: Some(until),
        }
    }
}

/// Why pagination stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchCompletion {
    /// All requested candles were collected
    Complete,
    /// The exchange ran out of older data
    HistoryExhausted,
    /// Every candle of a page lay past `until`
    UntilBoundaryReached,
}

/// Paginated OHLCV result
#[derive(Debug, Clone)]
pub struct OhlcvFetch {
    /// Candles in strictly ascending time order
    pub candles: Vec<Candle>,
    pub completion: FetchCompletion,
    /// Page fetches issued, retries included
    pub pages_fetched: usize,
    pub retries_used: usize,
}

impl OhlcvFetch {
    /// True when fewer candles than requested are returned
    pub fn is_partial(&self) -> bool {
        self.completion != FetchCompletion::Complete
    }
}
