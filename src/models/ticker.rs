use serde::{Deserialize, Serialize};

/// 24-hour ticker snapshot for a trading pair
///
/// Numeric fields are optional because not every exchange reports all of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub symbol: String,
    pub last: Option<f64>,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    /// 24h volume in base asset
    pub volume: Option<f64>,
    /// 24h volume in quote asset
    pub quote_volume: Option<f64>,
    /// Absolute 24h price change
    pub change: Option<f64>,
    /// 24h price change in percent
    pub percentage: Option<f64>,
    pub timestamp: Option<i64>,
    pub datetime: Option<String>,
}

impl Ticker {
    /// Fill `change` and `percentage` from the 24h open when the exchange only reports the open
    pub fn with_change_from_open(mut self, open_24h: Option<f64>) -> Self {
        if let (Some(last), Some(open)) = (self.last, open_24h) {
            if self.change.is_none() {
                self.change = Some(last - open);
            }
            if self.percentage.is_none() && open != 0.0 {
                self.percentage = Some((last - open) / open * 100.0);
            }
        }
        self
    }
}

/// Result of one symbol in a multi-ticker request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TickerEntry {
    Data(Ticker),
    Failed { error: String },
}
