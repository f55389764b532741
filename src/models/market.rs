use serde::{Deserialize, Serialize};

/// Tradable spot market as listed by an exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    /// Unified symbol, e.g. "BTC/USDT"
    pub symbol: String,
    /// Exchange-native market id, e.g. "BTCUSDT" or "BTC-USDT"
    pub id: String,
    pub base: String,
    pub quote: String,
    /// Whether the market is currently trading
    pub active: bool,
}

impl Market {
    pub fn new(id: &str, base: &str, quote: &str, active: bool) -> Self {
        let base = base.to_uppercase();
        let quote = quote.to_uppercase();
        Self {
            symbol: format!("{}/{}", base, quote),
            id: id.to_string(),
            base,
            quote,
            active,
        }
    }

    /// Match either the unified symbol or the native id (case-insensitive)
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim();
        self.symbol.eq_ignore_ascii_case(query) || self.id.eq_ignore_ascii_case(query)
    }
}
