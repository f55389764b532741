use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Exchange '{name}' is not available")]
    UnknownExchange { name: String, available: Vec<String> },

    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Authentication required: {0}")]
    Authentication(String),

    #[error("Restricted location: {0}")]
    GeoRestricted(String),

    #[error("Exchange temporarily unavailable: {0}")]
    Maintenance(String),

    #[error("Exchange error: {0}")]
    Exchange(String),

    #[error("Failed to fetch {symbol} on {exchange}: {source}")]
    Fetch {
        exchange: String,
        symbol: String,
        #[source]
        source: Box<AppError>,
    },
}

/// Coarse classification used when presenting errors to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    SymbolNotFound,
    RateLimit,
    Authentication,
    GeoRestricted,
    Maintenance,
    UnknownExchange,
    Other,
}

impl AppError {
    /// Wrap an error with the exchange and symbol it occurred for
    pub fn fetch_context(self, exchange: &str, symbol: &str) -> Self {
        AppError::Fetch {
            exchange: exchange.to_string(),
            symbol: symbol.to_string(),
            source: Box::new(self),
        }
    }

    /// Innermost error, skipping `Fetch` context layers
    pub fn root_cause(&self) -> &AppError {
        match self {
            AppError::Fetch { source, .. } => source.root_cause(),
            other => other,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self.root_cause() {
            AppError::Network(_) => ErrorCategory::Network,
            AppError::InvalidSymbol(_) => ErrorCategory::SymbolNotFound,
            AppError::RateLimit(_) => ErrorCategory::RateLimit,
            AppError::Authentication(_) => ErrorCategory::Authentication,
            AppError::GeoRestricted(_) => ErrorCategory::GeoRestricted,
            AppError::Maintenance(_) => ErrorCategory::Maintenance,
            AppError::UnknownExchange { .. } => ErrorCategory::UnknownExchange,
            _ => ErrorCategory::Other,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Io(format!("CSV error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Parse(format!("JSON error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
