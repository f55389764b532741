//! CLI command implementations
//!
//! Each command exposes a blocking `run(...)` that builds its own tokio runtime,
//! prints to stdout and exits the process with status 1 on failure.

pub mod exchanges;
pub mod history;
pub mod multi_ticker;
pub mod symbols;
pub mod ticker;
pub mod validate;

use crate::error::{AppError, ErrorCategory, Result};
use crate::models::FetcherConfig;
use crate::services::CryptoFetcher;
use std::path::Path;

/// Create the runtime a command runs on, exiting if that is impossible
pub(crate) fn runtime() -> tokio::runtime::Runtime {
    match tokio::runtime::Runtime::new() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("❌ Failed to create async runtime: {}", e);
            std::process::exit(1);
        }
    }
}

/// Initialize the exchanges needed for a command
///
/// A configured exchange is initialized alone. Anything else initializes the
/// full configured set so the "not available" message can list alternatives.
pub(crate) async fn connect(exchange: Option<&str>) -> Result<CryptoFetcher> {
    let mut config = FetcherConfig::from_env();
    if let Some(exchange) = exchange {
        let exchange = exchange.to_lowercase();
        if config.exchanges.contains(&exchange) {
            config = config.only(&exchange);
        }
    }
    CryptoFetcher::from_config(&config).await
}

pub(crate) fn write_output(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content)
        .map_err(|e| AppError::Io(format!("Failed to write {}: {}", path.display(), e)))
}

/// Print the rendered output and optionally save it to a file
pub(crate) fn emit(content: &str, output: Option<&Path>) -> Result<()> {
    println!("{}", content);
    if let Some(path) = output {
        write_output(path, content)?;
        println!("💾 Data saved to {}", path.display());
    }
    Ok(())
}

/// Headline and hint shown for an error
pub(crate) fn describe_error(err: &AppError, exchange: &str, subject: &str) -> (String, String) {
    let base = subject.split('/').next().unwrap_or(subject);
    match err.category() {
        ErrorCategory::Network => (
            "🌐 Network Error".to_string(),
            "💡 Check your internet connection and try again".to_string(),
        ),
        ErrorCategory::SymbolNotFound => (
            format!("❌ Symbol '{}' not found on {}", subject, exchange),
            format!(
                "💡 Try: crypto-fetcher symbols --exchange {} --search {}",
                exchange, base
            ),
        ),
        ErrorCategory::RateLimit => (
            "⏱️  Rate Limit Exceeded".to_string(),
            "💡 Please wait a moment and try again".to_string(),
        ),
        ErrorCategory::Authentication => (
            "🔐 Authentication Error".to_string(),
            "💡 This exchange may require API credentials".to_string(),
        ),
        ErrorCategory::GeoRestricted => (
            "🌍 Geographic Restriction".to_string(),
            "💡 This exchange is not available in your region".to_string(),
        ),
        ErrorCategory::Maintenance => (
            "🔧 Service Maintenance".to_string(),
            "💡 The exchange is temporarily unavailable. Please try later.".to_string(),
        ),
        ErrorCategory::UnknownExchange => {
            let available = match err.root_cause() {
                AppError::UnknownExchange { available, .. } => available.join(", "),
                _ => String::new(),
            };
            (
                format!("❌ Exchange '{}' is not available.", exchange),
                format!("Available exchanges: {}", available),
            )
        }
        ErrorCategory::Other => (
            format!("❌ Error: {}", err),
            "💡 Try a different exchange or symbol".to_string(),
        ),
    }
}

pub(crate) fn print_error(err: &AppError, exchange: &str, subject: &str) {
    let (headline, hint) = describe_error(err, exchange, subject);
    eprintln!("{}", headline);
    eprintln!("{}", hint);
}

/// Print a friendly error and exit with status 1
pub(crate) fn fail(err: &AppError, exchange: &str, subject: &str) -> ! {
    print_error(err, exchange, subject);
    std::process::exit(1);
}
