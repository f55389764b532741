//! Multi-ticker command
//!
//! Usage: `crypto-fetcher multi-ticker -e binance -s BTC/USDT,ETH/USDT,SOL/USDT`

use super::{connect, emit, fail, runtime};
use crate::models::OutputFormat;
use crate::services::formatter::format_multiple_tickers;
use std::path::PathBuf;

pub fn run(exchange: String, symbols: String, format: OutputFormat, output: Option<PathBuf>) {
    let symbol_list = parse_symbol_list(&symbols);
    let subject = format!("multiple symbols: {}", symbol_list.join(", "));

    let rt = runtime();

    rt.block_on(async {
        let fetcher = match connect(Some(&exchange)).await {
            Ok(f) => f,
            Err(e) => fail(&e, &exchange, &subject),
        };

        let result = fetcher
            .fetch_multiple_tickers(&exchange, &symbol_list)
            .await
            .and_then(|entries| format_multiple_tickers(format, &entries))
            .and_then(|out| emit(&out, output.as_deref()));

        if let Err(e) = result {
            fail(&e, &exchange, &subject);
        }
    });
}

/// Split a comma-separated symbol list, dropping blanks
pub fn parse_symbol_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}
