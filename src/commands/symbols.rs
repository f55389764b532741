//! Symbol listing command
//!
//! Usage:
//! - All symbols: `crypto-fetcher symbols -e binance`
//! - Search: `crypto-fetcher symbols -e binance --search BTC --limit 20`

use super::{connect, fail, runtime};

pub fn run(exchange: String, search: Option<String>, limit: usize) {
    let rt = runtime();

    rt.block_on(async {
        let fetcher = match connect(Some(&exchange)).await {
            Ok(f) => f,
            Err(e) => fail(&e, &exchange, "symbols list"),
        };

        let (shown, total) = match fetcher.search_symbols(&exchange, search.as_deref(), limit) {
            Ok(found) => found,
            Err(e) => fail(&e, &exchange, "symbols list"),
        };

        match &search {
            Some(query) => println!("🔍 Symbols containing '{}' on {}:", query, exchange),
            None => println!("📋 Available symbols on {}:", exchange),
        }
        for symbol in &shown {
            println!("  • {}", symbol);
        }
        if let Some(more) = remaining_line(shown.len(), total) {
            println!("{}", more);
        }
    });
}

fn remaining_line(shown: usize, total: usize) -> Option<String> {
    (shown < total).then(|| format!("... and {} more symbols", total - shown))
}
