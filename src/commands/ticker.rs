//! Ticker command
//!
//! Usage:
//! - One-shot: `crypto-fetcher ticker -e binance -s BTC/USDT`
//! - Watch mode: `crypto-fetcher ticker -e binance -s BTC/USDT --watch --interval 5`

use super::{connect, emit, fail, print_error, runtime, write_output};
use crate::models::OutputFormat;
use crate::services::formatter::format_ticker;
use crate::services::CryptoFetcher;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub fn run(
    exchange: String,
    symbol: String,
    format: OutputFormat,
    output: Option<PathBuf>,
    watch: bool,
    interval: u64,
) {
    let rt = runtime();

    rt.block_on(async {
        let fetcher = match connect(Some(&exchange)).await {
            Ok(f) => f,
            Err(e) => fail(&e, &exchange, &symbol),
        };
        if let Err(e) = fetcher.registry().get(&exchange) {
            fail(&e, &exchange, &symbol);
        }

        if watch {
            watch_ticker(&fetcher, &exchange, &symbol, format, output.as_deref(), interval).await;
            return;
        }

        let result = match fetcher.fetch_ticker(&exchange, &symbol).await {
            Ok(ticker) => format_ticker(format, &ticker),
            Err(e) => Err(e),
        };
        if let Err(e) = result.and_then(|out| emit(&out, output.as_deref())) {
            fail(&e, &exchange, &symbol);
        }
    });
}

/// Refresh the ticker every `interval` seconds until Ctrl+C
async fn watch_ticker(
    fetcher: &CryptoFetcher,
    exchange: &str,
    symbol: &str,
    format: OutputFormat,
    output: Option<&Path>,
    interval: u64,
) {
    let period = Duration::from_secs(interval.max(1));
    println!("👀 Watching {} on {} (updating every {}s)", symbol, exchange, period.as_secs());
    println!("Press Ctrl+C to stop");

    loop {
        let rendered = match fetcher.fetch_ticker(exchange, symbol).await {
            Ok(ticker) => format_ticker(format, &ticker),
            Err(e) => Err(e),
        };

        match rendered {
            Ok(out) => {
                // Clear screen and move the cursor home
                print!("\x1B[2J\x1B[H");
                println!("🚀 Crypto Fetcher - {} on {}", symbol, exchange);
                println!("Last updated: {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
                println!("{}", out);

                if let Some(path) = output {
                    if let Err(e) = write_output(path, &out) {
                        print_error(&e, exchange, symbol);
                    }
                }
            }
            Err(e) => print_error(&e, exchange, symbol),
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("\n⏹️  Stopped watching");
                break;
            }
            _ = tokio::time::sleep(period) => {}
        }
    }
}
