//! Historical OHLCV command
//!
//! Usage:
//! - Latest candles: `crypto-fetcher history -e binance -s BTC/USDT -t 1h -l 2500`
//! - Ending at a time: `crypto-fetcher history -e okx -s BTC/USDT -l 500 -u 2024-01-01`
//!
//! Requests larger than the exchange page limit are paginated and show a
//! progress bar on stderr.

use super::{connect, emit, fail, runtime};
use crate::error::Result;
use crate::models::{FetchCompletion, OhlcvFetch, OutputFormat, ProgressCallback, Timeframe};
use crate::services::formatter::format_ohlcv;
use crate::services::CryptoFetcher;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

#[allow(clippy::too_many_arguments)]
pub fn run(
    exchange: String,
    symbol: String,
    timeframe: Timeframe,
    limit: usize,
    until: Option<i64>,
    format: OutputFormat,
    output: Option<PathBuf>,
) {
    let rt = runtime();

    rt.block_on(async {
        let fetcher = match connect(Some(&exchange)).await {
            Ok(f) => f,
            Err(e) => fail(&e, &exchange, &symbol),
        };

        let result = match fetch(&fetcher, &exchange, &symbol, timeframe, limit, until).await {
            Ok(result) => result,
            Err(e) => fail(&e, &exchange, &symbol),
        };

        if let Some(notice) = partial_notice(&result, limit) {
            eprintln!("{}", notice);
        }

        if let Err(e) = format_ohlcv(format, &result.candles).and_then(|out| emit(&out, output.as_deref())) {
            fail(&e, &exchange, &symbol);
        }
    });
}

async fn fetch(
    fetcher: &CryptoFetcher,
    exchange: &str,
    symbol: &str,
    timeframe: Timeframe,
    limit: usize,
    until: Option<i64>,
) -> Result<OhlcvFetch> {
    let page_limit = fetcher.registry().get(exchange)?.page_limit();

    // Single-page requests finish too fast for a progress bar to be useful
    let bar = (limit > page_limit).then(|| {
        let pb = ProgressBar::new(limit as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} candles")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    });

    let progress: Option<ProgressCallback> = bar.clone().map(|pb| {
        Box::new(move |done: usize, total: usize| {
            pb.set_length(total as u64);
            pb.set_position(done as u64);
        }) as ProgressCallback
    });

    let result = fetcher
        .fetch_ohlcv(exchange, symbol, timeframe, limit, until, progress.as_ref())
        .await;

    if let Some(pb) = bar {
        pb.finish_and_clear();
    }
    result
}

/// Notice printed when fewer candles than requested came back
fn partial_notice(result: &OhlcvFetch, limit: usize) -> Option<String> {
    if !result.is_partial() {
        return None;
    }
    let reason = match result.completion {
        FetchCompletion::Complete => return None,
        FetchCompletion::HistoryExhausted => "exchange history exhausted",
        FetchCompletion::UntilBoundaryReached => "no data at or before the end time",
    };
    Some(format!(
        "⚠️  Only {} of {} candles available ({})",
        result.candles.len(),
        limit,
        reason
    ))
}
