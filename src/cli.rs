use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::commands;
use crate::models::{OutputFormat, Timeframe};
use crate::utils::parse_until;

#[derive(Parser)]
#[command(name = "crypto-fetcher", version)]
#[command(about = "Fetch cryptocurrency tickers and historical OHLCV data", long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch current ticker data for a trading pair
    Ticker {
        /// Exchange name (e.g. binance, bybit, okx)
        #[arg(short, long)]
        exchange: String,
        /// Trading pair symbol (e.g. BTC/USDT)
        #[arg(short, long)]
        symbol: String,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
        /// Save output to file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Keep refreshing until Ctrl+C
        #[arg(short, long)]
        watch: bool,
        /// Seconds between refreshes in watch mode
        #[arg(short, long, default_value_t = 5)]
        interval: u64,
    },
    /// Fetch historical OHLCV data for a trading pair
    History {
        #[arg(short, long)]
        exchange: String,
        #[arg(short, long)]
        symbol: String,
        /// Candle timeframe
        #[arg(short, long, value_enum, default_value_t = Timeframe::Hour1)]
        timeframe: Timeframe,
        /// Number of candles to fetch
        #[arg(short, long, default_value_t = 100, value_parser = parse_limit)]
        limit: usize,
        /// Last candle open time: epoch ms, RFC 3339, "YYYY-MM-DD HH:MM:SS" or "YYYY-MM-DD" (UTC)
        #[arg(short, long, value_parser = parse_until)]
        until: Option<i64>,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Fetch ticker data for multiple trading pairs
    MultiTicker {
        #[arg(short, long)]
        exchange: String,
        /// Comma-separated list of trading pairs
        #[arg(short, long)]
        symbols: String,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List available exchanges
    Exchanges,
    /// List trading symbols on an exchange
    Symbols {
        #[arg(short, long)]
        exchange: String,
        /// Only show symbols containing this text
        #[arg(short, long)]
        search: Option<String>,
        /// Maximum number of symbols to display
        #[arg(short, long, default_value_t = 50)]
        limit: usize,
    },
    /// Check whether a symbol exists on an exchange
    Validate {
        #[arg(short, long)]
        exchange: String,
        #[arg(short, long)]
        symbol: String,
    },
}

fn parse_limit(raw: &str) -> Result<usize, String> {
    match raw.trim().parse::<usize>() {
        Ok(0) => Err("limit must be greater than zero".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(format!("invalid limit '{}': {}", raw, e)),
    }
}

/// Route logs to stderr so stdout carries only command output
///
/// `RUST_LOG` takes precedence over the `-v` count.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

pub fn run() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Ticker {
            exchange,
            symbol,
            format,
            output,
            watch,
            interval,
        } => {
            commands::ticker::run(exchange, symbol, format, output, watch, interval);
        }
        Commands::History {
            exchange,
            symbol,
            timeframe,
            limit,
            until,
            format,
            output,
        } => {
            commands::history::run(exchange, symbol, timeframe, limit, until, format, output);
        }
        Commands::MultiTicker {
            exchange,
            symbols,
            format,
            output,
        } => {
            commands::multi_ticker::run(exchange, symbols, format, output);
        }
        Commands::Exchanges => {
            commands::exchanges::run();
        }
        Commands::Symbols {
            exchange,
            search,
            limit,
        } => {
            commands::symbols::run(exchange, search, limit);
        }
        Commands::Validate { exchange, symbol } => {
            commands::validate::run(exchange, symbol);
        }
    }
}
