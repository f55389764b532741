//! Output rendering for tickers and candles
//!
//! Dispatch is a plain `match` over [`OutputFormat`]; each format is a free
//! function producing the full output as a `String`.

use crate::error::{AppError, Result};
use crate::models::{Candle, OutputFormat, Ticker, TickerEntry};
use serde_json::{Map, Value};

const NOT_AVAILABLE: &str = "Not available";
const NO_DATA: &str = "No data available";

const TICKER_CSV_HEADER: [&str; 12] = [
    "symbol",
    "last",
    "bid",
    "ask",
    "high",
    "low",
    "volume",
    "quote_volume",
    "change",
    "percentage",
    "timestamp",
    "datetime",
];

pub fn format_ticker(format: OutputFormat, ticker: &Ticker) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(ticker_table(ticker)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(ticker)?),
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            writer.write_record(TICKER_CSV_HEADER)?;
            writer.write_record(ticker_cells(ticker))?;
            finish_csv(writer)
        }
    }
}

pub fn format_ohlcv(format: OutputFormat, candles: &[Candle]) -> Result<String> {
    match format {
        OutputFormat::Table if candles.is_empty() => Ok(NO_DATA.to_string()),
        OutputFormat::Table => Ok(ohlcv_table(candles)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(candles)?),
        OutputFormat::Csv if candles.is_empty() => Ok(NO_DATA.to_string()),
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            for candle in candles {
                writer.serialize(candle)?;
            }
            finish_csv(writer)
        }
    }
}

pub fn format_multiple_tickers(format: OutputFormat, entries: &[(String, TickerEntry)]) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(multi_ticker_table(entries)),
        OutputFormat::Json => {
            let mut map = Map::new();
            for (symbol, entry) in entries {
                map.insert(symbol.clone(), serde_json::to_value(entry)?);
            }
            Ok(serde_json::to_string_pretty(&Value::Object(map))?)
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            let mut header = TICKER_CSV_HEADER.to_vec();
            header.push("error");
            writer.write_record(&header)?;

            for (symbol, entry) in entries {
                let mut row = match entry {
                    TickerEntry::Data(ticker) => {
                        let mut cells = ticker_cells(ticker);
                        cells.push(String::new());
                        cells
                    }
                    TickerEntry::Failed { error } => {
                        let mut cells = vec![String::new(); header.len()];
                        cells[header.len() - 1] = error.clone();
                        cells
                    }
                };
                // Rows are keyed by the symbol the user asked for
                row[0] = symbol.clone();
                writer.write_record(&row)?;
            }
            finish_csv(writer)
        }
    }
}

/// Format an optional number with `precision` decimals and an optional suffix
pub fn format_number(value: Option<f64>, precision: usize, suffix: &str) -> String {
    match value {
        Some(v) => format!("{:.*}{}", precision, v, suffix),
        None => NOT_AVAILABLE.to_string(),
    }
}

fn price(value: Option<f64>) -> String {
    format_number(value, 8, "")
}

fn volume(value: Option<f64>) -> String {
    format_number(value, 2, "")
}

fn percentage(value: Option<f64>) -> String {
    format_number(value, 2, "%")
}

fn ticker_table(ticker: &Ticker) -> String {
    let mut table = TextTable::new(format!("Ticker Data - {}", ticker.symbol), &["Field", "Value"]);
    table.row(vec!["Symbol".into(), ticker.symbol.clone()]);
    table.row(vec!["Last Price".into(), price(ticker.last)]);
    table.row(vec!["Bid".into(), price(ticker.bid)]);
    table.row(vec!["Ask".into(), price(ticker.ask)]);
    table.row(vec!["High".into(), price(ticker.high)]);
    table.row(vec!["Low".into(), price(ticker.low)]);
    table.row(vec!["Volume".into(), volume(ticker.volume)]);
    table.row(vec!["Quote Volume".into(), volume(ticker.quote_volume)]);
    table.row(vec!["Change".into(), price(ticker.change)]);
    table.row(vec!["Percentage".into(), percentage(ticker.percentage)]);
    table.row(vec![
        "Timestamp".into(),
        ticker.datetime.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string()),
    ]);
    table.render()
}

fn ohlcv_table(candles: &[Candle]) -> String {
    let mut table = TextTable::new(
        format!("OHLCV Data ({} records)", candles.len()),
        &["DateTime", "Open", "High", "Low", "Close", "Volume"],
    );
    for c in candles {
        table.row(vec![
            c.datetime.clone(),
            price(Some(c.open)),
            price(Some(c.high)),
            price(Some(c.low)),
            price(Some(c.close)),
            volume(Some(c.volume)),
        ]);
    }
    table.render()
}

fn multi_ticker_table(entries: &[(String, TickerEntry)]) -> String {
    let mut table = TextTable::new(
        format!("Multiple Tickers ({} symbols)", entries.len()),
        &["Symbol", "Last Price", "Volume", "Change %", "High", "Low"],
    );
    for (symbol, entry) in entries {
        let row = match entry {
            TickerEntry::Data(t) => vec![
                symbol.clone(),
                price(t.last),
                volume(t.volume),
                percentage(t.percentage),
                price(t.high),
                price(t.low),
            ],
            TickerEntry::Failed { .. } => {
                let mut row = vec![symbol.clone(), "ERROR".to_string()];
                row.extend(std::iter::repeat("-".to_string()).take(4));
                row
            }
        };
        table.row(row);
    }
    table.render()
}

fn opt_cell<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn ticker_cells(ticker: &Ticker) -> Vec<String> {
    vec![
        ticker.symbol.clone(),
        opt_cell(ticker.last),
        opt_cell(ticker.bid),
        opt_cell(ticker.ask),
        opt_cell(ticker.high),
        opt_cell(ticker.low),
        opt_cell(ticker.volume),
        opt_cell(ticker.quote_volume),
        opt_cell(ticker.change),
        opt_cell(ticker.percentage),
        opt_cell(ticker.timestamp),
        ticker.datetime.clone().unwrap_or_default(),
    ]
}

fn finish_csv(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Io(format!("Failed to flush CSV output: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::Parse(format!("CSV output is not UTF-8: {}", e)))
}

/// Column-aligned plain text table
struct TextTable {
    title: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TextTable {
    fn new(title: String, headers: &[&str]) -> Self {
        Self {
            title,
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    fn row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    fn render(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if let Some(w) = widths.get_mut(i) {
                    *w = (*w).max(cell.chars().count());
                }
            }
        }

        let separator = widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-");

        let mut out = String::new();
        out.push_str(&self.title);
        out.push('\n');
        out.push_str(&format_row(&self.headers, &widths));
        out.push('\n');
        out.push_str(&separator);
        for row in &self.rows {
            out.push('\n');
            out.push_str(&format_row(row, &widths));
        }
        out
    }
}

fn format_row(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, w)| format!("{:<width$}", cell, width = *w))
        .collect::<Vec<_>>()
        .join(" | ")
        .trim_end()
        .to_string()
}
