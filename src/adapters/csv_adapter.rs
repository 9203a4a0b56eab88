//! CSV file data adapter.
//!
//! One file per instrument, `<base>/<SYMBOL>.csv`, with the header
//! `date,open,high,low,close,volume`. File names match symbols
//! case-insensitively, so `aapl.csv` serves `AAPL`.

use crate::domain::error::SignalError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        let exact = self.base_path.join(format!("{}.csv", symbol));
        if exact.is_file() {
            return exact;
        }
        fs::read_dir(&self.base_path)
            .into_iter()
            .flatten()
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .find(|path| {
                path.is_file()
                    && path
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
                    && path
                        .file_stem()
                        .and_then(|stem| stem.to_str())
                        .is_some_and(|stem| stem.eq_ignore_ascii_case(symbol))
            })
            .unwrap_or(exact)
    }
}

/// Accepts `YYYY-MM-DD` (midnight) or `YYYY-MM-DD HH:MM:SS`.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn field<T: FromStr>(
    record: &StringRecord,
    index: usize,
    name: &str,
    line: u64,
) -> Result<T, SignalError>
where
    T::Err: std::fmt::Display,
{
    let raw = record.get(index).ok_or_else(|| SignalError::Data {
        reason: format!("line {}: missing {} column", line, name),
    })?;
    raw.trim().parse().map_err(|e| SignalError::Data {
        reason: format!("line {}: invalid {} value '{}': {}", line, name, raw, e),
    })
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, SignalError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| SignalError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result?;
            let line = record.position().map_or(0, |p| p.line());

            let raw_date = record.get(0).ok_or_else(|| SignalError::Data {
                reason: format!("line {}: missing date column", line),
            })?;
            let timestamp = parse_timestamp(raw_date).ok_or_else(|| SignalError::Data {
                reason: format!("line {}: invalid date '{}'", line, raw_date),
            })?;

            let date = timestamp.date();
            if date < start_date || date > end_date {
                continue;
            }

            bars.push(OhlcvBar {
                symbol: symbol.to_string(),
                timestamp,
                open: field(&record, 1, "open", line)?,
                high: field(&record, 2, "high", line)?,
                low: field(&record, 3, "low", line)?,
                close: field(&record, 4, "close", line)?,
                volume: field(&record, 5, "volume", line)?,
            });
        }

        bars.sort_by_key(|b| b.timestamp);
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, SignalError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| SignalError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let name = entry?.file_name();
            let name = name.to_string_lossy();
            if let Some(symbol) = name.strip_suffix(".csv") {
                if !symbol.is_empty() {
                    symbols.push(symbol.to_string());
                }
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
