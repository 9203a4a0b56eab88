#![allow(dead_code)]

use allocsignal::domain::error::SignalError;
use allocsignal::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
pub use allocsignal::domain::ohlcv::OhlcvBar;
use allocsignal::ports::data_port::DataPort;
use allocsignal::ports::indicator_port::IndicatorPort;
use chrono::{NaiveDate, NaiveDateTime};
use std::cell::RefCell;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, SignalError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(SignalError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date() >= start_date && b.date() <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, SignalError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

/// Serves fixed indicator values, right-aligned with whatever history it is
/// asked about. Records every request.
pub struct MockIndicatorPort {
    series: HashMap<IndicatorType, Vec<IndicatorValue>>,
    pub calls: RefCell<Vec<(String, usize, IndicatorType)>>,
}

impl MockIndicatorPort {
    pub fn new() -> Self {
        Self {
            series: HashMap::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn with_simple(mut self, indicator: IndicatorType, values: &[f64]) -> Self {
        self.series.insert(
            indicator,
            values.iter().map(|&v| IndicatorValue::Simple(v)).collect(),
        );
        self
    }

    pub fn with_macd(mut self, indicator: IndicatorType, lines: &[f64], signals: &[f64]) -> Self {
        let values = lines
            .iter()
            .zip(signals)
            .map(|(&line, &signal)| IndicatorValue::Macd {
                line,
                signal,
                histogram: line - signal,
            })
            .collect();
        self.series.insert(indicator, values);
        self
    }
}

impl IndicatorPort for MockIndicatorPort {
    fn compute(
        &self,
        symbol: &str,
        history: &[OhlcvBar],
        indicator: IndicatorType,
    ) -> Option<IndicatorSeries> {
        self.calls
            .borrow_mut()
            .push((symbol.to_string(), history.len(), indicator));

        let canned = self.series.get(&indicator)?;
        if canned.is_empty() || history.is_empty() {
            return None;
        }
        let offset = history.len().saturating_sub(canned.len());
        let skipped = canned.len().saturating_sub(history.len());
        let values = history
            .iter()
            .enumerate()
            .map(|(i, bar)| {
                let valid = i >= offset;
                IndicatorPoint {
                    timestamp: bar.timestamp,
                    valid,
                    value: if valid {
                        canned[skipped + i - offset]
                    } else {
                        IndicatorValue::Simple(0.0)
                    },
                }
            })
            .collect();
        Some(IndicatorSeries {
            indicator_type: indicator,
            values,
        })
    }
}

pub fn ts(date: &str) -> NaiveDateTime {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(symbol: &str, date: &str, close: f64) -> OhlcvBar {
    OhlcvBar {
        symbol: symbol.to_string(),
        timestamp: ts(date),
        open: close - 1.0,
        high: close + 1.0,
        low: close - 2.0,
        close,
        volume: 1000,
    }
}

/// `count` daily bars with closes rising by 1 from `start_price`.
pub fn generate_bars(symbol: &str, start_date: &str, count: usize, start_price: f64) -> Vec<OhlcvBar> {
    let start = ts(start_date);
    (0..count)
        .map(|i| OhlcvBar {
            symbol: symbol.to_string(),
            timestamp: start + chrono::Duration::days(i as i64),
            open: start_price + i as f64,
            high: start_price + i as f64 + 1.0,
            low: start_price + i as f64 - 1.0,
            close: start_price + i as f64,
            volume: 1000,
        })
        .collect()
}

/// Daily bars with the given closes and volumes.
pub fn bars_with(symbol: &str, closes: &[f64], volumes: &[u64]) -> Vec<OhlcvBar> {
    let start = ts("2024-01-01");
    closes
        .iter()
        .zip(volumes)
        .enumerate()
        .map(|(i, (&close, &volume))| OhlcvBar {
            symbol: symbol.to_string(),
            timestamp: start + chrono::Duration::days(i as i64),
            open: close,
            high: close,
            low: close,
            close,
            volume,
        })
        .collect()
}

pub fn histories(entries: Vec<(&str, Vec<OhlcvBar>)>) -> HashMap<String, Vec<OhlcvBar>> {
    entries
        .into_iter()
        .map(|(symbol, bars)| (symbol.to_string(), bars))
        .collect()
}
