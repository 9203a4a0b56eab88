//! OHLCV bar representation.

use chrono::{NaiveDate, NaiveDateTime};

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub symbol: String,
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl OhlcvBar {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

/// Mean volume of the trailing `period` bars, current bar included.
///
/// `None` when the history holds fewer than `period` bars or `period` is 0.
pub fn average_volume(bars: &[OhlcvBar], period: usize) -> Option<f64> {
    if period == 0 || bars.len() < period {
        return None;
    }
    let total: u64 = bars[bars.len() - period..].iter().map(|b| b.volume).sum();
    Some(total as f64 / period as f64)
}
