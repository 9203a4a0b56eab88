//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorValue`: Enum for different indicator output shapes
//! - `IndicatorType`: Enum for indicator identity + parameters
//! - `IndicatorSeries`: A time series of indicator values, aligned 1:1 with
//!   the price history it was computed from
//!
//! Points inside the warm-up period are flagged invalid. The valid points
//! always form a suffix of the series, so the latest readings are aligned by
//! trailing position with the latest bars.

pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use ema::calculate_ema;
pub use macd::calculate_macd;
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;

use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDateTime;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub timestamp: NaiveDateTime,
    pub valid: bool,
    pub value: IndicatorValue,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
}

impl IndicatorValue {
    /// The scalar reading; the MACD line for MACD points.
    pub fn primary(&self) -> f64 {
        match self {
            IndicatorValue::Simple(v) => *v,
            IndicatorValue::Macd { line, .. } => *line,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
}

impl IndicatorType {
    /// Number of leading points that are invalid.
    pub fn warmup(&self) -> usize {
        match *self {
            IndicatorType::Sma(n) | IndicatorType::Ema(n) => n.saturating_sub(1),
            IndicatorType::Rsi(n) => n,
            IndicatorType::Macd { slow, signal, .. } => {
                slow.saturating_sub(1) + signal.saturating_sub(1)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub fn empty(indicator_type: IndicatorType) -> Self {
        Self {
            indicator_type,
            values: Vec::new(),
        }
    }

    pub fn valid_count(&self) -> usize {
        self.values.iter().filter(|p| p.valid).count()
    }

    pub fn has_valid(&self) -> bool {
        self.values.iter().any(|p| p.valid)
    }

    /// The newest valid reading.
    pub fn latest(&self) -> Option<IndicatorValue> {
        self.tail(1).map(|t| t[0])
    }

    /// The last `n` readings, oldest first, provided all of them are valid.
    pub fn tail(&self, n: usize) -> Option<Vec<IndicatorValue>> {
        if n == 0 || self.values.len() < n {
            return None;
        }
        let tail = &self.values[self.values.len() - n..];
        if tail.iter().all(|p| p.valid) {
            Some(tail.iter().map(|p| p.value).collect())
        } else {
            None
        }
    }

    /// Scalar values of the valid suffix.
    pub fn valid_values(&self) -> Vec<f64> {
        self.values
            .iter()
            .filter(|p| p.valid)
            .map(|p| p.value.primary())
            .collect()
    }
}

/// Compute any supported indicator over a price history.
pub fn calculate(bars: &[OhlcvBar], indicator_type: IndicatorType) -> IndicatorSeries {
    match indicator_type {
        IndicatorType::Sma(period) => calculate_sma(bars, period),
        IndicatorType::Ema(period) => calculate_ema(bars, period),
        IndicatorType::Rsi(period) => calculate_rsi(bars, period),
        IndicatorType::Macd { fast, slow, signal } => calculate_macd(bars, fast, slow, signal),
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
        }
    }
}
