//! Exponential Moving Average.
//!
//! k = 2/(n+1), seed with the SMA of the first n closes, then
//! EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_ema(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    if period == 0 || bars.is_empty() {
        return IndicatorSeries::empty(IndicatorType::Ema(period));
    }

    let mut values = Vec::with_capacity(bars.len());
    let k = 2.0 / (period as f64 + 1.0);
    let mut ema = 0.0;
    let mut sum = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        if i < period - 1 {
            sum += bar.close;
            values.push(IndicatorPoint {
                timestamp: bar.timestamp,
                valid: false,
                value: IndicatorValue::Simple(0.0),
            });
        } else if i == period - 1 {
            sum += bar.close;
            ema = sum / period as f64;
            values.push(IndicatorPoint {
                timestamp: bar.timestamp,
                valid: true,
                value: IndicatorValue::Simple(ema),
            });
        } else {
            ema = bar.close * k + ema * (1.0 - k);
            values.push(IndicatorPoint {
                timestamp: bar.timestamp,
                valid: true,
                value: IndicatorValue::Simple(ema),
            });
        }
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Ema(period),
        values,
    }
}
