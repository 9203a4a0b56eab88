//! RSI (Relative Strength Index).
//!
//! Uses Wilder's smoothing for average gain/loss calculation:
//! - First average: simple mean of gains/losses over first n changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! Warmup: first n bars are invalid (need n price changes to compute initial average).

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_rsi(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let invalid = |bar: &OhlcvBar| IndicatorPoint {
        timestamp: bar.timestamp,
        valid: false,
        value: IndicatorValue::Simple(0.0),
    };

    if period == 0 || bars.len() < 2 {
        return IndicatorSeries {
            indicator_type: IndicatorType::Rsi(period),
            values: bars.iter().map(invalid).collect(),
        };
    }

    let mut values = Vec::with_capacity(bars.len());
    values.push(invalid(&bars[0]));

    let mut gains: Vec<f64> = Vec::with_capacity(bars.len() - 1);
    let mut losses: Vec<f64> = Vec::with_capacity(bars.len() - 1);
    for pair in bars.windows(2) {
        let change = pair[1].close - pair[0].close;
        gains.push(change.max(0.0));
        losses.push((-change).max(0.0));
    }

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;

    for (i, bar) in bars.iter().enumerate().skip(1) {
        let change_idx = i - 1;

        if change_idx + 1 < period {
            values.push(invalid(bar));
            continue;
        }

        if change_idx + 1 == period {
            avg_gain = gains[..period].iter().sum::<f64>() / period as f64;
            avg_loss = losses[..period].iter().sum::<f64>() / period as f64;
        } else {
            avg_gain = (avg_gain * (period - 1) as f64 + gains[change_idx]) / period as f64;
            avg_loss = (avg_loss * (period - 1) as f64 + losses[change_idx]) / period as f64;
        }

        values.push(IndicatorPoint {
            timestamp: bar.timestamp,
            valid: true,
            value: IndicatorValue::Simple(rsi_from_averages(avg_gain, avg_loss)),
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}
