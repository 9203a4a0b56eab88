//! MACD (Moving Average Convergence Divergence).
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9
//! Warmup: slow - 1 + signal - 1 bars

use crate::domain::indicator::{
    calculate_ema, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

pub fn calculate_macd(
    bars: &[OhlcvBar],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> IndicatorSeries {
    let indicator_type = IndicatorType::Macd {
        fast,
        slow,
        signal: signal_period,
    };
    if bars.is_empty() || fast == 0 || slow == 0 || signal_period == 0 {
        return IndicatorSeries::empty(indicator_type);
    }

    let ema_fast = ema_raw_values(bars, fast);
    let ema_slow = ema_raw_values(bars, slow);

    let macd_line: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| f - s)
        .collect();

    let k = 2.0 / (signal_period as f64 + 1.0);
    let mut signal_line: Vec<f64> = vec![0.0; bars.len()];
    let macd_warmup = slow - 1;

    if macd_warmup + signal_period <= bars.len() {
        let seed: f64 = macd_line[macd_warmup..macd_warmup + signal_period]
            .iter()
            .sum::<f64>()
            / signal_period as f64;
        let mut signal_ema = seed;
        signal_line[macd_warmup + signal_period - 1] = signal_ema;

        for i in (macd_warmup + signal_period)..bars.len() {
            signal_ema = macd_line[i] * k + signal_ema * (1.0 - k);
            signal_line[i] = signal_ema;
        }
    }

    let signal_warmup = indicator_type.warmup();

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| IndicatorPoint {
            timestamp: bar.timestamp,
            valid: i >= signal_warmup,
            value: IndicatorValue::Macd {
                line: macd_line[i],
                signal: signal_line[i],
                histogram: macd_line[i] - signal_line[i],
            },
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values,
    }
}

/// Extract raw f64 values from the EMA module, using 0.0 for warmup bars.
fn ema_raw_values(bars: &[OhlcvBar], period: usize) -> Vec<f64> {
    calculate_ema(bars, period)
        .values
        .iter()
        .map(|p| p.value.primary())
        .collect()
}
