//! Rule evaluation for a single instrument.
//!
//! # Evaluation Semantics
//!
//! - History shorter than `Rule::min_history`, or an indicator with no valid
//!   reading, yields `Signal::InsufficientData` and a flat allocation.
//! - Entry is tested before exit; at most one of them fires per call.
//! - When neither fires the allocation is the per-call default, flat. No
//!   previous allocation is consulted.

use crate::domain::allocation::{FLAT, INVESTED};
use crate::domain::crossover::{Cross, CrossMode, CrossSample};
use crate::domain::indicator::{IndicatorType, IndicatorValue};
use crate::domain::ohlcv::{average_volume, OhlcvBar};
use crate::domain::rule::{MacdCrossover, Rule, SmaVolume, TrendMomentum};
use crate::ports::indicator_port::IndicatorPort;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Entry,
    Exit,
    None,
    InsufficientData,
}

impl Signal {
    pub fn allocation(&self) -> f64 {
        match self {
            Signal::Entry => INVESTED,
            Signal::Exit | Signal::None | Signal::InsufficientData => FLAT,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Entry => "entry",
            Signal::Exit => "exit",
            Signal::None => "none",
            Signal::InsufficientData => "insufficient_data",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named value the rule looked at.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub label: String,
    pub value: f64,
}

impl Reading {
    fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Outcome of one rule for one instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub symbol: String,
    pub signal: Signal,
    pub allocation: f64,
    pub close: Option<f64>,
    pub readings: Vec<Reading>,
}

impl Evaluation {
    fn new(symbol: &str, signal: Signal, close: Option<f64>, readings: Vec<Reading>) -> Self {
        Self {
            symbol: symbol.to_string(),
            signal,
            allocation: signal.allocation(),
            close,
            readings,
        }
    }

    fn insufficient(symbol: &str, history: &[OhlcvBar]) -> Self {
        Self::new(
            symbol,
            Signal::InsufficientData,
            history.last().map(|b| b.close),
            vec![Reading::new("bars", history.len() as f64)],
        )
    }

    pub fn reading(&self, label: &str) -> Option<f64> {
        self.readings
            .iter()
            .find(|r| r.label == label)
            .map(|r| r.value)
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)?;
        if let Some(close) = self.close {
            write!(f, " price: {}", close)?;
        }
        for r in &self.readings {
            write!(f, ", {}: {}", r.label, r.value)?;
        }
        write!(f, ", signal: {}, allocation: {}", self.signal, self.allocation)
    }
}

pub fn evaluate(
    rule: &Rule,
    symbol: &str,
    history: &[OhlcvBar],
    indicators: &dyn IndicatorPort,
) -> Evaluation {
    if history.len() < rule.min_history() {
        return Evaluation::insufficient(symbol, history);
    }

    match rule {
        Rule::TrendMomentum(p) => evaluate_trend(p, symbol, history, indicators),
        Rule::MacdCrossover(p) => evaluate_macd(p, symbol, history, indicators),
        Rule::SmaVolume(p) => evaluate_sma_volume(p, symbol, history, indicators),
    }
}

fn latest_simple(
    indicators: &dyn IndicatorPort,
    symbol: &str,
    history: &[OhlcvBar],
    indicator: IndicatorType,
) -> Option<f64> {
    indicators
        .compute(symbol, history, indicator)?
        .latest()
        .map(|v| v.primary())
}

/// Previous and current scalar readings, aligned on the newest bar.
fn last_two_simple(
    indicators: &dyn IndicatorPort,
    symbol: &str,
    history: &[OhlcvBar],
    indicator: IndicatorType,
) -> Option<(f64, f64)> {
    let tail = indicators.compute(symbol, history, indicator)?.tail(2)?;
    Some((tail[0].primary(), tail[1].primary()))
}

fn evaluate_trend(
    p: &TrendMomentum,
    symbol: &str,
    history: &[OhlcvBar],
    indicators: &dyn IndicatorPort,
) -> Evaluation {
    let ema_type = IndicatorType::Ema(p.ema_length);
    let rsi_type = IndicatorType::Rsi(p.rsi_length);

    let ema = latest_simple(indicators, symbol, history, ema_type);
    let rsi = latest_simple(indicators, symbol, history, rsi_type);
    let (Some(ema), Some(rsi)) = (ema, rsi) else {
        return Evaluation::insufficient(symbol, history);
    };

    // min_history guarantees at least one bar
    let close = history[history.len() - 1].close;

    let signal = if close > ema && rsi > p.oversold {
        Signal::Entry
    } else if close < ema || rsi > p.overbought {
        Signal::Exit
    } else {
        Signal::None
    };

    Evaluation::new(
        symbol,
        signal,
        Some(close),
        vec![
            Reading::new(ema_type.to_string(), ema),
            Reading::new(rsi_type.to_string(), rsi),
        ],
    )
}

fn evaluate_macd(
    p: &MacdCrossover,
    symbol: &str,
    history: &[OhlcvBar],
    indicators: &dyn IndicatorPort,
) -> Evaluation {
    let macd_type = IndicatorType::Macd {
        fast: p.fast,
        slow: p.slow,
        signal: p.signal,
    };
    let Some(tail) = indicators
        .compute(symbol, history, macd_type)
        .and_then(|series| series.tail(2))
    else {
        return Evaluation::insufficient(symbol, history);
    };

    let (
        IndicatorValue::Macd {
            line: prev_line,
            signal: prev_signal,
            ..
        },
        IndicatorValue::Macd {
            line: cur_line,
            signal: cur_signal,
            ..
        },
    ) = (tail[0], tail[1])
    else {
        return Evaluation::insufficient(symbol, history);
    };

    let sample = CrossSample {
        prev_left: prev_line,
        prev_right: prev_signal,
        cur_left: cur_line,
        cur_right: cur_signal,
    };
    let signal = match Cross::detect(sample, CrossMode::Strict) {
        Some(Cross::Above) => Signal::Entry,
        Some(Cross::Below) => Signal::Exit,
        None => Signal::None,
    };

    Evaluation::new(
        symbol,
        signal,
        history.last().map(|b| b.close),
        vec![
            Reading::new("macd", cur_line),
            Reading::new("macd_signal", cur_signal),
            Reading::new("prev_macd", prev_line),
            Reading::new("prev_macd_signal", prev_signal),
        ],
    )
}

fn evaluate_sma_volume(
    p: &SmaVolume,
    symbol: &str,
    history: &[OhlcvBar],
    indicators: &dyn IndicatorPort,
) -> Evaluation {
    let short_type = IndicatorType::Sma(p.short_period);
    let long_type = IndicatorType::Sma(p.long_period);

    let short = last_two_simple(indicators, symbol, history, short_type);
    let long = last_two_simple(indicators, symbol, history, long_type);
    let avg_volume = average_volume(history, p.volume_period);
    let (Some((prev_short, cur_short)), Some((prev_long, cur_long)), Some(avg_volume)) =
        (short, long, avg_volume)
    else {
        return Evaluation::insufficient(symbol, history);
    };

    let current = &history[history.len() - 1];
    let current_volume = current.volume as f64;

    let sample = CrossSample {
        prev_left: prev_short,
        prev_right: prev_long,
        cur_left: cur_short,
        cur_right: cur_long,
    };
    let signal = match Cross::detect(sample, CrossMode::Touching) {
        Some(Cross::Above) if current_volume > p.volume_multiplier * avg_volume => Signal::Entry,
        Some(Cross::Above) => Signal::None,
        Some(Cross::Below) => Signal::Exit,
        None => Signal::None,
    };

    Evaluation::new(
        symbol,
        signal,
        Some(current.close),
        vec![
            Reading::new(short_type.to_string(), cur_short),
            Reading::new(long_type.to_string(), cur_long),
            Reading::new("volume", current_volume),
            Reading::new("avg_volume", avg_volume),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::{IndicatorPoint, IndicatorSeries};
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use std::collections::HashMap;

    /// Serves canned series, right-aligned with the history it is asked about.
    struct CannedIndicators {
        series: HashMap<IndicatorType, Vec<IndicatorValue>>,
    }

    impl CannedIndicators {
        fn new() -> Self {
            Self {
                series: HashMap::new(),
            }
        }

        fn simple(mut self, indicator: IndicatorType, values: &[f64]) -> Self {
            self.series.insert(
                indicator,
                values.iter().map(|&v| IndicatorValue::Simple(v)).collect(),
            );
            self
        }

        fn macd(mut self, indicator: IndicatorType, lines: &[f64], signals: &[f64]) -> Self {
            self.series.insert(
                indicator,
                lines
                    .iter()
                    .zip(signals)
                    .map(|(&line, &signal)| IndicatorValue::Macd {
                        line,
                        signal,
                        histogram: line - signal,
                    })
                    .collect(),
            );
            self
        }
    }

    impl IndicatorPort for CannedIndicators {
        fn compute(
            &self,
            _symbol: &str,
            history: &[OhlcvBar],
            indicator: IndicatorType,
        ) -> Option<IndicatorSeries> {
            let values = self.series.get(&indicator)?;
            if values.is_empty() || values.len() > history.len() {
                return None;
            }
            let offset = history.len() - values.len();
            let points = history
                .iter()
                .enumerate()
                .map(|(i, bar)| IndicatorPoint {
                    timestamp: bar.timestamp,
                    valid: i >= offset,
                    value: if i >= offset {
                        values[i - offset]
                    } else {
                        IndicatorValue::Simple(0.0)
                    },
                })
                .collect();
            Some(IndicatorSeries {
                indicator_type: indicator,
                values: points,
            })
        }
    }

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn history(count: usize, last_close: f64, volumes: &[u64]) -> Vec<OhlcvBar> {
        (0..count)
            .map(|i| {
                let close = if i + 1 == count { last_close } else { 100.0 };
                let volume = volumes.get(i).copied().unwrap_or(1000);
                OhlcvBar {
                    symbol: "AAPL".into(),
                    timestamp: start() + Duration::days(i as i64),
                    open: close,
                    high: close,
                    low: close,
                    close,
                    volume,
                }
            })
            .collect()
    }

    fn trend() -> Rule {
        Rule::TrendMomentum(TrendMomentum::default())
    }

    fn trend_port(ema: f64, rsi: f64) -> CannedIndicators {
        CannedIndicators::new()
            .simple(IndicatorType::Ema(14), &[ema])
            .simple(IndicatorType::Rsi(14), &[rsi])
    }

    #[test]
    fn trend_entry_above_ema_not_oversold() {
        let eval = evaluate(&trend(), "AAPL", &history(20, 150.0, &[]), &trend_port(145.0, 45.0));
        assert_eq!(eval.signal, Signal::Entry);
        assert_eq!(eval.allocation, 1.0);
        assert_eq!(eval.close, Some(150.0));
        assert_eq!(eval.reading("EMA(14)"), Some(145.0));
        assert_eq!(eval.reading("RSI(14)"), Some(45.0));
    }

    #[test]
    fn trend_exit_below_ema() {
        let eval = evaluate(&trend(), "AAPL", &history(20, 140.0, &[]), &trend_port(145.0, 45.0));
        assert_eq!(eval.signal, Signal::Exit);
        assert_eq!(eval.allocation, 0.0);
    }

    #[test]
    fn trend_entry_takes_precedence_over_overbought() {
        let eval = evaluate(&trend(), "AAPL", &history(20, 150.0, &[]), &trend_port(145.0, 80.0));
        assert_eq!(eval.signal, Signal::Entry);
    }

    #[test]
    fn trend_oversold_above_ema_is_no_signal() {
        let eval = evaluate(&trend(), "AAPL", &history(20, 150.0, &[]), &trend_port(145.0, 25.0));
        assert_eq!(eval.signal, Signal::None);
        assert_eq!(eval.allocation, 0.0);
    }

    #[test]
    fn trend_price_at_ema_overbought_exits() {
        let eval = evaluate(&trend(), "AAPL", &history(20, 145.0, &[]), &trend_port(145.0, 75.0));
        assert_eq!(eval.signal, Signal::Exit);
    }

    #[test]
    fn trend_short_history_is_insufficient() {
        let eval = evaluate(&trend(), "AAPL", &history(14, 150.0, &[]), &trend_port(145.0, 45.0));
        assert_eq!(eval.signal, Signal::InsufficientData);
        assert_eq!(eval.allocation, 0.0);
        assert_eq!(eval.reading("bars"), Some(14.0));
    }

    #[test]
    fn trend_exact_minimum_produces_decision() {
        let eval = evaluate(&trend(), "AAPL", &history(15, 150.0, &[]), &trend_port(145.0, 45.0));
        assert_eq!(eval.signal, Signal::Entry);
    }

    #[test]
    fn trend_missing_indicator_is_insufficient() {
        let port = CannedIndicators::new().simple(IndicatorType::Ema(14), &[145.0]);
        let eval = evaluate(&trend(), "AAPL", &history(20, 150.0, &[]), &port);
        assert_eq!(eval.signal, Signal::InsufficientData);
    }

    fn macd_type() -> IndicatorType {
        IndicatorType::Macd {
            fast: 12,
            slow: 26,
            signal: 9,
        }
    }

    fn macd() -> Rule {
        Rule::MacdCrossover(MacdCrossover::default())
    }

    #[test]
    fn macd_bullish_cross_enters() {
        let port = CannedIndicators::new().macd(macd_type(), &[-0.8, -0.5, 0.3], &[-0.1, -0.2, 0.1]);
        let eval = evaluate(&macd(), "QQQ", &history(40, 100.0, &[]), &port);
        assert_eq!(eval.signal, Signal::Entry);
        assert_eq!(eval.allocation, 1.0);
        assert_eq!(eval.reading("prev_macd"), Some(-0.5));
        assert_eq!(eval.reading("macd_signal"), Some(0.1));
    }

    #[test]
    fn macd_bearish_cross_exits() {
        let port = CannedIndicators::new().macd(macd_type(), &[0.3, -0.5], &[0.1, -0.2]);
        let eval = evaluate(&macd(), "QQQ", &history(40, 100.0, &[]), &port);
        assert_eq!(eval.signal, Signal::Exit);
        assert_eq!(eval.allocation, 0.0);
    }

    #[test]
    fn macd_staying_above_is_no_signal() {
        let port = CannedIndicators::new().macd(macd_type(), &[0.3, 0.5], &[0.1, 0.2]);
        let eval = evaluate(&macd(), "QQQ", &history(40, 100.0, &[]), &port);
        assert_eq!(eval.signal, Signal::None);
        assert_eq!(eval.allocation, 0.0);
    }

    #[test]
    fn macd_touching_previous_is_not_a_cross() {
        let port = CannedIndicators::new().macd(macd_type(), &[0.1, 0.3], &[0.1, 0.2]);
        let eval = evaluate(&macd(), "QQQ", &history(40, 100.0, &[]), &port);
        assert_eq!(eval.signal, Signal::None);
    }

    #[test]
    fn macd_single_reading_is_insufficient() {
        let port = CannedIndicators::new().macd(macd_type(), &[0.3], &[0.1]);
        let eval = evaluate(&macd(), "QQQ", &history(40, 100.0, &[]), &port);
        assert_eq!(eval.signal, Signal::InsufficientData);
    }

    #[test]
    fn macd_no_series_is_insufficient() {
        let eval = evaluate(&macd(), "QQQ", &history(40, 100.0, &[]), &CannedIndicators::new());
        assert_eq!(eval.signal, Signal::InsufficientData);
        assert_eq!(eval.allocation, 0.0);
    }

    fn sma() -> Rule {
        Rule::SmaVolume(SmaVolume::default())
    }

    fn sma_port(short: &[f64], long: &[f64]) -> CannedIndicators {
        CannedIndicators::new()
            .simple(IndicatorType::Sma(10), short)
            .simple(IndicatorType::Sma(30), long)
    }

    fn volumes_with_last(last: u64) -> Vec<u64> {
        let mut v = vec![1000; 39];
        v.push(last);
        v
    }

    #[test]
    fn sma_cross_with_volume_surge_enters() {
        // avg over last 20 = (19 * 1000 + 3000) / 20 = 1100; 3000 > 1650
        let bars = history(40, 100.0, &volumes_with_last(3000));
        let eval = evaluate(&sma(), "AAPL", &bars, &sma_port(&[99.0, 101.0], &[100.0, 100.5]));
        assert_eq!(eval.signal, Signal::Entry);
        assert_eq!(eval.allocation, 1.0);
        assert_eq!(eval.reading("avg_volume"), Some(1100.0));
    }

    #[test]
    fn sma_cross_without_volume_stays_flat() {
        // avg = (19 * 1000 + 1200) / 20 = 1010; 1200 < 1515
        let bars = history(40, 100.0, &volumes_with_last(1200));
        let eval = evaluate(&sma(), "AAPL", &bars, &sma_port(&[99.0, 101.0], &[100.0, 100.5]));
        assert_eq!(eval.signal, Signal::None);
        assert_eq!(eval.allocation, 0.0);
    }

    #[test]
    fn sma_cross_from_touching_counts() {
        let bars = history(40, 100.0, &volumes_with_last(3000));
        let eval = evaluate(&sma(), "AAPL", &bars, &sma_port(&[100.0, 101.0], &[100.0, 100.5]));
        assert_eq!(eval.signal, Signal::Entry);
    }

    #[test]
    fn sma_cross_below_exits() {
        let bars = history(40, 100.0, &[]);
        let eval = evaluate(&sma(), "AAPL", &bars, &sma_port(&[101.0, 99.0], &[100.0, 100.0]));
        assert_eq!(eval.signal, Signal::Exit);
    }

    #[test]
    fn sma_short_history_is_insufficient() {
        let bars = history(19, 100.0, &[]);
        let eval = evaluate(&sma(), "AAPL", &bars, &sma_port(&[99.0, 101.0], &[100.0, 100.5]));
        assert_eq!(eval.signal, Signal::InsufficientData);
    }

    #[test]
    fn sma_single_long_reading_is_insufficient() {
        let bars = history(40, 100.0, &volumes_with_last(3000));
        let eval = evaluate(&sma(), "AAPL", &bars, &sma_port(&[99.0, 101.0], &[100.5]));
        assert_eq!(eval.signal, Signal::InsufficientData);
    }

    #[test]
    fn evaluation_display_lists_readings() {
        let eval = evaluate(&trend(), "AAPL", &history(20, 150.0, &[]), &trend_port(145.0, 45.0));
        assert_eq!(
            eval.to_string(),
            "AAPL price: 150, EMA(14): 145, RSI(14): 45, signal: entry, allocation: 1"
        );
    }

    #[test]
    fn signal_allocations() {
        assert_eq!(Signal::Entry.allocation(), 1.0);
        assert_eq!(Signal::Exit.allocation(), 0.0);
        assert_eq!(Signal::None.allocation(), 0.0);
        assert_eq!(Signal::InsufficientData.allocation(), 0.0);
    }
}
