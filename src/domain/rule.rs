//! Allocation rule definitions.
//!
//! Each variant pairs a set of indicators with the predicate that turns their
//! latest readings into an entry or exit:
//! - `TrendMomentum`: close vs. EMA, gated by RSI thresholds
//! - `MacdCrossover`: MACD line crossing its signal line
//! - `SmaVolume`: short SMA crossing long SMA, entries confirmed by volume

use crate::domain::indicator::macd::{DEFAULT_FAST, DEFAULT_SIGNAL, DEFAULT_SLOW};
use crate::domain::indicator::IndicatorType;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendMomentum {
    pub ema_length: usize,
    pub rsi_length: usize,
    pub oversold: f64,
    pub overbought: f64,
}

impl Default for TrendMomentum {
    fn default() -> Self {
        Self {
            ema_length: 14,
            rsi_length: 14,
            oversold: 30.0,
            overbought: 70.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacdCrossover {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdCrossover {
    fn default() -> Self {
        Self {
            fast: DEFAULT_FAST,
            slow: DEFAULT_SLOW,
            signal: DEFAULT_SIGNAL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmaVolume {
    pub short_period: usize,
    pub long_period: usize,
    pub volume_period: usize,
    pub volume_multiplier: f64,
}

impl Default for SmaVolume {
    fn default() -> Self {
        Self {
            short_period: 10,
            long_period: 30,
            volume_period: 20,
            volume_multiplier: 1.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rule {
    TrendMomentum(TrendMomentum),
    MacdCrossover(MacdCrossover),
    SmaVolume(SmaVolume),
}

impl Rule {
    pub const KINDS: [&'static str; 3] = ["trend_momentum", "macd_crossover", "sma_volume"];

    /// Rule of the named kind with its default parameters.
    pub fn default_for(kind: &str) -> Option<Rule> {
        match kind.trim().to_lowercase().as_str() {
            "trend_momentum" => Some(Rule::TrendMomentum(TrendMomentum::default())),
            "macd_crossover" => Some(Rule::MacdCrossover(MacdCrossover::default())),
            "sma_volume" => Some(Rule::SmaVolume(SmaVolume::default())),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Rule::TrendMomentum(_) => "trend_momentum",
            Rule::MacdCrossover(_) => "macd_crossover",
            Rule::SmaVolume(_) => "sma_volume",
        }
    }

    /// Fewest bars for which the rule can fire at all.
    pub fn min_history(&self) -> usize {
        match self {
            Rule::TrendMomentum(p) => p.ema_length.max(p.rsi_length) + 1,
            Rule::MacdCrossover(_) => 2,
            Rule::SmaVolume(p) => p.volume_period.max(2),
        }
    }

    pub fn indicators(&self) -> Vec<IndicatorType> {
        match self {
            Rule::TrendMomentum(p) => vec![
                IndicatorType::Ema(p.ema_length),
                IndicatorType::Rsi(p.rsi_length),
            ],
            Rule::MacdCrossover(p) => vec![IndicatorType::Macd {
                fast: p.fast,
                slow: p.slow,
                signal: p.signal,
            }],
            Rule::SmaVolume(p) => vec![
                IndicatorType::Sma(p.short_period),
                IndicatorType::Sma(p.long_period),
            ],
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::TrendMomentum(p) => write!(
                f,
                "ENTRY(CLOSE > EMA({}) AND RSI({}) > {}) EXIT(CLOSE < EMA({}) OR RSI({}) > {})",
                p.ema_length, p.rsi_length, p.oversold, p.ema_length, p.rsi_length, p.overbought
            ),
            Rule::MacdCrossover(p) => write!(
                f,
                "ENTRY(CROSS_ABOVE(MACD({fast},{slow},{sig}).line, signal)) \
                 EXIT(CROSS_BELOW(MACD({fast},{slow},{sig}).line, signal))",
                fast = p.fast,
                slow = p.slow,
                sig = p.signal
            ),
            Rule::SmaVolume(p) => write!(
                f,
                "ENTRY(CROSS_ABOVE(SMA({s}), SMA({l})) AND VOLUME > {m} * AVG_VOLUME({v})) \
                 EXIT(CROSS_BELOW(SMA({s}), SMA({l})))",
                s = p.short_period,
                l = p.long_period,
                m = p.volume_multiplier,
                v = p.volume_period
            ),
        }
    }
}
