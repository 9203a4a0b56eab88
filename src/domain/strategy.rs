//! Strategy configuration and built-in presets.

use crate::domain::rule::{MacdCrossover, Rule, SmaVolume, TrendMomentum};
use std::fmt;

/// How often the host invokes the strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interval {
    OneMinute,
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    OneHour,
    FourHours,
    OneDay,
    OneWeek,
}

impl Interval {
    pub const ALL: [Interval; 8] = [
        Interval::OneMinute,
        Interval::FiveMinutes,
        Interval::FifteenMinutes,
        Interval::ThirtyMinutes,
        Interval::OneHour,
        Interval::FourHours,
        Interval::OneDay,
        Interval::OneWeek,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::OneMinute => "1min",
            Interval::FiveMinutes => "5min",
            Interval::FifteenMinutes => "15min",
            Interval::ThirtyMinutes => "30min",
            Interval::OneHour => "1hour",
            Interval::FourHours => "4hour",
            Interval::OneDay => "1day",
            Interval::OneWeek => "1week",
        }
    }

    pub fn parse(s: &str) -> Option<Interval> {
        let s = s.trim().to_lowercase();
        Interval::ALL.into_iter().find(|i| i.as_str() == s)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Strategy {
    pub name: String,
    pub description: String,
    /// Tracked instruments, in configuration order, without duplicates.
    pub assets: Vec<String>,
    pub interval: Interval,
    /// Auxiliary data streams the host must supply besides OHLCV.
    pub data_requirements: Vec<String>,
    pub rule: Rule,
}

impl Strategy {
    pub const PRESETS: [&'static str; 3] = ["ema_rsi", "macd", "sma_volume"];

    pub fn new<I, S>(name: impl Into<String>, assets: I, interval: Interval, rule: Rule) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for asset in assets {
            let asset = asset.into().trim().to_uppercase();
            if !asset.is_empty() && !unique.contains(&asset) {
                unique.push(asset);
            }
        }
        Self {
            name: name.into(),
            description: String::new(),
            assets: unique,
            interval,
            data_requirements: Vec::new(),
            rule,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn preset(name: &str) -> Option<Strategy> {
        let strategy = match name.trim().to_lowercase().as_str() {
            "ema_rsi" => Strategy::new(
                "AAPL EMA/RSI trend",
                ["AAPL"],
                Interval::OneDay,
                Rule::TrendMomentum(TrendMomentum::default()),
            )
            .with_description(
                "Hold while price is above its EMA and RSI is not oversold; \
                 flat when price drops below the EMA or RSI is overbought",
            ),
            "macd" => Strategy::new(
                "QQQ MACD crossover",
                ["QQQ"],
                Interval::OneDay,
                Rule::MacdCrossover(MacdCrossover::default()),
            )
            .with_description("Buy when MACD crosses above its signal line, sell on the reverse"),
            "sma_volume" => Strategy::new(
                "AAPL SMA crossover with volume",
                ["AAPL"],
                Interval::OneDay,
                Rule::SmaVolume(SmaVolume::default()),
            )
            .with_description(
                "Buy on a short/long SMA golden cross confirmed by a volume surge, \
                 sell on the death cross",
            ),
            _ => return None,
        };
        Some(strategy)
    }
}
