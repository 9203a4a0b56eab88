//! Strategy configuration: resolve the INI surface into a validated
//! [`Strategy`].
//!
//! A `preset` supplies defaults for every other key. Keys given in
//! `[strategy]` or `[rule]` override the preset.

use crate::domain::error::SignalError;
use crate::domain::rule::{MacdCrossover, Rule, SmaVolume, TrendMomentum};
use crate::domain::strategy::{Interval, Strategy};
use crate::ports::config_port::ConfigPort;

const STRATEGY: &str = "strategy";
const RULE: &str = "rule";

/// Check a configuration without keeping the result.
pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), SignalError> {
    build_strategy(config).map(|_| ())
}

pub fn build_strategy(config: &dyn ConfigPort) -> Result<Strategy, SignalError> {
    let base = resolve_preset(config)?;

    let rule = resolve_rule(config, base.as_ref().map(|s| &s.rule))?;
    validate_rule(&rule)?;

    let assets = match config.get_list(STRATEGY, "assets") {
        Some(list) => list,
        None => base.as_ref().map(|s| s.assets.clone()).unwrap_or_default(),
    };
    let interval = resolve_interval(config, base.as_ref().map(|s| s.interval))?;
    let name = non_empty(config.get_string(STRATEGY, "name"))
        .or_else(|| base.as_ref().map(|s| s.name.clone()))
        .unwrap_or_else(|| rule.kind().to_string());

    let mut strategy = Strategy::new(name, assets, interval, rule);
    validate_assets(&strategy)?;

    if let Some(description) = non_empty(config.get_string(STRATEGY, "description")) {
        strategy.description = description;
    } else if let Some(base) = &base {
        strategy.description = base.description.clone();
    }
    strategy.data_requirements = config.get_list(STRATEGY, "data").unwrap_or_default();

    Ok(strategy)
}

/// Parameter checks shared by INI-built and preset strategies.
pub fn validate_rule(rule: &Rule) -> Result<(), SignalError> {
    match rule {
        Rule::TrendMomentum(p) => {
            validate_period("ema_length", p.ema_length)?;
            validate_period("rsi_length", p.rsi_length)?;
            validate_thresholds(p.oversold, p.overbought)
        }
        Rule::MacdCrossover(p) => {
            validate_period("fast", p.fast)?;
            validate_period("slow", p.slow)?;
            validate_period("signal", p.signal)?;
            if p.fast >= p.slow {
                return Err(SignalError::invalid(RULE, "fast", "fast must be less than slow"));
            }
            Ok(())
        }
        Rule::SmaVolume(p) => {
            validate_period("short_period", p.short_period)?;
            validate_period("long_period", p.long_period)?;
            validate_period("volume_period", p.volume_period)?;
            if p.short_period >= p.long_period {
                return Err(SignalError::invalid(
                    RULE,
                    "short_period",
                    "short_period must be less than long_period",
                ));
            }
            if p.volume_multiplier <= 0.0 || !p.volume_multiplier.is_finite() {
                return Err(SignalError::invalid(
                    RULE,
                    "volume_multiplier",
                    "volume_multiplier must be positive",
                ));
            }
            Ok(())
        }
    }
}

fn resolve_preset(config: &dyn ConfigPort) -> Result<Option<Strategy>, SignalError> {
    match non_empty(config.get_string(STRATEGY, "preset")) {
        None => Ok(None),
        Some(name) => Strategy::preset(&name).map(Some).ok_or_else(|| {
            SignalError::invalid(
                STRATEGY,
                "preset",
                format!(
                    "unknown preset '{}', expected one of {}",
                    name,
                    Strategy::PRESETS.join(", ")
                ),
            )
        }),
    }
}

fn resolve_rule(config: &dyn ConfigPort, base: Option<&Rule>) -> Result<Rule, SignalError> {
    let rule = match non_empty(config.get_string(STRATEGY, "rule")) {
        Some(kind) => {
            let default = Rule::default_for(&kind).ok_or_else(|| {
                SignalError::invalid(
                    STRATEGY,
                    "rule",
                    format!(
                        "unknown rule '{}', expected one of {}",
                        kind,
                        Rule::KINDS.join(", ")
                    ),
                )
            })?;
            // A preset's tuned parameters survive when it names the same kind.
            match base {
                Some(b) if b.kind() == default.kind() => *b,
                _ => default,
            }
        }
        None => *base.ok_or_else(|| SignalError::ConfigMissing {
            section: STRATEGY.to_string(),
            key: "rule".to_string(),
        })?,
    };

    Ok(match rule {
        Rule::TrendMomentum(p) => Rule::TrendMomentum(TrendMomentum {
            ema_length: read_period(config, "ema_length", p.ema_length)?,
            rsi_length: read_period(config, "rsi_length", p.rsi_length)?,
            oversold: read_number(config, "oversold", p.oversold)?,
            overbought: read_number(config, "overbought", p.overbought)?,
        }),
        Rule::MacdCrossover(p) => Rule::MacdCrossover(MacdCrossover {
            fast: read_period(config, "fast", p.fast)?,
            slow: read_period(config, "slow", p.slow)?,
            signal: read_period(config, "signal", p.signal)?,
        }),
        Rule::SmaVolume(p) => Rule::SmaVolume(SmaVolume {
            short_period: read_period(config, "short_period", p.short_period)?,
            long_period: read_period(config, "long_period", p.long_period)?,
            volume_period: read_period(config, "volume_period", p.volume_period)?,
            volume_multiplier: read_number(config, "volume_multiplier", p.volume_multiplier)?,
        }),
    })
}

fn resolve_interval(
    config: &dyn ConfigPort,
    base: Option<Interval>,
) -> Result<Interval, SignalError> {
    match non_empty(config.get_string(STRATEGY, "interval")) {
        Some(raw) => Interval::parse(&raw).ok_or_else(|| {
            let known: Vec<&str> = Interval::ALL.iter().map(Interval::as_str).collect();
            SignalError::invalid(
                STRATEGY,
                "interval",
                format!("unknown interval '{}', expected one of {}", raw, known.join(", ")),
            )
        }),
        None => Ok(base.unwrap_or(Interval::OneDay)),
    }
}

fn validate_assets(strategy: &Strategy) -> Result<(), SignalError> {
    if strategy.assets.is_empty() {
        return Err(SignalError::ConfigMissing {
            section: STRATEGY.to_string(),
            key: "assets".to_string(),
        });
    }
    Ok(())
}

fn validate_period(key: &str, value: usize) -> Result<(), SignalError> {
    if value == 0 {
        return Err(SignalError::invalid(RULE, key, format!("{} must be at least 1", key)));
    }
    Ok(())
}

fn validate_thresholds(oversold: f64, overbought: f64) -> Result<(), SignalError> {
    for (key, value) in [("oversold", oversold), ("overbought", overbought)] {
        if !(0.0..=100.0).contains(&value) {
            return Err(SignalError::invalid(
                RULE,
                key,
                format!("{} must be between 0 and 100", key),
            ));
        }
    }
    if oversold >= overbought {
        return Err(SignalError::invalid(
            RULE,
            "oversold",
            "oversold must be less than overbought",
        ));
    }
    Ok(())
}

/// Integer period from `[rule]`, keeping `default` when the key is absent.
/// A malformed value is an error, never the default.
fn read_period(config: &dyn ConfigPort, key: &str, default: usize) -> Result<usize, SignalError> {
    match non_empty(config.get_string(RULE, key)) {
        None => Ok(default),
        Some(raw) => raw.parse::<usize>().map_err(|_| {
            SignalError::invalid(RULE, key, format!("{} must be a non-negative integer", key))
        }),
    }
}

fn read_number(config: &dyn ConfigPort, key: &str, default: f64) -> Result<f64, SignalError> {
    match non_empty(config.get_string(RULE, key)) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| SignalError::invalid(RULE, key, format!("{} must be a number", key))),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
