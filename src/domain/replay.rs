//! Walk-forward replay: invoke the evaluator once per interval, the way a
//! backtesting host does, handing it the full history up to that interval.
//!
//! The evaluator stays stateless. Carrying a position through bars where no
//! signal fires is a host decision, selected with [`HoldPolicy`].
//!
//! On a timeline frame where an asset has no bar of its own, the asset is not
//! re-evaluated: its row has no close and `Signal::None` (or
//! `Signal::InsufficientData` before its first bar), and the allocation
//! follows the hold policy.

use crate::domain::allocation::{AllocationDecision, FLAT};
use crate::domain::evaluator::evaluate_asset;
use crate::domain::market_data::build_unified_timeline;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::rule_eval::Signal;
use crate::domain::strategy::Strategy;
use crate::ports::indicator_port::IndicatorPort;
use chrono::NaiveDateTime;
use log::debug;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HoldPolicy {
    /// Use the evaluator's allocation as is: no signal means flat.
    #[default]
    Flat,
    /// Keep the previous allocation when neither entry nor exit fires.
    Carry,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayRow {
    pub timestamp: NaiveDateTime,
    pub symbol: String,
    pub close: Option<f64>,
    pub signal: Signal,
    pub allocation: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplayReport {
    pub rows: Vec<ReplayRow>,
    /// FLAT -> INVESTED transitions across all assets.
    pub entries: usize,
    /// INVESTED -> FLAT transitions across all assets.
    pub exits: usize,
    /// Asset-intervals spent invested.
    pub invested_bars: usize,
    pub final_decision: AllocationDecision,
}

pub fn replay(
    strategy: &Strategy,
    histories: &HashMap<String, Vec<OhlcvBar>>,
    indicators: &dyn IndicatorPort,
    policy: HoldPolicy,
) -> ReplayReport {
    let tracked: Vec<(&str, &[OhlcvBar])> = strategy
        .assets
        .iter()
        .map(|s| {
            let bars = histories.get(s).map(Vec::as_slice).unwrap_or(&[]);
            (s.as_str(), bars)
        })
        .collect();

    let timeline = build_unified_timeline(tracked.iter().map(|(_, bars)| *bars));
    let mut report = ReplayReport {
        final_decision: AllocationDecision::flat(strategy.assets.iter().cloned()),
        ..ReplayReport::default()
    };
    let mut cursors = vec![0usize; tracked.len()];
    let mut held = vec![FLAT; tracked.len()];

    for ts in timeline {
        for (i, (symbol, bars)) in tracked.iter().enumerate() {
            let before = cursors[i];
            while cursors[i] < bars.len() && bars[cursors[i]].timestamp <= ts {
                cursors[i] += 1;
            }

            // No bar for this asset at `ts`: nothing new to evaluate.
            let (close, signal, evaluated) = if cursors[i] == before {
                let signal = if before == 0 {
                    Signal::InsufficientData
                } else {
                    Signal::None
                };
                (None, signal, FLAT)
            } else {
                let evaluation = evaluate_asset(strategy, symbol, &bars[..cursors[i]], indicators);
                debug!("[{}] {} {}", strategy.name, ts, evaluation);
                (evaluation.close, evaluation.signal, evaluation.allocation)
            };

            let allocation = match (policy, signal) {
                (HoldPolicy::Carry, Signal::None | Signal::InsufficientData) => held[i],
                _ => evaluated,
            };

            if held[i] == FLAT && allocation > FLAT {
                report.entries += 1;
            } else if held[i] > FLAT && allocation == FLAT {
                report.exits += 1;
            }
            if allocation > FLAT {
                report.invested_bars += 1;
            }
            held[i] = allocation;

            report.rows.push(ReplayRow {
                timestamp: ts,
                symbol: symbol.to_string(),
                close,
                signal,
                allocation,
            });
        }
    }

    for ((symbol, _), weight) in tracked.iter().zip(&held) {
        report.final_decision.set(*symbol, *weight);
    }
    report
}
