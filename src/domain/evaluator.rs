//! Signal evaluator: one host invocation in, one allocation decision out.
//!
//! Stateless. Every call starts from a flat decision covering all tracked
//! assets and overwrites the weight of each asset with its rule outcome.

use crate::domain::allocation::AllocationDecision;
use crate::domain::market_data::MarketData;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::rule_eval::{self, Evaluation, Signal};
use crate::domain::strategy::Strategy;
use crate::ports::indicator_port::IndicatorPort;
use log::info;

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyOutcome {
    pub decision: AllocationDecision,
    /// One entry per tracked asset, in `Strategy::assets` order.
    pub evaluations: Vec<Evaluation>,
}

/// Evaluate every tracked asset of `strategy` against `data`.
pub fn run(
    strategy: &Strategy,
    data: &MarketData,
    indicators: &dyn IndicatorPort,
) -> StrategyOutcome {
    let mut decision = AllocationDecision::flat(strategy.assets.iter().cloned());
    let mut evaluations = Vec::with_capacity(strategy.assets.len());

    for symbol in &strategy.assets {
        let history = data.history(symbol);
        let evaluation = evaluate_asset(strategy, symbol, &history, indicators);
        if evaluation.signal == Signal::InsufficientData {
            info!(
                "[{}] {}: insufficient data ({} bars, need {}), allocation {}",
                strategy.name,
                symbol,
                history.len(),
                strategy.rule.min_history(),
                evaluation.allocation
            );
        } else {
            info!("[{}] {}", strategy.name, evaluation);
        }
        decision.set(symbol.as_str(), evaluation.allocation);
        evaluations.push(evaluation);
    }

    StrategyOutcome {
        decision,
        evaluations,
    }
}

/// The decision alone, as handed back to the host.
pub fn target_allocation(
    strategy: &Strategy,
    data: &MarketData,
    indicators: &dyn IndicatorPort,
) -> AllocationDecision {
    run(strategy, data, indicators).decision
}

/// Evaluate one asset over an already extracted history.
pub fn evaluate_asset(
    strategy: &Strategy,
    symbol: &str,
    history: &[OhlcvBar],
    indicators: &dyn IndicatorPort,
) -> Evaluation {
    rule_eval::evaluate(&strategy.rule, symbol, history, indicators)
}
