//! Target allocation decision.
//!
//! Maps each tracked symbol to the fraction of portfolio value it should
//! hold. Weights are always kept inside [0, 1].

use std::collections::BTreeMap;
use std::fmt;

pub const FLAT: f64 = 0.0;
pub const INVESTED: f64 = 1.0;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllocationDecision {
    weights: BTreeMap<String, f64>,
}

impl AllocationDecision {
    /// A decision holding every symbol at zero weight.
    pub fn flat<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            weights: symbols.into_iter().map(|s| (s.into(), FLAT)).collect(),
        }
    }

    /// Set the weight for a symbol, clamped into [0, 1]. NaN becomes 0.
    pub fn set(&mut self, symbol: impl Into<String>, weight: f64) {
        let weight = if weight.is_nan() {
            FLAT
        } else {
            weight.clamp(FLAT, INVESTED)
        };
        self.weights.insert(symbol.into(), weight);
    }

    pub fn weight(&self, symbol: &str) -> Option<f64> {
        self.weights.get(symbol).copied()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.weights.contains_key(symbol)
    }

    pub fn is_invested(&self, symbol: &str) -> bool {
        self.weight(symbol).is_some_and(|w| w > FLAT)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(s, w)| (s.as_str(), *w))
    }
}

impl fmt::Display for AllocationDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .weights
            .iter()
            .map(|(symbol, weight)| format!("{}={}", symbol, weight))
            .collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}
