//! Core domain types and logic.

pub mod ohlcv;
pub mod market_data;
pub mod indicator;
pub mod allocation;
pub mod crossover;
pub mod rule;
pub mod rule_eval;
pub mod strategy;
pub mod evaluator;
pub mod replay;
pub mod config_validation;
pub mod error;
