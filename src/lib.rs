//! allocsignal: stateless trading signal evaluators.
//!
//! Each invocation turns the OHLCV history of the tracked instruments into an
//! allocation decision of 0 (flat) or 1 (invested) per instrument.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
