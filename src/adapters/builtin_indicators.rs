//! In-process indicator library adapter.

use crate::domain::indicator::{self, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::indicator_port::IndicatorPort;

/// Computes indicators with the crate's own implementations.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinIndicators;

impl IndicatorPort for BuiltinIndicators {
    fn compute(
        &self,
        _symbol: &str,
        history: &[OhlcvBar],
        indicator: IndicatorType,
    ) -> Option<IndicatorSeries> {
        let series = indicator::calculate(history, indicator);
        series.has_valid().then_some(series)
    }
}
