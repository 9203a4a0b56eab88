//! Indicator computation port trait.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

pub trait IndicatorPort {
    /// Compute `indicator` over the price history of `symbol`.
    ///
    /// Returns `None` when the history is too short to produce a single
    /// valid reading.
    fn compute(
        &self,
        symbol: &str,
        history: &[OhlcvBar],
        indicator: IndicatorType,
    ) -> Option<IndicatorSeries>;
}
