//! Historical price data port trait.

use crate::domain::error::SignalError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars for `symbol` dated within `[start_date, end_date]`, oldest first.
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, SignalError>;

    fn list_symbols(&self) -> Result<Vec<String>, SignalError>;
}
