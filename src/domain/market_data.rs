//! Per-invocation market data and timeline alignment.
//!
//! The host hands the evaluator one `MarketData` per call: an `ohlcv` stream
//! of frames, oldest first, each frame mapping symbol to that interval's bar.

use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// One interval's bars keyed by symbol.
pub type Frame = BTreeMap<String, OhlcvBar>;

#[derive(Debug, Clone, Default)]
pub struct MarketData {
    pub ohlcv: Vec<Frame>,
}

impl MarketData {
    pub fn new(ohlcv: Vec<Frame>) -> Self {
        Self { ohlcv }
    }

    /// Align per-symbol histories on a unified timeline.
    ///
    /// Each frame holds the bars sharing one timestamp; a symbol with no bar
    /// at that timestamp is simply absent from the frame.
    pub fn from_histories(histories: &HashMap<String, Vec<OhlcvBar>>) -> Self {
        let timeline = build_unified_timeline(histories.values().map(Vec::as_slice));
        let mut by_time: HashMap<NaiveDateTime, Frame> = HashMap::with_capacity(timeline.len());

        for (symbol, bars) in histories {
            for bar in bars {
                by_time
                    .entry(bar.timestamp)
                    .or_default()
                    .insert(symbol.clone(), bar.clone());
            }
        }

        let ohlcv = timeline
            .into_iter()
            .filter_map(|ts| by_time.remove(&ts))
            .collect();
        Self { ohlcv }
    }

    pub fn len(&self) -> usize {
        self.ohlcv.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ohlcv.is_empty()
    }

    /// The price history of one symbol, chronological.
    pub fn history(&self, symbol: &str) -> Vec<OhlcvBar> {
        self.ohlcv
            .iter()
            .filter_map(|frame| frame.get(symbol).cloned())
            .collect()
    }

    /// Symbols present anywhere in the stream, sorted.
    pub fn symbols(&self) -> Vec<String> {
        let unique: BTreeSet<&String> = self.ohlcv.iter().flat_map(|f| f.keys()).collect();
        unique.into_iter().cloned().collect()
    }

    /// Timestamp of the newest frame.
    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.ohlcv
            .last()
            .and_then(|frame| frame.values().next())
            .map(|bar| bar.timestamp)
    }
}

/// Sorted, de-duplicated timestamps across all histories.
pub fn build_unified_timeline<'a, I>(histories: I) -> Vec<NaiveDateTime>
where
    I: IntoIterator<Item = &'a [OhlcvBar]>,
{
    let unique: BTreeSet<NaiveDateTime> = histories
        .into_iter()
        .flat_map(|bars| bars.iter().map(|bar| bar.timestamp))
        .collect();
    unique.into_iter().collect()
}
