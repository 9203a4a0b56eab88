//! Crossover detection between two series sampled at consecutive intervals.
//!
//! Above: left was at or below right and is now strictly above it.
//! Below: left was at or above right and is now strictly below it.
//! Whether "at" counts on the prior sample is chosen by [`CrossMode`].

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cross {
    Above,
    Below,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrossMode {
    /// Prior sample must be strictly on the other side.
    #[default]
    Strict,
    /// Prior sample may touch the other series.
    Touching,
}

/// One pair of consecutive readings of two series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossSample {
    pub prev_left: f64,
    pub prev_right: f64,
    pub cur_left: f64,
    pub cur_right: f64,
}

impl Cross {
    pub fn detect(sample: CrossSample, mode: CrossMode) -> Option<Cross> {
        let CrossSample {
            prev_left,
            prev_right,
            cur_left,
            cur_right,
        } = sample;

        if prev_left.is_nan() || prev_right.is_nan() || cur_left.is_nan() || cur_right.is_nan() {
            return None;
        }

        let (was_below, was_above) = match mode {
            CrossMode::Strict => (prev_left < prev_right, prev_left > prev_right),
            CrossMode::Touching => (prev_left <= prev_right, prev_left >= prev_right),
        };

        if was_below && cur_left > cur_right {
            Some(Cross::Above)
        } else if was_above && cur_left < cur_right {
            Some(Cross::Below)
        } else {
            None
        }
    }
}
