//! Bar — one dated OHLCV observation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily OHLCV bar.
///
/// The date is a plain calendar date: provider timestamps are reduced to the
/// exchange's wall-clock date before a `Bar` is built. Values the provider left
/// empty are carried as `NaN` so the row is not lost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Returns true if any OHLCV field is NaN (partial provider row).
    pub fn has_gaps(&self) -> bool {
        self.open.is_nan()
            || self.high.is_nan()
            || self.low.is_nan()
            || self.close.is_nan()
            || self.volume.is_nan()
    }
}

/// True when `bars` is strictly increasing by date (no duplicates).
pub fn is_strictly_ordered(bars: &[Bar]) -> bool {
    bars.windows(2).all(|w| w[0].date < w[1].date)
}
