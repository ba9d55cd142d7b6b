//! Shared test doubles: a scripted provider and a collecting reporter.

#![allow(dead_code)]

use chrono::NaiveDate;
use pricesync_core::data::{DataError, DataProvider, FetchResult, Lookback};
use pricesync_core::{AssetReport, Bar, SyncReporter};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Provider serving a fixed per-symbol history.
///
/// `Lookback::Max` returns everything; `Lookback::Days(n)` returns the last `n`
/// bars, which stands in for a trailing calendar window over daily data.
#[derive(Default)]
pub struct ScriptedProvider {
    bars: Mutex<HashMap<String, Vec<Bar>>>,
    failing: Mutex<HashSet<String>>,
    calls: Mutex<Vec<(String, Lookback)>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, symbol: &str, bars: Vec<Bar>) {
        self.bars.lock().unwrap().insert(symbol.to_string(), bars);
    }

    pub fn push(&self, symbol: &str, bar: Bar) {
        self.bars
            .lock()
            .unwrap()
            .entry(symbol.to_string())
            .or_default()
            .push(bar);
    }

    /// Replace the close of an already-served date.
    pub fn revise_close(&self, symbol: &str, date: NaiveDate, close: f64) {
        let mut bars = self.bars.lock().unwrap();
        if let Some(bar) = bars
            .get_mut(symbol)
            .and_then(|v| v.iter_mut().find(|b| b.date == date))
        {
            bar.close = close;
        }
    }

    pub fn fail(&self, symbol: &str) {
        self.failing.lock().unwrap().insert(symbol.to_string());
    }

    pub fn calls(&self) -> Vec<(String, Lookback)> {
        self.calls.lock().unwrap().clone()
    }
}

impl DataProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn fetch(&self, symbol: &str, lookback: Lookback) -> Result<FetchResult, DataError> {
        self.calls
            .lock()
            .unwrap()
            .push((symbol.to_string(), lookback));

        if self.failing.lock().unwrap().contains(symbol) {
            return Err(DataError::NetworkUnreachable(format!("{symbol} unreachable")));
        }

        let all = self
            .bars
            .lock()
            .unwrap()
            .get(symbol)
            .cloned()
            .ok_or_else(|| DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            })?;

        let bars = match lookback {
            Lookback::Max => all,
            Lookback::Days(n) => {
                let skip = all.len().saturating_sub(n as usize);
                all[skip..].to_vec()
            }
        };

        Ok(FetchResult { bars })
    }
}

/// Reporter keeping the status lines it was handed.
#[derive(Default)]
pub struct CollectingReporter {
    pub lines: RefCell<Vec<String>>,
}

impl SyncReporter for CollectingReporter {
    fn on_complete(&self, report: &AssetReport) {
        self.lines.borrow_mut().push(report.to_string());
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn bar(date: NaiveDate, close: f64) -> Bar {
    Bar {
        date,
        open: close - 0.5,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume: 1_000.0,
    }
}

/// `n` consecutive daily bars starting 2024-01-01, closes 100, 101, ...
pub fn daily_bars(n: usize) -> Vec<Bar> {
    let start = date(2024, 1, 1);
    (0..n)
        .map(|i| bar(start + chrono::Duration::days(i as i64), 100.0 + i as f64))
        .collect()
}
