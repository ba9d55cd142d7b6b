//! Reconciliation of fetched bars with stored history.
//!
//! The policy is **append-new-dates-only**: a fetched bar is kept only when its
//! date is absent from the stored history. Membership is decided on the date
//! alone, so a provider revision of an already-stored day is dropped and the
//! stored row stays as first written. There is no upsert.

use crate::domain::Bar;
use std::collections::HashSet;
use tracing::warn;

/// Outcome of reconciling one fetch against stored history.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciled {
    /// Every fetched date is already stored; nothing to write.
    Unchanged,
    /// New dates were found; `history` is the full sequence to persist.
    Updated { history: Vec<Bar>, new_rows: usize },
}

/// History for an asset with nothing stored yet.
///
/// A well-formed provider response is already ordered and unique, in which case
/// this returns it untouched. Otherwise it is sorted by date and the first bar
/// seen for a date wins.
pub fn initial_history(fetched: Vec<Bar>) -> Vec<Bar> {
    sort_unique(fetched)
}

/// Merge `fetched` into `stored` under the append-new-dates-only policy.
pub fn append_new_dates_only(stored: Vec<Bar>, fetched: Vec<Bar>) -> Reconciled {
    let new_bars = new_dates(&stored, fetched);
    if new_bars.is_empty() {
        return Reconciled::Unchanged;
    }

    let new_rows = new_bars.len();
    if let (Some(last), Some(earliest)) = (
        stored.iter().map(|b| b.date).max(),
        new_bars.iter().map(|b| b.date).min(),
    ) {
        if earliest < last {
            warn!(
                %earliest,
                %last,
                "new bars predate stored history; combined history will be re-sorted"
            );
        }
    }

    let mut history = stored;
    history.extend(new_bars);
    Reconciled::Updated {
        history: sort_unique(history),
        new_rows,
    }
}

/// Fetched bars whose date is not in `stored`, each date at most once.
pub fn new_dates(stored: &[Bar], fetched: Vec<Bar>) -> Vec<Bar> {
    let mut seen: HashSet<_> = stored.iter().map(|b| b.date).collect();
    fetched
        .into_iter()
        .filter(|b| seen.insert(b.date))
        .collect()
}

/// Stable sort by date, then drop later bars sharing a date.
fn sort_unique(mut bars: Vec<Bar>) -> Vec<Bar> {
    bars.sort_by_key(|b| b.date);
    bars.dedup_by_key(|b| b.date);
    bars
}
