//! Per-asset status reporting.

use super::SyncOutcome;
use crate::domain::Asset;
use std::fmt;

/// Result line for one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetReport {
    pub asset: String,
    pub outcome: SyncOutcome,
}

impl fmt::Display for AssetReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.asset, self.outcome)
    }
}

/// Progress callback for a synchronization pass.
pub trait SyncReporter {
    /// Called before an asset is fetched.
    fn on_start(&self, _asset: &Asset, _index: usize, _total: usize) {}

    /// Called once an asset's history is up to date.
    fn on_complete(&self, report: &AssetReport);
}

/// Prints one status line per asset to stdout.
pub struct StdoutReporter;

impl SyncReporter for StdoutReporter {
    fn on_complete(&self, report: &AssetReport) {
        println!("{report}");
    }
}
