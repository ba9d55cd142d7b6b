//! Asset synchronizer — fetch, reconcile and persist one asset at a time.
//!
//! For each asset:
//! 1. Load stored history (if any)
//! 2. Fetch the full history on first sight, otherwise a trailing window
//!    reaching back at least to the last stored date
//! 3. Keep only bars for dates not yet stored (append-new-dates-only)
//! 4. Rewrite the history file when anything new arrived
//!
//! A pass over several assets stops at the first error. Files of assets already
//! processed stay written; later assets are not touched.

pub mod merge;
pub mod report;

pub use merge::{append_new_dates_only, initial_history, Reconciled};
pub use report::{AssetReport, StdoutReporter, SyncReporter};

use crate::config::{SyncConfig, MIN_TRAILING_DAYS};
use crate::data::provider::{DataError, DataProvider, Lookback};
use crate::data::store::HistoryStore;
use crate::domain::Asset;
use chrono::{NaiveDate, Utc};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

/// What a single `sync` did to an asset's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No history existed; a new file was written with `rows` bars.
    Created { rows: usize },
    /// `new_rows` bars were appended; the file now holds `total`.
    Appended { new_rows: usize, total: usize },
    /// Nothing new; the file (holding `total` bars) was left alone.
    UpToDate { total: usize },
}

impl SyncOutcome {
    pub fn new_rows(&self) -> usize {
        match *self {
            SyncOutcome::Created { rows } => rows,
            SyncOutcome::Appended { new_rows, .. } => new_rows,
            SyncOutcome::UpToDate { .. } => 0,
        }
    }

    pub fn total_rows(&self) -> usize {
        match *self {
            SyncOutcome::Created { rows } => rows,
            SyncOutcome::Appended { total, .. } | SyncOutcome::UpToDate { total } => total,
        }
    }

    pub fn wrote(&self) -> bool {
        !matches!(self, SyncOutcome::UpToDate { .. })
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncOutcome::UpToDate { total } => write!(f, "up-to-date ({total} rows)"),
            other => write!(
                f,
                "wrote {} new rows (total {})",
                other.new_rows(),
                other.total_rows()
            ),
        }
    }
}

/// Failure of a synchronization pass.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to prepare history directory")]
    Prepare(#[source] DataError),

    #[error("failed to sync {asset}")]
    Asset {
        asset: String,
        #[source]
        source: DataError,
    },
}

/// Keeps per-asset CSV histories in step with a provider.
pub struct AssetSynchronizer<'a> {
    provider: &'a dyn DataProvider,
    store: HistoryStore,
    trailing_days: u32,
    today: NaiveDate,
}

impl<'a> AssetSynchronizer<'a> {
    /// `trailing_days` below the minimum window is raised to it. The run date
    /// is today in UTC.
    pub fn new(provider: &'a dyn DataProvider, store: HistoryStore, trailing_days: u32) -> Self {
        Self {
            provider,
            store,
            trailing_days: trailing_days.max(MIN_TRAILING_DAYS),
            today: Utc::now().date_naive(),
        }
    }

    /// Pin the run date used to size trailing windows.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn from_config(provider: &'a dyn DataProvider, config: &SyncConfig) -> Self {
        Self::new(
            provider,
            HistoryStore::new(&config.data_dir),
            config.trailing_days,
        )
    }

    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    /// Fetch window for an asset whose latest stored date is `last_stored`.
    ///
    /// Without stored rows this is the full history. Otherwise it is the
    /// trailing window, widened to reach `last_stored` when runs were missed.
    pub fn lookback_for(&self, last_stored: Option<NaiveDate>) -> Lookback {
        let Some(last) = last_stored else {
            return Lookback::Max;
        };
        let since_last = (self.today - last).num_days() + 1;
        let days = u32::try_from(since_last.max(0)).unwrap_or(u32::MAX);
        Lookback::Days(days.max(self.trailing_days))
    }

    /// Bring one asset's history up to date.
    pub fn sync(&self, asset: &Asset) -> Result<SyncOutcome, DataError> {
        let stored = self.store.load(&asset.name)?;
        let last_stored = stored.as_ref().and_then(|bars| bars.iter().map(|b| b.date).max());
        let lookback = self.lookback_for(last_stored);
        debug!(
            asset = %asset.name,
            symbol = %asset.symbol,
            provider = self.provider.name(),
            %lookback,
            "fetching"
        );

        let fetched = self.provider.fetch(&asset.symbol, lookback)?.bars;

        let outcome = match stored {
            None => {
                if fetched.is_empty() {
                    return Err(DataError::EmptyResponse {
                        symbol: asset.symbol.clone(),
                    });
                }
                let history = initial_history(fetched);
                self.store.write(&asset.name, &history)?;
                SyncOutcome::Created {
                    rows: history.len(),
                }
            }
            Some(stored) => {
                let stored_rows = stored.len();
                match append_new_dates_only(stored, fetched) {
                    Reconciled::Unchanged => SyncOutcome::UpToDate { total: stored_rows },
                    Reconciled::Updated { history, new_rows } => {
                        self.store.write(&asset.name, &history)?;
                        SyncOutcome::Appended {
                            new_rows,
                            total: history.len(),
                        }
                    }
                }
            }
        };

        info!(
            asset = %asset.name,
            new_rows = outcome.new_rows(),
            total = outcome.total_rows(),
            "synced"
        );
        Ok(outcome)
    }

    /// Synchronize `assets` in order, reporting each as it completes.
    ///
    /// The store directory is created before the first asset. The first error
    /// ends the pass.
    pub fn sync_all(
        &self,
        assets: &[Asset],
        reporter: &dyn SyncReporter,
    ) -> Result<Vec<AssetReport>, SyncError> {
        self.store.ensure_dir().map_err(SyncError::Prepare)?;

        let total = assets.len();
        let mut reports = Vec::with_capacity(total);

        for (i, asset) in assets.iter().enumerate() {
            reporter.on_start(asset, i, total);

            let outcome = self.sync(asset).map_err(|source| SyncError::Asset {
                asset: asset.name.clone(),
                source,
            })?;

            let report = AssetReport {
                asset: asset.name.clone(),
                outcome,
            };
            reporter.on_complete(&report);
            reports.push(report);
        }

        Ok(reports)
    }
}
