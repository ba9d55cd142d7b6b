//! pricesync core — incremental maintenance of per-asset OHLCV CSV histories.
//!
//! - Domain types (assets, daily bars)
//! - Data provider trait and the Yahoo Finance chart client
//! - CSV history store with atomic full-file rewrites
//! - Asset synchronizer applying the append-new-dates-only merge policy
//! - TOML configuration of the tracked assets

pub mod config;
pub mod data;
pub mod domain;
pub mod sync;

pub use config::{ConfigError, SyncConfig};
pub use data::{DataError, DataProvider, HistoryStore, Lookback, YahooProvider};
pub use domain::{Asset, Bar};
pub use sync::{AssetReport, AssetSynchronizer, StdoutReporter, SyncError, SyncOutcome, SyncReporter};
