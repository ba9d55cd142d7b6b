//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over the market-data source so the
//! synchronizer can run against Yahoo Finance in production and a scripted
//! provider in tests.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::domain::Bar;

/// How far back a fetch reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookback {
    /// Only the most recent `n` calendar days.
    Days(u32),
    /// Everything the provider has.
    Max,
}

impl Lookback {
    /// Provider range token: `2d`, `max`.
    pub fn as_range(&self) -> String {
        match self {
            Lookback::Days(n) => format!("{n}d"),
            Lookback::Max => "max".to_string(),
        }
    }
}

impl fmt::Display for Lookback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lookback::Days(n) => write!(f, "last {n} days"),
            Lookback::Max => f.write_str("full history"),
        }
    }
}

/// Structured error types for fetch and storage operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("HTTP {status} for {symbol}")]
    HttpStatus { status: u16, symbol: String },

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("provider returned no bars for {symbol}")]
    EmptyResponse { symbol: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed history file {}: {reason}", path.display())]
    MalformedHistory { path: PathBuf, reason: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl DataError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DataError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result of a successful fetch for a single symbol.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub bars: Vec<Bar>,
}

/// Trait for market-data providers.
///
/// Implementations return bars with naive dates; the timezone handling is
/// theirs, not the caller's. The store and merge layers sit above this trait.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily OHLCV bars for `symbol` over `lookback`.
    fn fetch(&self, symbol: &str, lookback: Lookback) -> Result<FetchResult, DataError>;
}
