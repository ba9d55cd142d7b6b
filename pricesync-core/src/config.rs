//! Synchronizer configuration.
//!
//! Stored as TOML. Every field is optional; an empty document yields the
//! default asset set written into `data/`.
//!
//! ```toml
//! data_dir = "data"
//! trailing_days = 2
//!
//! [[assets]]
//! name = "btc"
//! symbol = "BTC-USD"
//! ```
//!
//! Assets are a list rather than a table so their order, which is the order
//! they are synchronized and reported in, is the order written.

use crate::domain::Asset;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Shortest trailing window: yesterday's bar plus a same-day correction.
pub const MIN_TRAILING_DAYS: u32 = 2;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Directory holding one `{name}.csv` per asset.
    pub data_dir: PathBuf,
    /// Days fetched for assets that already have history.
    pub trailing_days: u32,
    pub assets: Vec<Asset>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            trailing_days: MIN_TRAILING_DAYS,
            assets: default_assets(),
        }
    }
}

/// Assets tracked when no config file names any.
pub fn default_assets() -> Vec<Asset> {
    vec![
        Asset::new("btc", "BTC-USD"),
        Asset::new("eth", "ETH-USD"),
        Asset::new("gold", "GC=F"),
        Asset::new("sp500", "^GSPC"),
    ]
}

impl SyncConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trailing_days < MIN_TRAILING_DAYS {
            return Err(ConfigError::Invalid(format!(
                "trailing_days must be at least {MIN_TRAILING_DAYS}, got {}",
                self.trailing_days
            )));
        }
        if self.assets.is_empty() {
            return Err(ConfigError::Invalid("no assets configured".into()));
        }

        let mut names = HashSet::new();
        for asset in &self.assets {
            if !asset.has_file_safe_name() {
                return Err(ConfigError::Invalid(format!(
                    "asset name {:?} must be non-empty and use only letters, digits, '_' or '-'",
                    asset.name
                )));
            }
            if asset.symbol.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "asset {:?} has an empty symbol",
                    asset.name
                )));
            }
            if !names.insert(asset.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "asset {:?} is listed more than once",
                    asset.name
                )));
            }
        }

        Ok(())
    }
}
