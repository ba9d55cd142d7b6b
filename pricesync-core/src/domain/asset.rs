//! Asset — a logical name bound to a provider symbol.

use serde::{Deserialize, Serialize};

/// A tracked asset.
///
/// `name` keys the history file (`btc` → `btc.csv`); `symbol` is what the
/// provider is queried with (`BTC-USD`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Asset {
    pub name: String,
    pub symbol: String,
}

impl Asset {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
        }
    }

    /// Whether `name` can be used verbatim as a file stem.
    pub fn has_file_safe_name(&self) -> bool {
        !self.name.is_empty()
            && self
                .name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    }
}
