//! Market data: provider abstraction, Yahoo client, CSV history store.

pub mod provider;
pub mod store;
pub mod yahoo;

pub use provider::{DataError, DataProvider, FetchResult, Lookback};
pub use store::HistoryStore;
pub use yahoo::YahooProvider;
