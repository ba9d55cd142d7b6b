//! Domain types: assets and bars.

pub mod asset;
pub mod bar;

pub use asset::Asset;
pub use bar::{is_strictly_ordered, Bar};
