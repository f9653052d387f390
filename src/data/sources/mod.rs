//! Rate source adapters
//!
//! Each adapter obtains raw observations and hands them to the normalizer:
//! - API: ECB reference rates from an exchangeratesapi-style REST endpoint
//! - JSON file: the same document saved to disk
//! - Spreadsheet: tagged rows exported from the ECB statistical data warehouse

pub mod api;
pub mod spreadsheet;

#[cfg(feature = "http")]
pub use api::ApiRateSource;
pub use api::{JsonFileSource, RatesDocument};
pub use spreadsheet::{SheetFormat, SheetRow, SpreadsheetSource};

use crate::error::Result;
use crate::normalize::NormalizedTable;

/// Trait for rate sources
pub trait RateSource {
    /// Load, normalize and snapshot-filter the source
    fn load(&self) -> Result<NormalizedTable>;

    /// Get the source name
    fn name(&self) -> &str;
}
