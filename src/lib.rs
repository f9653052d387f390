//! # fx_crossrates
//!
//! Cross-rate tables from ECB reference rates.
//!
//! Rates quoted against a base currency (EUR) are read from a rates API
//! document or an ECB statistical data warehouse export, normalized into one
//! row per `(date, currency)`, narrowed to snapshot dates (year-end by
//! default) and self-joined per date into every pairwise cross rate.
//!
//! ## Example
//!
//! ```rust
//! use fx_crossrates::prelude::*;
//!
//! let document = RatesDocument::parse(
//!     r#"{"rates": {"2019-12-31": {"USD": 1.1234, "GBP": 0.8508, "JPY": 121.94}}}"#,
//! ).unwrap();
//! let table = document.normalize(&SnapshotPolicy::YearEnd).unwrap();
//!
//! let rates = CrossRateEngine::new(SelfPairPolicy::Exclude).compute(&table).unwrap();
//! assert_eq!(rates.len(), 6);
//!
//! let usd_gbp = rates
//!     .iter()
//!     .find(|r| r.currency_from.as_str() == "USD" && r.currency_to.as_str() == "GBP")
//!     .unwrap();
//! assert!((usd_gbp.from - 1.1234 / 0.8508).abs() < 1e-12);
//! ```

pub mod batch;
pub mod config;
pub mod currency;
pub mod data;
pub mod engine;
pub mod error;
pub mod export;
pub mod normalize;
pub mod types;

pub mod prelude {
    //! Commonly used types and traits
    pub use crate::batch::{run, RunReport};
    pub use crate::config::{RunConfig, SourceConfig};
    pub use crate::currency::{CurrencyCode, CurrencyLabel, CurrencyPair};
    pub use crate::data::sources::{JsonFileSource, RateSource, RatesDocument, SpreadsheetSource};
    pub use crate::data::{Frequency, SeriesVariation};
    pub use crate::engine::{join_rate_types, CrossRate, CrossRateEngine, SelfPairPolicy};
    pub use crate::error::{FxError, Result};
    pub use crate::export::{export_cross_rates, read_cross_rates, ExportReport};
    pub use crate::normalize::{NormalizedTable, SnapshotPolicy};
    pub use crate::types::{Observation, Rate, RateType};

    #[cfg(feature = "http")]
    pub use crate::data::sources::ApiRateSource;
}
