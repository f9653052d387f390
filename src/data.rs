//! Rate data: source adapters and series tags

pub mod frequency;
pub mod sources;

pub use frequency::{Frequency, SeriesVariation};
pub use sources::{RateSource, SheetFormat, SheetRow, SpreadsheetSource};
