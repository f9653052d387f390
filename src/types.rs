//! Core types

use crate::currency::{CurrencyCode, CurrencyLabel};
use crate::data::frequency::{Frequency, SeriesVariation};
use crate::error::{FxError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Units of a currency per one unit of the base currency
pub type Rate = f64;

/// One quoted rate of a currency against the base currency on a date
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub date: NaiveDate,
    pub currency: CurrencyLabel,
    pub rate: Rate,
    pub frequency: Option<Frequency>,
    pub series: Option<SeriesVariation>,
}

impl Observation {
    /// Create an untagged observation (JSON API data)
    pub fn new(date: NaiveDate, currency: CurrencyLabel, rate: Rate) -> Self {
        Self {
            date,
            currency,
            rate,
            frequency: None,
            series: None,
        }
    }

    /// Attach frequency and series variation tags
    pub fn with_tags(mut self, frequency: Frequency, series: SeriesVariation) -> Self {
        self.frequency = Some(frequency);
        self.series = Some(series);
        self
    }

    pub fn code(&self) -> &CurrencyCode {
        &self.currency.code
    }

    /// Rate usable as a ratio operand
    pub fn checked_rate(&self) -> Result<Rate> {
        if self.rate.is_finite() && self.rate > 0.0 {
            Ok(self.rate)
        } else {
            Err(FxError::InvalidRate {
                currency: self.currency.code.to_string(),
                date: self.date,
                rate: self.rate,
            })
        }
    }
}

/// Discriminator attached to each result set in join mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RateType {
    #[serde(rename = "Spot Rate Average")]
    SpotRateAverage,
    #[serde(rename = "Annual Average")]
    AnnualAverage,
}

impl RateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateType::SpotRateAverage => "Spot Rate Average",
            RateType::AnnualAverage => "Annual Average",
        }
    }
}

impl fmt::Display for RateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
