//! ECB series tags: observation frequency and series variation

use crate::error::{FxError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Observation frequency as tagged in ECB warehouse exports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Frequency {
    /// One observation per year
    Annual,
    /// One observation per half year
    HalfYearly,
    /// One observation per quarter
    Quarterly,
    /// One observation per month
    Monthly,
    /// One observation per week
    Weekly,
    /// One observation per business day
    Daily,
}

impl Frequency {
    /// Single-letter ECB code
    pub fn code(&self) -> char {
        match self {
            Frequency::Annual => 'A',
            Frequency::HalfYearly => 'H',
            Frequency::Quarterly => 'Q',
            Frequency::Monthly => 'M',
            Frequency::Weekly => 'W',
            Frequency::Daily => 'D',
        }
    }

    /// Full label as written in the `Frequency` column
    pub fn label(&self) -> &'static str {
        match self {
            Frequency::Annual => "A (Annual)",
            Frequency::HalfYearly => "H (Half-yearly)",
            Frequency::Quarterly => "Q (Quarterly)",
            Frequency::Monthly => "M (Monthly)",
            Frequency::Weekly => "W (Weekly)",
            Frequency::Daily => "D (Daily)",
        }
    }

    /// Parse from a full label (`D (Daily)`), a code (`D`) or a name (`daily`)
    pub fn from_label(s: &str) -> Result<Self> {
        let s = s.trim();
        let head = s.split_whitespace().next().unwrap_or("");
        match head.to_uppercase().as_str() {
            "A" | "ANNUAL" => Ok(Frequency::Annual),
            "H" | "HALF-YEARLY" => Ok(Frequency::HalfYearly),
            "Q" | "QUARTERLY" => Ok(Frequency::Quarterly),
            "M" | "MONTHLY" => Ok(Frequency::Monthly),
            "W" | "WEEKLY" => Ok(Frequency::Weekly),
            "D" | "DAILY" => Ok(Frequency::Daily),
            _ => Err(FxError::SourceFormatError(format!(
                "Unknown frequency: '{}'",
                s
            ))),
        }
    }
}

impl FromStr for Frequency {
    type Err = FxError;

    fn from_str(s: &str) -> Result<Self> {
        Frequency::from_label(s)
    }
}

impl TryFrom<String> for Frequency {
    type Error = FxError;

    fn try_from(value: String) -> Result<Self> {
        Frequency::from_label(&value)
    }
}

impl From<Frequency> for String {
    fn from(frequency: Frequency) -> Self {
        frequency.label().to_string()
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// `Series variation - EXR context` tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SeriesVariation {
    /// Average of observations over the period
    Average,
    /// Observation at the end of the period
    EndOfPeriod,
}

impl SeriesVariation {
    pub fn code(&self) -> char {
        match self {
            SeriesVariation::Average => 'A',
            SeriesVariation::EndOfPeriod => 'E',
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SeriesVariation::Average => "A (Average)",
            SeriesVariation::EndOfPeriod => "E (End-of-period)",
        }
    }

    /// Parse from a full label (`A (Average)`), a code (`A`) or a name
    pub fn from_label(s: &str) -> Result<Self> {
        let s = s.trim();
        let head = s.split_whitespace().next().unwrap_or("");
        match head.to_uppercase().as_str() {
            "A" | "AVERAGE" => Ok(SeriesVariation::Average),
            "E" | "END-OF-PERIOD" => Ok(SeriesVariation::EndOfPeriod),
            _ => Err(FxError::SourceFormatError(format!(
                "Unknown series variation: '{}'",
                s
            ))),
        }
    }
}

impl FromStr for SeriesVariation {
    type Err = FxError;

    fn from_str(s: &str) -> Result<Self> {
        SeriesVariation::from_label(s)
    }
}

impl TryFrom<String> for SeriesVariation {
    type Error = FxError;

    fn try_from(value: String) -> Result<Self> {
        SeriesVariation::from_label(&value)
    }
}

impl From<SeriesVariation> for String {
    fn from(series: SeriesVariation) -> Self {
        series.label().to_string()
    }
}

impl fmt::Display for SeriesVariation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
