//! ECB statistical data warehouse exports
//!
//! The warehouse exports one row per observation with tag columns:
//!
//! ```text
//! Frequency,Currency,Series variation - EXR context,Time period or range,Observation value
//! D (Daily),USD (US dollar),A (Average),2019-12-31,1.1234
//! A (Annual),GBP (UK pound sterling),A (Average),2019,0.87777
//! ```

use super::RateSource;
use crate::data::frequency::{Frequency, SeriesVariation};
use crate::error::{FxError, Result};
use crate::normalize::{normalize_sheet_rows, NormalizedTable, SnapshotPolicy};
use chrono::{NaiveDate, NaiveDateTime, Weekday};
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Column layout of a warehouse export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetFormat {
    pub frequency_column: String,
    pub currency_column: String,
    pub series_column: String,
    pub period_column: String,
    pub value_column: String,
    /// Field delimiter
    pub delimiter: char,
}

impl Default for SheetFormat {
    fn default() -> Self {
        Self {
            frequency_column: "Frequency".to_string(),
            currency_column: "Currency".to_string(),
            series_column: "Series variation - EXR context".to_string(),
            period_column: "Time period or range".to_string(),
            value_column: "Observation value".to_string(),
            delimiter: ',',
        }
    }
}

/// One raw warehouse row, every field kept as written.
///
/// Period and value are only parsed for rows that pass [`SheetRow::matches`],
/// so rows of other frequencies never fail a load.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRow {
    /// 1-based line in the export, header included
    pub line: usize,
    pub frequency: String,
    pub currency: String,
    pub series: String,
    pub period: String,
    pub value: String,
}

impl SheetRow {
    /// Tags parse to the given frequency and series variation
    pub fn matches(&self, frequency: Frequency, series: SeriesVariation) -> bool {
        Frequency::from_label(&self.frequency).ok() == Some(frequency)
            && SeriesVariation::from_label(&self.series).ok() == Some(series)
    }

    /// Last day of the observation period
    pub fn period_end(&self) -> Result<NaiveDate> {
        parse_period(&self.period).ok_or_else(|| {
            FxError::SourceFormatError(format!(
                "Invalid time period at line {}: '{}'",
                self.line, self.period
            ))
        })
    }

    /// Observation value, `None` when missing
    pub fn observation_value(&self) -> Result<Option<f64>> {
        parse_value(&self.value).map_err(|_| {
            FxError::SourceFormatError(format!(
                "Invalid observation value at line {}: '{}'",
                self.line, self.value
            ))
        })
    }
}

/// Warehouse export reader, filtered to one frequency and series variation
pub struct SpreadsheetSource {
    path: PathBuf,
    format: SheetFormat,
    frequency: Frequency,
    series: SeriesVariation,
    snapshot: SnapshotPolicy,
}

impl SpreadsheetSource {
    /// Create a source with the default column layout and latest-per-year snapshots
    pub fn new(path: impl Into<PathBuf>, frequency: Frequency, series: SeriesVariation) -> Self {
        Self {
            path: path.into(),
            format: SheetFormat::default(),
            frequency,
            series,
            snapshot: SnapshotPolicy::LatestPerYear,
        }
    }

    pub fn with_format(mut self, format: SheetFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_snapshot(mut self, snapshot: SnapshotPolicy) -> Self {
        self.snapshot = snapshot;
        self
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn series(&self) -> SeriesVariation {
        self.series
    }

    /// Read every row of the export
    pub fn read_rows(&self) -> Result<Vec<SheetRow>> {
        read_rows(&self.path, &self.format)
    }
}

impl RateSource for SpreadsheetSource {
    fn load(&self) -> Result<NormalizedTable> {
        log::info!(
            "Reading {} ({} / {})",
            self.path.display(),
            self.frequency,
            self.series
        );
        let rows = self.read_rows()?;
        let table = normalize_sheet_rows(&rows, self.frequency, self.series)?;
        Ok(table.select(&self.snapshot))
    }

    fn name(&self) -> &str {
        "spreadsheet"
    }
}

/// Read all rows of a warehouse export
pub fn read_rows(path: &Path, format: &SheetFormat) -> Result<Vec<SheetRow>> {
    let delimiter = u8::try_from(format.delimiter).map_err(|_| {
        FxError::ConfigError(format!("Delimiter must be ASCII: '{}'", format.delimiter))
    })?;

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)
        .map_err(|e| {
            FxError::SourceUnavailable(format!("Failed to open {}: {}", path.display(), e))
        })?;

    let headers = rdr
        .headers()
        .map_err(|e| FxError::SourceFormatError(format!("Failed to read headers: {}", e)))?
        .clone();

    let frequency_idx = find_column(&headers, &format.frequency_column)?;
    let currency_idx = find_column(&headers, &format.currency_column)?;
    let series_idx = find_column(&headers, &format.series_column)?;
    let period_idx = find_column(&headers, &format.period_column)?;
    let value_idx = find_column(&headers, &format.value_column)?;

    let mut rows = Vec::new();
    for (line, result) in rdr.records().enumerate() {
        // Header is line 1
        let line = line + 2;
        let record = result
            .map_err(|e| FxError::SourceFormatError(format!("Failed to read record: {}", e)))?;

        let field = |idx: usize| record.get(idx).unwrap_or("").trim().to_string();

        rows.push(SheetRow {
            line,
            frequency: field(frequency_idx),
            currency: field(currency_idx),
            series: field(series_idx),
            period: field(period_idx),
            value: field(value_idx),
        });
    }

    log::debug!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Find column index by name
fn find_column(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
        .ok_or_else(|| FxError::SourceFormatError(format!("Column '{}' not found", name)))
}

/// Empty, `NaN` and `-` mean the observation is missing
fn parse_value(s: &str) -> std::result::Result<Option<f64>, std::num::ParseFloatError> {
    if s.is_empty() || s == "-" || s.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    s.parse::<f64>().map(Some)
}

/// Parse a period to the last calendar day it covers.
///
/// `2019-12-31`, `2019-12-31 00:00:00`, `2019-12` (month), `2019-W52` (ISO
/// week, ends on Sunday), `2019Q4` (quarter), `2019-S2` (half year) and
/// `2019` (year) are recognised. The dash before `W`, `Q` and `S` is optional.
pub fn parse_period(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    if let Some((year, week)) = split_period(s, 'W') {
        return NaiveDate::from_isoywd_opt(year, week, Weekday::Sun);
    }
    if let Some((year, quarter)) = split_period(s, 'Q') {
        if !(1..=4).contains(&quarter) {
            return None;
        }
        return month_end(year, quarter * 3);
    }
    if let Some((year, half)) = split_period(s, 'S') {
        if !(1..=2).contains(&half) {
            return None;
        }
        return month_end(year, half * 6);
    }
    if let Some((year, month)) = s.split_once('-') {
        return month_end(year.parse().ok()?, month.parse().ok()?);
    }
    if s.len() == 4 {
        return NaiveDate::from_ymd_opt(s.parse().ok()?, 12, 31);
    }
    None
}

/// `YYYY<tag>N` or `YYYY-<tag>N`
fn split_period(s: &str, tag: char) -> Option<(i32, u32)> {
    let (year, number) = s.split_once(tag)?;
    let year = year.strip_suffix('-').unwrap_or(year);
    Some((year.parse().ok()?, number.parse().ok()?))
}

fn month_end(year: i32, month: u32) -> Option<NaiveDate> {
    let next = match month {
        12 => NaiveDate::from_ymd_opt(year + 1, 1, 1)?,
        1..=11 => NaiveDate::from_ymd_opt(year, month + 1, 1)?,
        _ => return None,
    };
    next.pred_opt()
}
