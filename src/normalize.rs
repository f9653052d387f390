//! Normalization of wide rate tables into long `(date, currency, rate)` rows
//!
//! Both source variants funnel through here:
//!
//! - the JSON API document (`date -> {currency -> rate}`) via [`normalize_rates`]
//! - tagged spreadsheet rows via [`normalize_sheet_rows`]
//!
//! The result is a [`NormalizedTable`], sorted by `(date, currency)` and unique
//! on that key. Snapshot dates are then picked with an explicit
//! [`SnapshotPolicy`].

use crate::currency::{CurrencyCode, CurrencyLabel};
use crate::data::frequency::{Frequency, SeriesVariation};
use crate::data::sources::spreadsheet::SheetRow;
use crate::error::{FxError, Result};
use crate::types::Observation;
use chrono::{Datelike, NaiveDate};
use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Date format of the keys in the rates API document
pub const API_DATE_FORMAT: &str = "%Y-%m-%d";

/// Observations sorted by `(date, currency code)`, unique on that key
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedTable {
    observations: Vec<Observation>,
}

impl NormalizedTable {
    /// Build a table, rejecting repeated `(date, currency)` keys
    pub fn new(mut observations: Vec<Observation>) -> Result<Self> {
        observations.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.code().cmp(b.code())));

        if let Some(pair) = observations
            .windows(2)
            .find(|w| w[0].date == w[1].date && w[0].code() == w[1].code())
        {
            return Err(FxError::SourceFormatError(format!(
                "Duplicate observation for {} on {}",
                pair[0].code(),
                pair[0].date
            )));
        }

        Ok(Self { observations })
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Observation> {
        self.observations.iter()
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn into_observations(self) -> Vec<Observation> {
        self.observations
    }

    /// Distinct dates, ascending
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self.observations.iter().map(|o| o.date).collect();
        dates.dedup();
        dates
    }

    /// Distinct currency codes, ascending
    pub fn currencies(&self) -> BTreeSet<CurrencyCode> {
        self.observations.iter().map(|o| o.code().clone()).collect()
    }

    /// Observations grouped by date
    pub fn by_date(&self) -> BTreeMap<NaiveDate, Vec<&Observation>> {
        let mut groups: BTreeMap<NaiveDate, Vec<&Observation>> = BTreeMap::new();
        for obs in &self.observations {
            groups.entry(obs.date).or_default().push(obs);
        }
        groups
    }

    /// Keep only the snapshot dates chosen by `policy`
    pub fn select(&self, policy: &SnapshotPolicy) -> NormalizedTable {
        let observations: Vec<Observation> = match *policy {
            SnapshotPolicy::All => self.observations.clone(),
            SnapshotPolicy::YearEnd => self.on_day_of_year(12, 31),
            SnapshotPolicy::DayOfYear { month, day } => self.on_day_of_year(month, day),
            SnapshotPolicy::LatestPerYear => self.latest_per_year(),
            SnapshotPolicy::ObservedExtremes => self.observed_extremes(),
        };

        if observations.is_empty() && !self.is_empty() {
            log::warn!(
                "Snapshot policy '{}' selected no observations out of {}",
                policy,
                self.len()
            );
        } else {
            log::debug!(
                "Snapshot policy '{}' kept {} of {} observations",
                policy,
                observations.len(),
                self.len()
            );
        }

        // Subset of a sorted, unique table stays sorted and unique
        NormalizedTable { observations }
    }

    fn on_day_of_year(&self, month: u32, day: u32) -> Vec<Observation> {
        self.observations
            .iter()
            .filter(|o| o.date.month() == month && o.date.day() == day)
            .cloned()
            .collect()
    }

    fn latest_per_year(&self) -> Vec<Observation> {
        // Sorted by date, so the last index written per key is the latest
        let mut latest: HashMap<(i32, &CurrencyCode), usize> = HashMap::new();
        for (idx, obs) in self.observations.iter().enumerate() {
            latest.insert((obs.date.year(), obs.code()), idx);
        }
        let keep: HashSet<usize> = latest.into_values().collect();

        self.observations
            .iter()
            .enumerate()
            .filter(|(idx, _)| keep.contains(idx))
            .map(|(_, obs)| obs.clone())
            .collect()
    }

    fn observed_extremes(&self) -> Vec<Observation> {
        log::warn!(
            "Using observed day/month extremes to pick snapshot dates; \
             data that does not reach year-end will select the wrong dates"
        );
        let max_day = self.observations.iter().map(|o| o.date.day()).max();
        let max_month = self.observations.iter().map(|o| o.date.month()).max();

        match (max_day, max_month) {
            (Some(day), Some(month)) => self.on_day_of_year(month, day),
            _ => Vec::new(),
        }
    }
}

impl<'a> IntoIterator for &'a NormalizedTable {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.observations.iter()
    }
}

/// How snapshot dates are picked from a normalized table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SnapshotPolicy {
    /// Keep every observed date
    All,
    /// 31 December only
    YearEnd,
    /// A fixed calendar day in every year
    DayOfYear { month: u32, day: u32 },
    /// Latest observation per (year, currency)
    LatestPerYear,
    /// Dates matching the largest day-of-month and month seen anywhere in the data
    ObservedExtremes,
}

impl SnapshotPolicy {
    /// Check calendar fields of `DayOfYear`
    pub fn validate(&self) -> Result<()> {
        if let SnapshotPolicy::DayOfYear { month, day } = *self {
            // 2000 is a leap year, so 02-29 is accepted
            if NaiveDate::from_ymd_opt(2000, month, day).is_none() {
                return Err(FxError::ConfigError(format!(
                    "Invalid snapshot day: month {} day {}",
                    month, day
                )));
            }
        }
        Ok(())
    }
}

impl FromStr for SnapshotPolicy {
    type Err = FxError;

    /// Accepts `all`, `year-end`, `latest-per-year`, `observed-extremes` or `MM-DD`
    fn from_str(s: &str) -> Result<Self> {
        let policy = match s.trim().to_lowercase().replace('_', "-").as_str() {
            "all" => SnapshotPolicy::All,
            "year-end" => SnapshotPolicy::YearEnd,
            "latest-per-year" => SnapshotPolicy::LatestPerYear,
            "observed-extremes" => SnapshotPolicy::ObservedExtremes,
            other => {
                let (month, day) = other
                    .split_once('-')
                    .and_then(|(m, d)| Some((m.parse().ok()?, d.parse().ok()?)))
                    .ok_or_else(|| {
                        FxError::ConfigError(format!("Unknown snapshot policy: '{}'", s))
                    })?;
                SnapshotPolicy::DayOfYear { month, day }
            }
        };
        policy.validate()?;
        Ok(policy)
    }
}

impl fmt::Display for SnapshotPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotPolicy::All => write!(f, "all"),
            SnapshotPolicy::YearEnd => write!(f, "year-end"),
            SnapshotPolicy::DayOfYear { month, day } => write!(f, "{:02}-{:02}", month, day),
            SnapshotPolicy::LatestPerYear => write!(f, "latest-per-year"),
            SnapshotPolicy::ObservedExtremes => write!(f, "observed-extremes"),
        }
    }
}

/// Unpivot the API's `date -> {currency -> rate}` mapping.
///
/// `null` rates are dropped.
pub fn normalize_rates(
    rates: &BTreeMap<String, BTreeMap<String, Option<f64>>>,
) -> Result<NormalizedTable> {
    let mut observations = Vec::new();
    let mut missing = 0usize;

    for (date_str, quotes) in rates {
        let date = NaiveDate::parse_from_str(date_str.trim(), API_DATE_FORMAT).map_err(|e| {
            FxError::SourceFormatError(format!("Invalid date key '{}': {}", date_str, e))
        })?;

        for (code, rate) in quotes {
            let code = CurrencyCode::new(code)?;
            match rate {
                Some(rate) => observations.push(Observation::new(date, CurrencyLabel::bare(code), *rate)),
                None => missing += 1,
            }
        }
    }

    if missing > 0 {
        log::debug!("Dropped {} quotes without a rate", missing);
    }

    NormalizedTable::new(observations)
}

/// Filter tagged spreadsheet rows to one frequency/series and normalize them.
///
/// Rows without an observation value are dropped.
pub fn normalize_sheet_rows(
    rows: &[SheetRow],
    frequency: Frequency,
    series: SeriesVariation,
) -> Result<NormalizedTable> {
    let mut observations = Vec::new();
    let mut missing = 0usize;

    for row in rows.iter().filter(|row| row.matches(frequency, series)) {
        let Some(value) = row.observation_value()? else {
            missing += 1;
            continue;
        };
        let currency = CurrencyLabel::parse(&row.currency)?;
        observations.push(Observation::new(row.period_end()?, currency, value).with_tags(frequency, series));
    }

    log::debug!(
        "{} of {} rows matched {} / {} ({} without a value)",
        observations.len() + missing,
        rows.len(),
        frequency,
        series,
        missing
    );

    NormalizedTable::new(observations)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn obs(date: NaiveDate, code: &str, rate: f64) -> Observation {
        Observation::new(date, CurrencyLabel::parse(code).unwrap(), rate)
    }

    fn rates_map(entries: &[(&str, &[(&str, Option<f64>)])]) -> BTreeMap<String, BTreeMap<String, Option<f64>>> {
        entries
            .iter()
            .map(|(d, quotes)| {
                (
                    d.to_string(),
                    quotes.iter().map(|(c, r)| (c.to_string(), *r)).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_table_sorted_by_date_then_code() {
        let table = NormalizedTable::new(vec![
            obs(date(2019, 12, 31), "USD", 1.12),
            obs(date(2018, 12, 31), "USD", 1.14),
            obs(date(2019, 12, 31), "GBP", 0.85),
        ])
        .unwrap();

        let keys: Vec<(NaiveDate, &str)> = table.iter().map(|o| (o.date, o.code().as_str())).collect();
        assert_eq!(
            keys,
            vec![
                (date(2018, 12, 31), "USD"),
                (date(2019, 12, 31), "GBP"),
                (date(2019, 12, 31), "USD"),
            ]
        );
        assert_eq!(table.dates(), vec![date(2018, 12, 31), date(2019, 12, 31)]);
        assert_eq!(table.currencies().len(), 2);
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let result = NormalizedTable::new(vec![
            obs(date(2019, 12, 31), "USD", 1.12),
            obs(date(2019, 12, 31), "USD", 1.13),
        ]);
        assert!(matches!(result, Err(FxError::SourceFormatError(_))));
    }

    #[test]
    fn test_normalize_rates_unpivots() {
        let rates = rates_map(&[
            ("2019-12-31", &[("USD", Some(1.1234)), ("GBP", Some(0.8508))]),
            ("2018-12-31", &[("USD", Some(1.145)), ("GBP", None)]),
        ]);

        let table = normalize_rates(&rates).unwrap();
        assert_eq!(table.len(), 3);
        assert!(table.iter().all(|o| o.frequency.is_none()));
        assert!(!table
            .iter()
            .any(|o| o.date == date(2018, 12, 31) && o.code().as_str() == "GBP"));
    }

    #[test]
    fn test_normalize_rates_bad_date() {
        let rates = rates_map(&[("31/12/2019", &[("USD", Some(1.12))])]);
        assert!(matches!(
            normalize_rates(&rates),
            Err(FxError::SourceFormatError(_))
        ));
    }

    #[test]
    fn test_select_year_end() {
        let table = NormalizedTable::new(vec![
            obs(date(2019, 12, 30), "USD", 1.12),
            obs(date(2019, 12, 31), "USD", 1.1234),
            obs(date(2020, 6, 30), "USD", 1.12),
        ])
        .unwrap();

        let selected = table.select(&SnapshotPolicy::YearEnd);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected.observations()[0].date, date(2019, 12, 31));

        let selected = table.select(&SnapshotPolicy::DayOfYear { month: 6, day: 30 });
        assert_eq!(selected.dates(), vec![date(2020, 6, 30)]);

        assert_eq!(table.select(&SnapshotPolicy::All), table);
    }

    #[test]
    fn test_select_latest_per_year() {
        let table = NormalizedTable::new(vec![
            obs(date(2019, 12, 30), "USD", 1.12),
            obs(date(2019, 12, 31), "USD", 1.1234),
            obs(date(2019, 12, 30), "GBP", 0.85),
            obs(date(2020, 3, 1), "USD", 1.10),
        ])
        .unwrap();

        let selected = table.select(&SnapshotPolicy::LatestPerYear);
        let keys: Vec<(NaiveDate, &str)> =
            selected.iter().map(|o| (o.date, o.code().as_str())).collect();
        assert_eq!(
            keys,
            vec![
                (date(2019, 12, 30), "GBP"),
                (date(2019, 12, 31), "USD"),
                (date(2020, 3, 1), "USD"),
            ]
        );
    }

    #[test]
    fn test_select_observed_extremes() {
        // Max day 31 and max month 6 never occur together
        let table = NormalizedTable::new(vec![
            obs(date(2020, 1, 31), "USD", 1.11),
            obs(date(2020, 6, 30), "USD", 1.12),
        ])
        .unwrap();

        let selected = table.select(&SnapshotPolicy::ObservedExtremes);
        assert!(selected.is_empty());

        let table = NormalizedTable::new(vec![
            obs(date(2018, 12, 31), "USD", 1.14),
            obs(date(2019, 12, 31), "USD", 1.12),
            obs(date(2019, 11, 29), "USD", 1.10),
        ])
        .unwrap();
        let selected = table.select(&SnapshotPolicy::ObservedExtremes);
        assert_eq!(selected.dates(), vec![date(2018, 12, 31), date(2019, 12, 31)]);
    }

    #[test]
    fn test_snapshot_policy_from_str() {
        assert_eq!("all".parse::<SnapshotPolicy>().unwrap(), SnapshotPolicy::All);
        assert_eq!("year-end".parse::<SnapshotPolicy>().unwrap(), SnapshotPolicy::YearEnd);
        assert_eq!(
            "latest_per_year".parse::<SnapshotPolicy>().unwrap(),
            SnapshotPolicy::LatestPerYear
        );
        assert_eq!(
            "06-30".parse::<SnapshotPolicy>().unwrap(),
            SnapshotPolicy::DayOfYear { month: 6, day: 30 }
        );
        assert!("02-30".parse::<SnapshotPolicy>().is_err());
        assert!("13-01".parse::<SnapshotPolicy>().is_err());
        assert!("sometimes".parse::<SnapshotPolicy>().is_err());
    }

    #[test]
    fn test_snapshot_policy_display_parses_back() {
        for policy in [
            SnapshotPolicy::All,
            SnapshotPolicy::YearEnd,
            SnapshotPolicy::DayOfYear { month: 3, day: 31 },
            SnapshotPolicy::LatestPerYear,
            SnapshotPolicy::ObservedExtremes,
        ] {
            assert_eq!(policy.to_string().parse::<SnapshotPolicy>().unwrap(), policy);
        }
    }
}
