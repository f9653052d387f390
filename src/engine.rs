//! Cross-rate engine
//!
//! Pairs every observation with every other observation on the same date and
//! derives the rate between the two currencies from their base-currency
//! quotes: for rates `r_a` and `r_b` against the base,
//! `from = r_a / r_b` and `to = r_b / r_a`.

use crate::currency::{CurrencyCode, CurrencyPair};
use crate::data::frequency::{Frequency, SeriesVariation};
use crate::error::Result;
use crate::normalize::NormalizedTable;
use crate::types::{Observation, Rate, RateType};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// What to do with the `(A, A)` pairs of the self join
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelfPairPolicy {
    /// Drop identity pairs
    #[default]
    Exclude,
    /// Emit identity pairs with both rates set to exactly 1.0
    Identity,
}

/// One row of the cross-rate table, in export column order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossRate {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Currency From")]
    pub currency_from: CurrencyCode,
    #[serde(rename = "Currency From Description")]
    pub description_from: Option<String>,
    #[serde(rename = "Currency To")]
    pub currency_to: CurrencyCode,
    #[serde(rename = "Currency To Description")]
    pub description_to: Option<String>,
    /// Quote of `currency_from` against the base currency
    #[serde(rename = "Base Rate From")]
    pub base_rate_from: Rate,
    /// Quote of `currency_to` against the base currency
    #[serde(rename = "Base Rate To")]
    pub base_rate_to: Rate,
    /// `base_rate_from / base_rate_to`
    #[serde(rename = "From")]
    pub from: Rate,
    /// `base_rate_to / base_rate_from`
    #[serde(rename = "To")]
    pub to: Rate,
    #[serde(rename = "Rate Type")]
    pub rate_type: Option<RateType>,
    #[serde(rename = "Frequency")]
    pub frequency: Option<Frequency>,
    #[serde(rename = "Series variation - EXR context")]
    pub series: Option<SeriesVariation>,
}

/// Export column names, in order
pub const COLUMNS: [&str; 12] = [
    "Date",
    "Currency From",
    "Currency From Description",
    "Currency To",
    "Currency To Description",
    "Base Rate From",
    "Base Rate To",
    "From",
    "To",
    "Rate Type",
    "Frequency",
    "Series variation - EXR context",
];

impl CrossRate {
    /// Derive the cross rate of `from` against `to` on their shared date
    pub fn between(from: &Observation, to: &Observation) -> Result<Self> {
        debug_assert_eq!(from.date, to.date);

        // Identity pairs never divide, so their base rate is not checked
        let (rate_from, rate_to, ratio, reciprocal) = if from.code() == to.code() {
            (from.rate, to.rate, 1.0, 1.0)
        } else {
            let rate_from = from.checked_rate()?;
            let rate_to = to.checked_rate()?;
            (rate_from, rate_to, rate_from / rate_to, rate_to / rate_from)
        };

        Ok(Self {
            date: from.date,
            currency_from: from.code().clone(),
            description_from: from.currency.description.clone(),
            currency_to: to.code().clone(),
            description_to: to.currency.description.clone(),
            base_rate_from: rate_from,
            base_rate_to: rate_to,
            from: ratio,
            to: reciprocal,
            rate_type: None,
            frequency: from.frequency,
            series: from.series,
        })
    }

    pub fn pair(&self) -> CurrencyPair {
        CurrencyPair::new(self.currency_from.clone(), self.currency_to.clone())
    }

    pub fn with_rate_type(mut self, rate_type: RateType) -> Self {
        self.rate_type = Some(rate_type);
        self
    }
}

/// Self join of a normalized table on date
#[derive(Debug, Clone, Copy, Default)]
pub struct CrossRateEngine {
    self_pairs: SelfPairPolicy,
}

impl CrossRateEngine {
    pub fn new(self_pairs: SelfPairPolicy) -> Self {
        Self { self_pairs }
    }

    pub fn self_pairs(&self) -> SelfPairPolicy {
        self.self_pairs
    }

    /// Compute all ordered pairs per date.
    ///
    /// Output is ordered by date, then `from` code, then `to` code. Any rate
    /// taking part in a ratio must be finite and positive.
    pub fn compute(&self, table: &NormalizedTable) -> Result<Vec<CrossRate>> {
        let mut cross_rates = Vec::new();

        for (date, observations) in table.by_date() {
            let before = cross_rates.len();
            for from in &observations {
                for to in &observations {
                    if from.code() == to.code() && self.self_pairs == SelfPairPolicy::Exclude {
                        continue;
                    }
                    cross_rates.push(CrossRate::between(from, to)?);
                }
            }
            log::debug!(
                "{}: {} currencies, {} cross rates",
                date,
                observations.len(),
                cross_rates.len() - before
            );
        }

        log::info!(
            "Computed {} cross rates over {} dates",
            cross_rates.len(),
            table.dates().len()
        );
        Ok(cross_rates)
    }
}

/// Label and concatenate the two result sets of join mode, spot rates first
pub fn join_rate_types(spot: Vec<CrossRate>, annual: Vec<CrossRate>) -> Vec<CrossRate> {
    let mut joined = Vec::with_capacity(spot.len() + annual.len());
    joined.extend(
        spot.into_iter()
            .map(|rate| rate.with_rate_type(RateType::SpotRateAverage)),
    );
    joined.extend(
        annual
            .into_iter()
            .map(|rate| rate.with_rate_type(RateType::AnnualAverage)),
    );
    joined
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::CurrencyLabel;
    use crate::error::FxError;
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn obs(date: NaiveDate, label: &str, rate: f64) -> Observation {
        Observation::new(date, CurrencyLabel::parse(label).unwrap(), rate)
    }

    fn table(observations: Vec<Observation>) -> NormalizedTable {
        NormalizedTable::new(observations).unwrap()
    }

    fn find<'a>(rates: &'a [CrossRate], from: &str, to: &str) -> Option<&'a CrossRate> {
        rates
            .iter()
            .find(|r| r.currency_from.as_str() == from && r.currency_to.as_str() == to)
    }

    fn sample() -> NormalizedTable {
        let d = date(2019, 12, 31);
        table(vec![
            obs(d, "USD", 1.0),
            obs(d, "GBP", 0.9),
            obs(d, "JPY", 110.0),
        ])
    }

    #[test]
    fn test_cross_rates_values() {
        let rates = CrossRateEngine::default().compute(&sample()).unwrap();
        assert_eq!(rates.len(), 6);

        let usd_gbp = find(&rates, "USD", "GBP").unwrap();
        assert_relative_eq!(usd_gbp.from, 1.0 / 0.9);
        assert_relative_eq!(usd_gbp.to, 0.9);

        let gbp_usd = find(&rates, "GBP", "USD").unwrap();
        assert_relative_eq!(gbp_usd.from, 0.9);

        let usd_jpy = find(&rates, "USD", "JPY").unwrap();
        assert_relative_eq!(usd_jpy.from, 1.0 / 110.0);
        assert_relative_eq!(usd_jpy.base_rate_to, 110.0);

        assert!(find(&rates, "USD", "USD").is_none());
    }

    #[test]
    fn test_identity_pairs() {
        let engine = CrossRateEngine::new(SelfPairPolicy::Identity);
        let rates = engine.compute(&sample()).unwrap();
        assert_eq!(rates.len(), 9);

        let jpy_jpy = find(&rates, "JPY", "JPY").unwrap();
        assert_eq!(jpy_jpy.from, 1.0);
        assert_eq!(jpy_jpy.to, 1.0);
        assert!(jpy_jpy.pair().is_identity());
    }

    #[test]
    fn test_reciprocal_rows() {
        let rates = CrossRateEngine::default().compute(&sample()).unwrap();
        for rate in &rates {
            assert_relative_eq!(rate.from * rate.to, 1.0, epsilon = 1e-12);
            let inverse = find(&rates, rate.currency_to.as_str(), rate.currency_from.as_str()).unwrap();
            assert_relative_eq!(rate.from, inverse.to);
        }
    }

    #[test]
    fn test_only_same_date_pairs() {
        let rates = CrossRateEngine::default()
            .compute(&table(vec![
                obs(date(2018, 12, 31), "USD", 1.145),
                obs(date(2018, 12, 31), "GBP", 0.89453),
                obs(date(2019, 12, 31), "USD", 1.1234),
                obs(date(2019, 12, 31), "JPY", 121.94),
            ]))
            .unwrap();

        assert_eq!(rates.len(), 4);
        assert!(find(&rates, "GBP", "JPY").is_none());
        assert!(rates.windows(2).all(|w| w[0].date <= w[1].date));
    }

    #[test]
    fn test_output_order() {
        let rates = CrossRateEngine::default().compute(&sample()).unwrap();
        let pairs: Vec<String> = rates.iter().map(|r| r.pair().to_string()).collect();
        assert_eq!(
            pairs,
            vec!["GBP/JPY", "GBP/USD", "JPY/GBP", "JPY/USD", "USD/GBP", "USD/JPY"]
        );
    }

    #[test]
    fn test_zero_rate_is_invalid() {
        let d = date(2019, 12, 31);
        let result = CrossRateEngine::default().compute(&table(vec![obs(d, "USD", 1.0), obs(d, "XAU", 0.0)]));

        match result {
            Err(FxError::InvalidRate { currency, rate, .. }) => {
                assert_eq!(currency, "XAU");
                assert_eq!(rate, 0.0);
            }
            other => panic!("expected InvalidRate, got {:?}", other),
        }
    }

    #[test]
    fn test_lone_zero_rate_without_pairs() {
        // No partner on that date, so the rate is never a divisor
        let rates = CrossRateEngine::default()
            .compute(&table(vec![obs(date(2019, 12, 31), "XAU", 0.0)]))
            .unwrap();
        assert!(rates.is_empty());
    }

    #[test]
    fn test_lone_zero_rate_identity_pair() {
        let d = date(2019, 12, 31);
        let rates = CrossRateEngine::new(SelfPairPolicy::Identity)
            .compute(&table(vec![obs(d, "XAU", 0.0)]))
            .unwrap();

        assert_eq!(rates.len(), 1);
        assert_eq!(rates[0].from, 1.0);
        assert_eq!(rates[0].to, 1.0);
        assert_eq!(rates[0].base_rate_from, 0.0);
    }

    #[test]
    fn test_zero_rate_with_partner_identity_policy() {
        let d = date(2019, 12, 31);
        let result = CrossRateEngine::new(SelfPairPolicy::Identity)
            .compute(&table(vec![obs(d, "USD", 1.0), obs(d, "XAU", 0.0)]));
        assert!(matches!(result, Err(FxError::InvalidRate { .. })));
    }

    #[test]
    fn test_tags_and_descriptions_carried() {
        let d = date(2019, 12, 31);
        let rates = CrossRateEngine::default()
            .compute(&table(vec![
                obs(d, "USD (US dollar)", 1.1234).with_tags(Frequency::Daily, SeriesVariation::Average),
                obs(d, "GBP (UK pound sterling)", 0.8508).with_tags(Frequency::Daily, SeriesVariation::Average),
            ]))
            .unwrap();

        let usd_gbp = find(&rates, "USD", "GBP").unwrap();
        assert_eq!(usd_gbp.description_from.as_deref(), Some("US dollar"));
        assert_eq!(usd_gbp.description_to.as_deref(), Some("UK pound sterling"));
        assert_eq!(usd_gbp.frequency, Some(Frequency::Daily));
        assert_eq!(usd_gbp.series, Some(SeriesVariation::Average));
        assert_eq!(usd_gbp.rate_type, None);
    }

    #[test]
    fn test_join_rate_types() {
        let engine = CrossRateEngine::default();
        let spot = engine.compute(&sample()).unwrap();
        let annual = engine
            .compute(&table(vec![
                obs(date(2019, 12, 31), "USD", 1.1195),
                obs(date(2019, 12, 31), "GBP", 0.87777),
            ]))
            .unwrap();

        let joined = join_rate_types(spot.clone(), annual.clone());
        assert_eq!(joined.len(), spot.len() + annual.len());
        assert!(joined[..spot.len()]
            .iter()
            .all(|r| r.rate_type == Some(RateType::SpotRateAverage)));
        assert!(joined[spot.len()..]
            .iter()
            .all(|r| r.rate_type == Some(RateType::AnnualAverage)));
    }
}
