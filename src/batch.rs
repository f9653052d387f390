//! One-shot batch run: source → normalize → cross rates → export

use crate::config::{RunConfig, SourceConfig};
use crate::data::frequency::{Frequency, SeriesVariation};
use crate::data::sources::{JsonFileSource, RateSource, SpreadsheetSource};
use crate::engine::{join_rate_types, CrossRate, CrossRateEngine};
use crate::error::Result;
use crate::export::{export_cross_rates, ExportReport};
use crate::normalize::SnapshotPolicy;
use std::path::Path;

#[cfg(feature = "http")]
use crate::data::sources::ApiRateSource;

/// Outcome of a batch run
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Normalized observations fed to the engine
    pub observations: usize,
    pub export: ExportReport,
}

impl RunReport {
    pub fn cross_rates(&self) -> usize {
        self.export.rows
    }
}

/// Execute the configured run
pub fn run(config: &RunConfig) -> Result<RunReport> {
    config.validate()?;
    let (observations, rates) = compute(config)?;
    let export = export_cross_rates(&rates, &config.output)?;

    log::info!(
        "Wrote {} cross rates from {} observations to {}",
        export.rows,
        observations,
        export.path.display()
    );

    Ok(RunReport {
        observations,
        export,
    })
}

/// Compute the cross-rate table without exporting it.
///
/// Returns the number of normalized observations alongside the rates.
pub fn compute(config: &RunConfig) -> Result<(usize, Vec<CrossRate>)> {
    let engine = CrossRateEngine::new(config.self_pairs);
    let snapshot = config.effective_snapshot();

    match &config.source {
        SourceConfig::Api { url, timeout_secs } => {
            let source = api_source(url, *timeout_secs, snapshot)?;
            single(&engine, &*source)
        }
        SourceConfig::JsonFile { path } => {
            single(&engine, &JsonFileSource::new(path, snapshot))
        }
        SourceConfig::Spreadsheet {
            path,
            frequency,
            series,
        } => single(
            &engine,
            &sheet_source(config, path, *frequency, *series, snapshot),
        ),
        SourceConfig::SpreadsheetJoin { path, series } => {
            let (spot_count, spot) = single(
                &engine,
                &sheet_source(config, path, Frequency::Daily, *series, snapshot),
            )?;
            let (annual_count, annual) = single(
                &engine,
                &sheet_source(config, path, Frequency::Annual, *series, snapshot),
            )?;
            Ok((spot_count + annual_count, join_rate_types(spot, annual)))
        }
    }
}

fn single(engine: &CrossRateEngine, source: &dyn RateSource) -> Result<(usize, Vec<CrossRate>)> {
    let table = source.load()?;
    log::info!(
        "Source '{}': {} observations, {} currencies, {} dates",
        source.name(),
        table.len(),
        table.currencies().len(),
        table.dates().len()
    );
    let rates = engine.compute(&table)?;
    Ok((table.len(), rates))
}

fn sheet_source(
    config: &RunConfig,
    path: &Path,
    frequency: Frequency,
    series: SeriesVariation,
    snapshot: SnapshotPolicy,
) -> SpreadsheetSource {
    SpreadsheetSource::new(path, frequency, series)
        .with_format(config.sheet.clone())
        .with_snapshot(snapshot)
}

#[cfg(feature = "http")]
fn api_source(url: &str, timeout_secs: u64, snapshot: SnapshotPolicy) -> Result<Box<dyn RateSource>> {
    let source = ApiRateSource::with_timeout(
        url,
        snapshot,
        std::time::Duration::from_secs(timeout_secs),
    )?;
    Ok(Box::new(source))
}

#[cfg(not(feature = "http"))]
fn api_source(url: &str, _timeout_secs: u64, _snapshot: SnapshotPolicy) -> Result<Box<dyn RateSource>> {
    Err(crate::error::FxError::ConfigError(format!(
        "Cannot fetch {}: built without the `http` feature",
        url
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FxError;
    use crate::export::read_cross_rates;
    use crate::types::RateType;
    use std::fs;
    use tempfile::tempdir;

    const SHEET: &str = "\
Frequency,Currency,Series variation - EXR context,Time period or range,Observation value
D (Daily),USD (US dollar),A (Average),2019-12-30,1.1217
D (Daily),USD (US dollar),A (Average),2019-12-31,1.1234
D (Daily),GBP (UK pound sterling),A (Average),2019-12-31,0.8508
D (Daily),JPY (Japanese yen),A (Average),2019-12-31,
A (Annual),USD (US dollar),A (Average),2019,1.1195
A (Annual),GBP (UK pound sterling),A (Average),2019,0.87777
A (Annual),JPY (Japanese yen),A (Average),2019,122.01
";

    #[test]
    fn test_spreadsheet_join_run() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("ecbfxrates.csv");
        fs::write(&input, SHEET).unwrap();

        let config = RunConfig {
            output: dir.path().join("fxrates.csv"),
            source: SourceConfig::SpreadsheetJoin {
                path: input,
                series: SeriesVariation::Average,
            },
            ..RunConfig::default()
        };

        let report = run(&config).unwrap();
        // Daily: USD, GBP (JPY has no value). Annual: USD, GBP, JPY.
        assert_eq!(report.observations, 5);
        assert_eq!(report.cross_rates(), 2 + 6);

        let rates = read_cross_rates(&report.export.path).unwrap();
        assert_eq!(rates.len(), 8);
        assert!(rates[..2]
            .iter()
            .all(|r| r.rate_type == Some(RateType::SpotRateAverage)
                && r.frequency == Some(Frequency::Daily)));
        assert!(rates[2..]
            .iter()
            .all(|r| r.rate_type == Some(RateType::AnnualAverage)
                && r.frequency == Some(Frequency::Annual)));
        assert!(!rates[..2]
            .iter()
            .any(|r| r.currency_from.as_str() == "JPY" || r.currency_to.as_str() == "JPY"));
    }

    #[test]
    fn test_json_file_run() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("rates.json");
        fs::write(
            &input,
            r#"{"rates": {"2019-12-31": {"USD": 1.1234, "GBP": 0.8508},
                          "2019-12-30": {"USD": 1.1217, "GBP": 0.8551}}}"#,
        )
        .unwrap();

        let config = RunConfig {
            output: dir.path().join("apifxrates.csv"),
            source: SourceConfig::JsonFile { path: input },
            ..RunConfig::default()
        };

        let report = run(&config).unwrap();
        assert_eq!(report.observations, 2);
        assert_eq!(report.cross_rates(), 2);
    }

    #[test]
    fn test_missing_source_aborts() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("fxrates.csv");
        let config = RunConfig {
            output: output.clone(),
            source: SourceConfig::Spreadsheet {
                path: dir.path().join("missing.csv"),
                frequency: Frequency::Annual,
                series: SeriesVariation::Average,
            },
            ..RunConfig::default()
        };

        assert!(matches!(run(&config), Err(FxError::SourceUnavailable(_))));
        assert!(!output.exists());
    }
}
