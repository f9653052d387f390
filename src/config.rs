//! Run configuration
//!
//! Loaded from TOML; every field has a default so an empty file is a valid
//! configuration (the ECB history API, year-end snapshots, `fxrates.csv`).
//!
//! ```toml
//! output = "fxrates.csv"
//! self_pairs = "exclude"
//!
//! [source]
//! kind = "spreadsheet_join"
//! path = "ecbfxrates.csv"
//! series = "A (Average)"
//!
//! [snapshot]
//! kind = "latest_per_year"
//! ```

use crate::data::frequency::{Frequency, SeriesVariation};
use crate::data::sources::SheetFormat;
use crate::engine::SelfPairPolicy;
use crate::error::{FxError, Result};
use crate::normalize::SnapshotPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// History endpoint used when no source is configured
pub const DEFAULT_API_URL: &str =
    "https://api.exchangeratesapi.io/history?start_at=2010-01-01&end_at=2020-01-01";

/// Where rates come from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Rates API over HTTP
    Api {
        url: String,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
    /// Saved rates API document
    JsonFile { path: PathBuf },
    /// Warehouse export, one frequency and series variation
    Spreadsheet {
        path: PathBuf,
        #[serde(default = "default_frequency")]
        frequency: Frequency,
        #[serde(default = "default_series")]
        series: SeriesVariation,
    },
    /// Warehouse export, daily spot and annual average sets joined
    SpreadsheetJoin {
        path: PathBuf,
        #[serde(default = "default_series")]
        series: SeriesVariation,
    },
}

impl SourceConfig {
    /// Snapshot policy used when none is configured
    pub fn default_snapshot(&self) -> SnapshotPolicy {
        match self {
            SourceConfig::Api { .. } | SourceConfig::JsonFile { .. } => SnapshotPolicy::YearEnd,
            SourceConfig::Spreadsheet { .. } | SourceConfig::SpreadsheetJoin { .. } => {
                SnapshotPolicy::LatestPerYear
            }
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Api {
            url: DEFAULT_API_URL.to_string(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_frequency() -> Frequency {
    Frequency::Annual
}

fn default_series() -> SeriesVariation {
    SeriesVariation::Average
}

fn default_output() -> PathBuf {
    PathBuf::from("fxrates.csv")
}

/// Configuration of one batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_output")]
    pub output: PathBuf,
    #[serde(default)]
    pub self_pairs: SelfPairPolicy,
    #[serde(default)]
    pub source: SourceConfig,
    /// Overrides the per-source default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<SnapshotPolicy>,
    #[serde(default)]
    pub sheet: SheetFormat,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            self_pairs: SelfPairPolicy::default(),
            source: SourceConfig::default(),
            snapshot: None,
            sheet: SheetFormat::default(),
        }
    }
}

impl RunConfig {
    /// Parse and validate TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: RunConfig =
            toml::from_str(text).map_err(|e| FxError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            FxError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| FxError::ConfigError(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.output.as_os_str().is_empty() {
            return Err(FxError::ConfigError("Output path is empty".to_string()));
        }
        if let SourceConfig::Api { url, timeout_secs } = &self.source {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(FxError::ConfigError(format!("Unsupported URL: '{}'", url)));
            }
            if *timeout_secs == 0 {
                return Err(FxError::ConfigError("timeout_secs must be positive".to_string()));
            }
        }
        if !self.sheet.delimiter.is_ascii() {
            return Err(FxError::ConfigError(format!(
                "Delimiter must be ASCII: '{}'",
                self.sheet.delimiter
            )));
        }
        if let Some(snapshot) = &self.snapshot {
            snapshot.validate()?;
        }
        Ok(())
    }

    /// Configured snapshot policy, or the source's default
    pub fn effective_snapshot(&self) -> SnapshotPolicy {
        self.snapshot
            .unwrap_or_else(|| self.source.default_snapshot())
    }
}
