//! Rates API integration
//!
//! Reads the `history` document served by exchangeratesapi-style endpoints:
//!
//! ```json
//! { "rates": { "2019-12-31": { "USD": 1.1234, "GBP": 0.8508 } },
//!   "base": "EUR", "start_at": "2010-01-01", "end_at": "2020-01-01" }
//! ```

use super::RateSource;
use crate::error::{FxError, Result};
use crate::normalize::{normalize_rates, NormalizedTable, SnapshotPolicy};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[cfg(feature = "http")]
use reqwest::blocking::Client;
#[cfg(feature = "http")]
use std::time::Duration;

#[cfg(feature = "http")]
const DEFAULT_TIMEOUT_SECS: u64 = 30;
#[cfg(feature = "http")]
const USER_AGENT: &str = concat!("fx-crossrates/", env!("CARGO_PKG_VERSION"));

/// Top-level rates document
#[derive(Debug, Clone, Deserialize)]
pub struct RatesDocument {
    /// date -> (currency -> rate against `base`)
    pub rates: BTreeMap<String, BTreeMap<String, Option<f64>>>,
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub start_at: Option<String>,
    #[serde(default)]
    pub end_at: Option<String>,
}

impl RatesDocument {
    /// Parse a document from JSON text
    pub fn parse(text: &str) -> Result<Self> {
        let document: RatesDocument = serde_json::from_str(text)
            .map_err(|e| FxError::SourceFormatError(format!("Unexpected rates document: {}", e)))?;

        log::info!(
            "Rates document: base={} range={}..{} dates={}",
            document.base.as_deref().unwrap_or("?"),
            document.start_at.as_deref().unwrap_or("?"),
            document.end_at.as_deref().unwrap_or("?"),
            document.rates.len()
        );

        Ok(document)
    }

    /// Read and parse a saved document
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            FxError::SourceUnavailable(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&text)
    }

    /// Unpivot and apply the snapshot policy
    pub fn normalize(&self, snapshot: &SnapshotPolicy) -> Result<NormalizedTable> {
        let table = normalize_rates(&self.rates)?;
        Ok(table.select(snapshot))
    }
}

/// Rates API over HTTP (blocking)
#[cfg(feature = "http")]
pub struct ApiRateSource {
    url: String,
    snapshot: SnapshotPolicy,
    client: Client,
}

#[cfg(feature = "http")]
impl ApiRateSource {
    /// Create a new API source with the default timeout
    pub fn new(url: impl Into<String>, snapshot: SnapshotPolicy) -> Result<Self> {
        Self::with_timeout(url, snapshot, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create with a custom request timeout
    pub fn with_timeout(
        url: impl Into<String>,
        snapshot: SnapshotPolicy,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                FxError::SourceUnavailable(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            url: url.into(),
            snapshot,
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// GET the rates document
    pub fn fetch(&self) -> Result<RatesDocument> {
        log::info!("Fetching rates from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .map_err(|e| FxError::SourceUnavailable(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(FxError::SourceUnavailable(format!(
                "Rates API returned error: {}",
                response.status()
            )));
        }

        let text = response
            .text()
            .map_err(|e| FxError::SourceUnavailable(format!("Failed to read response: {}", e)))?;

        RatesDocument::parse(&text)
    }
}

#[cfg(feature = "http")]
impl RateSource for ApiRateSource {
    fn load(&self) -> Result<NormalizedTable> {
        self.fetch()?.normalize(&self.snapshot)
    }

    fn name(&self) -> &str {
        "api"
    }
}

/// Rates document saved to a local file
pub struct JsonFileSource {
    path: PathBuf,
    snapshot: SnapshotPolicy,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>, snapshot: SnapshotPolicy) -> Self {
        Self {
            path: path.into(),
            snapshot,
        }
    }
}

impl RateSource for JsonFileSource {
    fn load(&self) -> Result<NormalizedTable> {
        log::info!("Reading rates document {}", self.path.display());
        RatesDocument::from_path(&self.path)?.normalize(&self.snapshot)
    }

    fn name(&self) -> &str {
        "json_file"
    }
}
