//! Cross-rate table export
//!
//! Tables are written as CSV with a header row in [`COLUMNS`] order. Empty
//! cells stand for absent optional values (descriptions, rate type, tags).

use crate::engine::{CrossRate, COLUMNS};
use crate::error::{FxError, Result};
use csv::{ReaderBuilder, WriterBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Where an export landed
#[derive(Debug, Clone, PartialEq)]
pub struct ExportReport {
    /// Absolute path of the written file
    pub path: PathBuf,
    /// Absolute directory containing it
    pub directory: PathBuf,
    pub rows: usize,
}

/// Write the table to `path`, replacing any existing file
pub fn export_cross_rates(rates: &[CrossRate], path: &Path) -> Result<ExportReport> {
    if let Some(bad) = rates.iter().find(|r| !is_encodable(r)) {
        return Err(FxError::SerializationError(format!(
            "Non-finite rate for {} on {}",
            bad.pair(),
            bad.date
        )));
    }

    // Rows go to a temporary file next to the target, which replaces the
    // target only once every row is written
    let target_dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let unwritable = |reason: String| FxError::PathUnwritable {
        path: path.to_path_buf(),
        reason,
    };
    let staging = NamedTempFile::new_in(target_dir).map_err(|e| unwritable(e.to_string()))?;

    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(staging.as_file());
    writer
        .write_record(COLUMNS)
        .map_err(|e| FxError::SerializationError(e.to_string()))?;
    for rate in rates {
        writer
            .serialize(rate)
            .map_err(|e| FxError::SerializationError(e.to_string()))?;
    }
    writer.flush()?;
    drop(writer);

    staging
        .persist(path)
        .map_err(|e| unwritable(e.error.to_string()))?;

    let path = fs::canonicalize(path)?;
    let directory = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| path.clone());

    log::info!("File saved in path {}", directory.display());

    Ok(ExportReport {
        path,
        directory,
        rows: rates.len(),
    })
}

/// Read back a table written by [`export_cross_rates`]
pub fn read_cross_rates(path: &Path) -> Result<Vec<CrossRate>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| {
            FxError::SourceUnavailable(format!("Failed to open {}: {}", path.display(), e))
        })?;

    let headers = rdr
        .headers()
        .map_err(|e| FxError::SourceFormatError(format!("Failed to read headers: {}", e)))?;
    if !headers.iter().eq(COLUMNS.iter().copied()) {
        return Err(FxError::SourceFormatError(format!(
            "Unexpected columns in {}: {:?}",
            path.display(),
            headers
        )));
    }

    rdr.deserialize()
        .map(|row| row.map_err(|e| FxError::SourceFormatError(format!("Invalid row: {}", e))))
        .collect()
}

fn is_encodable(rate: &CrossRate) -> bool {
    [rate.base_rate_from, rate.base_rate_to, rate.from, rate.to]
        .iter()
        .all(|v| v.is_finite())
}
