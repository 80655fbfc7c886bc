//! Reference quantile thresholds
//!
//! Computes the three thresholds used by the interaction features from the
//! historical dataset. The store is built once at startup and never mutated;
//! picking up a new dataset requires a restart.

use crate::error::{ChurnError, Result};
use crate::models::QuantileSet;
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Quantile of `skip_rate` above which a subscriber skips heavily
pub const SKIP_RATE_QUANTILE: f64 = 0.75;

/// Quantile of `listening_time` below which a subscriber listens little
pub const LISTENING_TIME_QUANTILE: f64 = 0.25;

/// Quantile of `age` above which a subscriber counts as older
pub const AGE_QUANTILE: f64 = 0.70;

/// Frozen quantile thresholds for the lifetime of the process
#[derive(Debug, Clone)]
pub struct QuantileStore {
    set: QuantileSet,
    source: Option<PathBuf>,
    rows: usize,
}

impl QuantileStore {
    /// Load the reference dataset and compute the thresholds
    pub fn initialize(dataset_path: impl AsRef<Path>) -> Result<Self> {
        let path = dataset_path.as_ref();
        let unavailable = |reason: String| ChurnError::DataUnavailable {
            path: path.to_path_buf(),
            reason,
        };

        let file = File::open(path).map_err(|e| unavailable(e.to_string()))?;
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(None)
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| unavailable(e.to_string()))?;

        let set = QuantileSet {
            skip_rate_q75: column_quantile(&df, "skip_rate", SKIP_RATE_QUANTILE)
                .map_err(unavailable)?,
            listening_time_q25: column_quantile(&df, "listening_time", LISTENING_TIME_QUANTILE)
                .map_err(unavailable)?,
            age_q70: column_quantile(&df, "age", AGE_QUANTILE).map_err(unavailable)?,
        };

        Ok(Self {
            set,
            source: Some(path.to_path_buf()),
            rows: df.height(),
        })
    }

    /// Wrap thresholds computed elsewhere, e.g. persisted next to a model
    pub fn from_set(set: QuantileSet) -> Self {
        Self {
            set,
            source: None,
            rows: 0,
        }
    }

    pub fn get(&self) -> &QuantileSet {
        &self.set
    }

    /// Dataset the thresholds were computed from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Number of dataset rows the thresholds were computed over
    pub fn rows(&self) -> usize {
        self.rows
    }
}

/// Linear-interpolation quantile of a numeric column, ignoring nulls
fn column_quantile(df: &DataFrame, name: &str, quantile: f64) -> std::result::Result<f64, String> {
    let column = df
        .column(name)
        .map_err(|_| format!("missing column '{}'", name))?;
    let series = column
        .as_materialized_series()
        .strict_cast(&DataType::Float64)
        .map_err(|e| format!("column '{}' is not numeric: {}", name, e))?;
    let values = series.f64().map_err(|e| e.to_string())?;

    values
        .quantile(quantile, QuantileMethod::Linear)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("column '{}' has no values", name))
}
