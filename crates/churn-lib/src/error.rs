//! Error taxonomy for the churn pipeline

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChurnError {
    /// Reference dataset missing or unreadable. Fatal at startup.
    #[error("Reference dataset unavailable at {}: {reason}", path.display())]
    DataUnavailable { path: PathBuf, reason: String },

    /// Scorer artifact missing or corrupt. Fatal at startup for required models.
    #[error("Model '{key}' unavailable at {}: {reason}", path.display())]
    ModelUnavailable {
        key: String,
        path: PathBuf,
        reason: String,
    },

    /// Requested model key is not loaded.
    #[error("Invalid model type. Use one of: {}", available.join(", "))]
    InvalidModelType {
        requested: String,
        available: Vec<String>,
    },

    /// Scorer failed or produced a value outside `[0, 1]`.
    #[error("Model '{key}' failed to score request: {reason}")]
    ScoringFailed { key: String, reason: String },
}

impl ChurnError {
    /// Returns true for errors that abort startup
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ChurnError::DataUnavailable { .. } | ChurnError::ModelUnavailable { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ChurnError>;
