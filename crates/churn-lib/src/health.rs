//! Health, readiness and model listing responses
//!
//! All state behind these reports is frozen at startup, so they are plain
//! snapshots of the inference service rather than live component tracking.

use crate::models::QuantileSet;
use crate::registry::{ModelHandle, ModelKey};
use crate::service::InferenceService;
use serde::{Deserialize, Serialize};

/// Liveness status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
}

/// Liveness response, always `{"status": "ok"}` once serving
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: HealthStatus::Ok,
        }
    }
}

/// Description of one loaded model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub key: String,
    pub estimator: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

impl From<&ModelHandle> for ModelSummary {
    fn from(handle: &ModelHandle) -> Self {
        Self {
            key: handle.key().to_string(),
            estimator: handle.estimator().to_string(),
            required: handle.key().is_required(),
            checksum: handle.checksum().map(str::to_string),
        }
    }
}

/// Model listing response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelSummary>,
    pub default: String,
}

impl ModelsResponse {
    pub fn from_service(service: &InferenceService) -> Self {
        Self {
            models: service.registry().handles().map(ModelSummary::from).collect(),
            default: ModelKey::DEFAULT.to_string(),
        }
    }
}

/// Readiness response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub models: Vec<String>,
    pub quantiles: QuantileSet,
    pub dataset_rows: usize,
    /// Unix timestamp of the end of startup
    pub started_at: i64,
}

impl ReadinessResponse {
    pub fn from_service(service: &InferenceService, started_at: i64) -> Self {
        Self {
            ready: true,
            models: service.available_keys(),
            quantiles: *service.quantiles(),
            dataset_rows: service.quantile_store().rows(),
            started_at,
        }
    }
}
