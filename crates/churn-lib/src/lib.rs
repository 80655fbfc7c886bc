//! Core library for subscriber churn prediction
//!
//! This crate provides the inference-time pipeline:
//! - Reference quantile thresholds computed from a historical dataset
//! - Interaction feature construction
//! - Scorer artifacts and the model registry
//! - The inference service tying them together
//! - Health reporting and observability

pub mod error;
pub mod features;
pub mod health;
pub mod models;
pub mod observability;
pub mod quantiles;
pub mod registry;
pub mod scorer;
pub mod service;

pub use error::ChurnError;
pub use features::FeatureBuilder;
pub use health::{HealthResponse, HealthStatus, ModelSummary, ModelsResponse, ReadinessResponse};
pub use models::*;
pub use observability::{ServiceMetrics, StructuredLogger};
pub use quantiles::QuantileStore;
pub use registry::{LoadOutcome, ModelHandle, ModelKey, ModelRegistry};
pub use scorer::Scorer;
pub use service::{InferenceService, QuantileSkew};
