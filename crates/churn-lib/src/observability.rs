//! Observability infrastructure for the churn service
//!
//! Provides:
//! - Prometheus metrics (prediction latency, predictions by model and label, error counts)
//! - Structured JSON logging with tracing

use crate::models::QuantileSet;
use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, register_int_counter_vec,
    register_int_gauge, GaugeVec, Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::path::Path;
use std::sync::OnceLock;
use tracing::{info, warn};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.5,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ServiceMetricsInner> = OnceLock::new();

struct ServiceMetricsInner {
    prediction_latency_seconds: Histogram,
    predictions: IntCounterVec,
    invalid_model_requests: IntCounter,
    scoring_errors: IntCounter,
    models_loaded: IntGauge,
    model_info: GaugeVec,
}

impl ServiceMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "churn_server_prediction_latency_seconds",
                "Time spent building features and scoring a request",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions: register_int_counter_vec!(
                "churn_server_predictions_total",
                "Predictions served, by model and label",
                &["model", "label"]
            )
            .expect("Failed to register predictions_total"),

            invalid_model_requests: register_int_counter!(
                "churn_server_invalid_model_requests_total",
                "Requests naming a model that is not loaded"
            )
            .expect("Failed to register invalid_model_requests_total"),

            scoring_errors: register_int_counter!(
                "churn_server_scoring_errors_total",
                "Scorer failures and out-of-range probabilities"
            )
            .expect("Failed to register scoring_errors_total"),

            models_loaded: register_int_gauge!(
                "churn_server_models_loaded",
                "Number of models in the registry"
            )
            .expect("Failed to register models_loaded"),

            model_info: register_gauge_vec!(
                "churn_server_model_info",
                "Loaded models with their estimator and artifact checksum",
                &["model", "estimator", "checksum"]
            )
            .expect("Failed to register model_info"),
        }
    }
}

/// Service metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct ServiceMetrics {
    _private: (),
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ServiceMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ServiceMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    pub fn inc_predictions(&self, model: &str, label: u8) {
        self.inner()
            .predictions
            .with_label_values(&[model, if label == 1 { "1" } else { "0" }])
            .inc();
    }

    pub fn inc_invalid_model_requests(&self) {
        self.inner().invalid_model_requests.inc();
    }

    pub fn inc_scoring_errors(&self) {
        self.inner().scoring_errors.inc();
    }

    pub fn set_models_loaded(&self, count: i64) {
        self.inner().models_loaded.set(count);
    }

    pub fn set_model_info(&self, model: &str, estimator: &str, checksum: &str) {
        self.inner()
            .model_info
            .with_label_values(&[model, estimator, checksum])
            .set(1.0);
    }
}

/// Structured logger for service events
///
/// Provides consistent JSON-formatted logging for startup, model loading
/// and served predictions.
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn log_quantiles(&self, dataset: &Path, rows: usize, quantiles: &QuantileSet) {
        info!(
            event = "quantiles_computed",
            instance = %self.instance,
            dataset = %dataset.display(),
            rows = rows,
            skip_rate_q75 = quantiles.skip_rate_q75,
            listening_time_q25 = quantiles.listening_time_q25,
            age_q70 = quantiles.age_q70,
            "Reference quantiles computed"
        );
    }

    pub fn log_model_loaded(&self, model: &str, estimator: &str, checksum: &str) {
        info!(
            event = "model_loaded",
            instance = %self.instance,
            model = %model,
            estimator = %estimator,
            checksum = %checksum,
            "Scorer loaded"
        );
    }

    pub fn log_model_skipped(&self, model: &str) {
        info!(
            event = "model_skipped",
            instance = %self.instance,
            model = %model,
            "Optional model artifact absent, model not served"
        );
    }

    /// Training-time thresholds disagree with the serving dataset
    pub fn log_quantile_skew(&self, model: &str, training: &QuantileSet, serving: &QuantileSet) {
        warn!(
            event = "quantile_skew",
            instance = %self.instance,
            model = %model,
            training_skip_rate_q75 = training.skip_rate_q75,
            serving_skip_rate_q75 = serving.skip_rate_q75,
            training_listening_time_q25 = training.listening_time_q25,
            serving_listening_time_q25 = serving.listening_time_q25,
            training_age_q70 = training.age_q70,
            serving_age_q70 = serving.age_q70,
            "Model was trained with different quantile thresholds"
        );
    }

    pub fn log_prediction(&self, model: &str, probability: f64, label: u8, elapsed_us: u128) {
        info!(
            event = "prediction_served",
            instance = %self.instance,
            model = %model,
            churn_probability = probability,
            churn_label = label,
            elapsed_us = elapsed_us as u64,
            "Churn prediction served"
        );
    }

    pub fn log_startup(&self, version: &str, models: &[String], addr: &str) {
        info!(
            event = "server_started",
            instance = %self.instance,
            server_version = %version,
            models = ?models,
            addr = %addr,
            "Churn server started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "server_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Churn server shutting down"
        );
    }
}
