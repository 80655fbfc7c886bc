//! HTTP API for churn prediction, health checks and Prometheus metrics

use crate::error::ApiError;
use crate::validation::validate_request;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use churn_lib::{
    ChurnError, ChurnRequest, HealthResponse, InferenceService, ModelKey, ModelsResponse,
    PredictionResult, ReadinessResponse, ServiceMetrics, StructuredLogger,
};
use prometheus::{Encoder, TextEncoder};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Shared application state, immutable once built
pub struct AppState {
    pub service: InferenceService,
    pub metrics: ServiceMetrics,
    pub logger: StructuredLogger,
    /// Unix timestamp at which startup completed
    pub started_at: i64,
}

impl AppState {
    pub fn new(service: InferenceService, metrics: ServiceMetrics, logger: StructuredLogger) -> Self {
        Self {
            service,
            metrics,
            logger,
            started_at: chrono::Utc::now().timestamp(),
        }
    }
}

fn default_model_type() -> String {
    ModelKey::DEFAULT.to_string()
}

#[derive(Debug, Deserialize)]
pub struct PredictParams {
    #[serde(default = "default_model_type")]
    pub model_type: String,
}

/// Liveness probe
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

/// Readiness probe; the listener only exists after startup succeeded
async fn readyz(State(state): State<Arc<AppState>>) -> Json<ReadinessResponse> {
    Json(ReadinessResponse::from_service(&state.service, state.started_at))
}

async fn models(State(state): State<Arc<AppState>>) -> Json<ModelsResponse> {
    Json(ModelsResponse::from_service(&state.service))
}

async fn predict_churn(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PredictParams>, QueryRejection>,
    payload: Result<Json<ChurnRequest>, JsonRejection>,
) -> Result<Json<PredictionResult>, ApiError> {
    let Query(params) = query.map_err(|e| ApiError::Validation(e.body_text()))?;
    let Json(request) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;
    validate_request(&request)?;

    let start = Instant::now();
    let result = state
        .service
        .predict(&request, &params.model_type)
        .inspect_err(|err| match err {
            ChurnError::InvalidModelType { requested, .. } => {
                warn!(requested = %requested, "Unknown model type requested");
                state.metrics.inc_invalid_model_requests();
            }
            ChurnError::ScoringFailed { .. } => state.metrics.inc_scoring_errors(),
            _ => {}
        })?;
    let elapsed = start.elapsed();

    let model = params.model_type.to_ascii_lowercase();
    state.metrics.observe_prediction_latency(elapsed.as_secs_f64());
    state.metrics.inc_predictions(&model, result.churn_label);
    state.logger.log_prediction(
        &model,
        result.churn_probability,
        result.churn_label,
        elapsed.as_micros(),
    );

    Ok(Json(result))
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            Vec::new(),
        );
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/readyz", get(readyz))
        .route("/models", get(models))
        .route("/predict_churn", post(predict_churn))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server and run until Ctrl-C
pub async fn serve(addr: &str, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
