//! Error types for the HTTP layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use churn_lib::ChurnError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed body or out-of-range field, rejected before the core runs
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Churn(#[from] ChurnError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, json!({ "detail": msg })),
            ApiError::Churn(err @ ChurnError::InvalidModelType { available, .. }) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "detail": err.to_string(),
                    "available_models": available,
                }),
            ),
            ApiError::Churn(ChurnError::ScoringFailed { key, reason }) => {
                tracing::error!(model = %key, detail = %reason, "Scoring failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "detail": format!("Model '{}' failed to score the request", key) }),
                )
            }
            ApiError::Churn(err) => {
                tracing::error!(detail = %err, "Startup error surfaced at request time");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    json!({ "detail": "Service not initialized" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
