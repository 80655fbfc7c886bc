//! HTTP transport for the churn inference service
//!
//! Validates requests, hands them to the inference core and renders results
//! and errors as JSON.

pub mod api;
pub mod config;
pub mod error;
pub mod startup;
pub mod validation;

pub use api::{create_router, serve, AppState};
pub use config::ServerConfig;
pub use error::ApiError;
