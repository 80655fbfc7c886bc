//! API client for communicating with the churn server

use anyhow::{Context, Result};
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Error reported by the server in a non-success response
#[derive(Debug, Error)]
#[error("API error ({status}): {detail}")]
pub struct ApiError {
    pub status: u16,
    pub detail: String,
    pub available_models: Option<Vec<String>>,
}

/// API client for the churn server
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        self.get("health").await
    }

    pub async fn models(&self) -> Result<ModelsResponse> {
        self.get("models").await
    }

    /// Score a request with the given model key
    pub async fn predict(&self, request: &ChurnRequest, model_type: &str) -> Result<PredictionResponse> {
        let mut url = self.base_url.join("predict_churn").context("Invalid path")?;
        url.query_pairs_mut().append_pair("model_type", model_type);

        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .context("Failed to send request")?;

        parse(response).await
    }

    /// Make a GET request
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        parse(response).await
    }
}

async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let error = match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(parsed) => ApiError {
                status: status.as_u16(),
                detail: parsed.detail,
                available_models: parsed.available_models,
            },
            Err(_) => ApiError {
                status: status.as_u16(),
                detail: body,
                available_models: None,
            },
        };
        return Err(error.into());
    }

    response.json().await.context("Failed to parse response")
}

// API request and response types

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChurnRequest {
    pub age: u32,
    pub listening_time: u32,
    pub songs_played_per_day: u32,
    pub skip_rate: f64,
    pub gender: String,
    pub country: String,
    pub subscription_type: String,
    pub device_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub churn_probability: f64,
    pub churn_label: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSummary {
    pub key: String,
    pub estimator: String,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelSummary>,
    pub default: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_models: Option<Vec<String>>,
}
