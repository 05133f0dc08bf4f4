//! HTTP implementation of the bias API client.
//!
//! Each call issues exactly one request and parses the JSON body. There is
//! no retry, and no timeout unless one is configured.

use super::{ApiError, ApiResult, BiasBackend};
use crate::models::{CorrectionPayload, DetectionPayload, FullAnalysis, HealthStatus, TrainingBatch};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

/// Base URL of a locally running detection service.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

#[derive(Debug, Serialize)]
struct TextRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct CorrectRequest<'a> {
    text: &'a str,
    biases: &'a [String],
}

#[derive(Debug, Serialize)]
struct TrainingRequest {
    num_examples: usize,
}

/// Client for the detection service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    http_client: reqwest::Client,
}

impl HttpBackend {
    /// Create a client for `base_url` (e.g. `http://localhost:5000/api`).
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build().context("Failed to create HTTP client")?;

        let base_url = base_url.trim_end_matches('/').to_string();
        info!("Bias API client targeting {}", base_url);

        Ok(Self {
            base_url,
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        debug!("POST {}", url);
        let request = self.http_client.post(&url).json(body);
        self.execute(request, url).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let url = self.url(path);
        debug!("GET {}", url);
        let request = self.http_client.get(&url);
        self.execute(request, url).await
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder, url: String) -> ApiResult<T> {
        let response = request.send().await.map_err(|source| ApiError::Network {
            url: url.clone(),
            source,
        })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|source| ApiError::Network {
            url: url.clone(),
            source,
        })?;
        debug!("{} -> {} ({} bytes)", url, status, body.len());

        if !status.is_success() {
            return Err(ApiError::Backend {
                status: status.as_u16(),
                message: backend_message(&body, status),
            });
        }

        serde_json::from_slice(&body).map_err(|source| ApiError::Parse { url, source })
    }
}

/// Longest raw error body carried into an error message.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Pull the service's `{"error": ...}` message out of a failed response.
///
/// Non-JSON bodies (proxy pages and the like) are cut to
/// `MAX_ERROR_BODY_CHARS`.
fn backend_message(body: &[u8], status: reqwest::StatusCode) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(body) {
        if let Some(Value::String(message)) = map.get("error") {
            return message.clone();
        }
    }

    let text = String::from_utf8_lossy(body).trim().to_string();
    if text.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    } else if text.chars().count() > MAX_ERROR_BODY_CHARS {
        let cut: String = text.chars().take(MAX_ERROR_BODY_CHARS).collect();
        format!("{}...", cut)
    } else {
        text
    }
}

#[async_trait]
impl BiasBackend for HttpBackend {
    async fn detect_bias(&self, text: &str) -> ApiResult<DetectionPayload> {
        self.post("/detect", &TextRequest { text }).await
    }

    async fn correct_bias(&self, text: &str, biases: &[String]) -> ApiResult<CorrectionPayload> {
        self.post("/correct", &CorrectRequest { text, biases }).await
    }

    async fn full_analysis(&self, text: &str) -> ApiResult<FullAnalysis> {
        self.post("/analyze", &TextRequest { text }).await
    }

    async fn get_stats(&self) -> ApiResult<Value> {
        self.get("/stats").await
    }

    async fn generate_training_data(&self, num_examples: usize) -> ApiResult<TrainingBatch> {
        self.post("/training/generate", &TrainingRequest { num_examples })
            .await
    }

    async fn health(&self) -> ApiResult<HealthStatus> {
        self.get("/health").await
    }
}
