//! Client side of the bias detection API.
//!
//! `BiasBackend` is the seam the shell drives; `HttpBackend` is the real
//! implementation talking JSON over HTTP.

pub mod error;
pub mod http;
#[cfg(test)]
pub(crate) mod test_server;

pub use error::{ApiError, ApiResult};
pub use http::{HttpBackend, DEFAULT_BASE_URL};

use crate::models::{CorrectionPayload, DetectionPayload, FullAnalysis, HealthStatus, TrainingBatch};
use async_trait::async_trait;
use serde_json::Value;

/// Operations offered by the detection service.
///
/// Every call is a single attempt; failures are returned to the caller
/// unchanged.
#[async_trait]
pub trait BiasBackend: Send + Sync {
    /// Detect biases without correcting.
    async fn detect_bias(&self, text: &str) -> ApiResult<DetectionPayload>;

    /// Rewrite `text` given previously detected bias identifiers.
    async fn correct_bias(&self, text: &str, biases: &[String]) -> ApiResult<CorrectionPayload>;

    /// Detect and correct in one request.
    async fn full_analysis(&self, text: &str) -> ApiResult<FullAnalysis>;

    /// Aggregate statistics, as the service sent them.
    async fn get_stats(&self) -> ApiResult<Value>;

    /// Ask the service to synthesize training examples.
    async fn generate_training_data(&self, num_examples: usize) -> ApiResult<TrainingBatch>;

    /// Liveness probe.
    async fn health(&self) -> ApiResult<HealthStatus>;
}
