//! Data models for the bias analysis client.
//!
//! This module contains the wire payloads exchanged with the detection
//! service and the local result types the shell renders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Severity level of a bias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "Low"),
            Severity::Medium => write!(f, "Medium"),
            Severity::High => write!(f, "High"),
            Severity::Critical => write!(f, "Critical"),
        }
    }
}

impl Severity {
    /// Returns an emoji representation of the severity.
    pub fn emoji(&self) -> &'static str {
        match self {
            Severity::Low => "🟢",
            Severity::Medium => "🟡",
            Severity::High => "🟠",
            Severity::Critical => "🔴",
        }
    }
}

/// Static reference entry describing one category of reasoning error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BiasType {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub severity: Severity,
    pub examples: &'static [&'static str],
    /// Share of planted cases the backend is reported to catch, in percent.
    pub detection_rate: u8,
    /// Display color as a `#rrggbb` string.
    pub color: &'static str,
}

/// Response of `POST /detect`, also embedded in the full analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionPayload {
    #[serde(default)]
    pub text: String,
    pub biases_detected: Vec<String>,
    pub severity: Severity,
    pub confidence: f64,
    #[serde(default)]
    pub reasoning: Vec<String>,
}

/// Response of `POST /correct`, also embedded in the full analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrectionPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrected: Option<String>,
    #[serde(default)]
    pub biases_removed: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Vec<String>>,
}

/// Response of `POST /analyze`.
///
/// The service only attaches a correction when something was detected,
/// and sends `null` otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullAnalysis {
    pub detection: DetectionPayload,
    #[serde(default)]
    pub correction: Option<CorrectionPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// One synthetic example produced by the training generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub biased_text: String,
    pub corrected_text: String,
    pub bias_type: String,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Response of `POST /training/generate`. Only a sample of the examples
/// is returned; `count` is the total generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingBatch {
    #[serde(default)]
    pub examples: Vec<TrainingExample>,
    pub count: usize,
    #[serde(default)]
    pub message: String,
}

/// Typed view over the `GET /stats` payload.
///
/// The client hands stats back as raw JSON; this view is for rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemStats {
    #[serde(default)]
    pub total_detections: u64,
    #[serde(default)]
    pub total_corrections: u64,
    #[serde(default)]
    pub training_examples: u64,
    #[serde(default)]
    pub bias_distribution: HashMap<String, u64>,
    #[serde(default)]
    pub system_uptime: Option<String>,
    #[serde(default)]
    pub avg_latency_ms: Option<f64>,
}

impl SystemStats {
    /// Build the typed view from the raw stats payload.
    pub fn from_value(value: &Value) -> serde_json::Result<Self> {
        serde_json::from_value(value.clone())
    }
}

/// Response of `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub version: Option<String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

/// The locally displayed outcome of one analysis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Text the user submitted.
    pub input: String,
    pub biases_detected: Vec<String>,
    pub severity: Severity,
    pub confidence: f64,
    pub original_response: String,
    /// Debiased rewrite, or the input when the service returned none.
    pub corrected_response: String,
    pub reasoning: Vec<String>,
    pub recommendations: Vec<String>,
    pub analyzed_at: DateTime<Utc>,
}

impl AnalysisResult {
    /// Map a full analysis response onto the displayed fields.
    ///
    /// A missing or empty `corrected` falls back to the input text, and a
    /// missing recommendation list becomes empty.
    pub fn from_response(input: &str, response: FullAnalysis) -> Self {
        let FullAnalysis {
            detection,
            correction,
            ..
        } = response;
        let correction = correction.unwrap_or_default();

        let corrected_response = correction
            .corrected
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| input.to_string());

        Self {
            input: input.to_string(),
            biases_detected: detection.biases_detected,
            severity: detection.severity,
            confidence: detection.confidence,
            original_response: input.to_string(),
            corrected_response,
            reasoning: detection.reasoning,
            recommendations: correction.recommendations.unwrap_or_default(),
            analyzed_at: Utc::now(),
        }
    }

    /// Whether the service found any bias in the input.
    pub fn has_biases(&self) -> bool {
        !self.biases_detected.is_empty()
    }

    /// Whether the rewrite differs from what was submitted.
    pub fn was_corrected(&self) -> bool {
        self.corrected_response != self.original_response
    }
}
