//! Interactive analysis session.
//!
//! Holds the text being analyzed, the busy flag and the last result. A run
//! goes idle → busy → idle; failures turn into a single alert and never
//! touch the stored result.

use crate::client::BiasBackend;
use crate::models::AnalysisResult;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::{debug, error, info};

/// Message shown to the user when an analysis request fails for any reason.
pub const ANALYSIS_ALERT: &str =
    "Failed to analyze. Make sure the bias detection API is running and reachable.";

/// What happened when analysis was triggered.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    /// Nothing to do: empty input, or a request is already in flight.
    Skipped,
    /// The service answered and the result was stored.
    Completed,
    /// The request failed; carries the alert to show.
    Failed { alert: String },
}

/// One view's worth of analysis state.
pub struct AnalysisSession<B: BiasBackend> {
    backend: B,
    input: String,
    busy: bool,
    result: Option<AnalysisResult>,
    show_progress: bool,
}

impl<B: BiasBackend> AnalysisSession<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            input: String::new(),
            busy: false,
            result: None,
            show_progress: false,
        }
    }

    /// Show a spinner on the terminal while a request is in flight.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    #[cfg(test)]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Run one full analysis of the current input.
    pub async fn run_analysis(&mut self) -> AnalysisOutcome {
        if self.input.trim().is_empty() {
            debug!("Empty input, skipping analysis");
            return AnalysisOutcome::Skipped;
        }
        if self.is_busy() {
            debug!("Analysis already in flight, ignoring trigger");
            return AnalysisOutcome::Skipped;
        }

        let input = self.input.clone();
        let response = {
            let _busy = BusyGuard::engage(&mut self.busy);
            let spinner = self.show_progress.then(start_spinner);

            let response = self.backend.full_analysis(&input).await;

            if let Some(spinner) = spinner {
                spinner.finish_and_clear();
            }
            response
        };

        match response {
            Ok(response) => {
                let result = AnalysisResult::from_response(&input, response);
                info!(
                    "Analysis complete: {} bias(es), severity {}, confidence {}",
                    result.biases_detected.len(),
                    result.severity,
                    result.confidence
                );
                self.result = Some(result);
                AnalysisOutcome::Completed
            }
            Err(e) => {
                if e.is_network() {
                    error!("Bias API unreachable: {}", e);
                } else {
                    error!("Analysis failed: {}", e);
                }
                AnalysisOutcome::Failed {
                    alert: ANALYSIS_ALERT.to_string(),
                }
            }
        }
    }

    /// Analyze each text in turn, one request at a time.
    ///
    /// Blank entries are skipped. Returns the successful results and the
    /// number of failed requests.
    pub async fn run_batch<I, S>(&mut self, texts: I) -> (Vec<AnalysisResult>, usize)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut results = Vec::new();
        let mut failed = 0;

        for text in texts {
            self.set_input(text);
            match self.run_analysis().await {
                AnalysisOutcome::Completed => {
                    if let Some(result) = self.result.clone() {
                        results.push(result);
                    }
                }
                AnalysisOutcome::Failed { .. } => failed += 1,
                AnalysisOutcome::Skipped => {}
            }
        }

        (results, failed)
    }
}

/// Holds the busy flag for the length of one request.
///
/// Dropping the guard clears the flag, so a run whose future is dropped
/// mid-request still returns the session to idle.
struct BusyGuard<'a> {
    busy: &'a mut bool,
}

impl<'a> BusyGuard<'a> {
    fn engage(busy: &'a mut bool) -> Self {
        *busy = true;
        Self { busy }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        *self.busy = false;
    }
}

fn start_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]") {
        spinner.set_style(style);
    }
    spinner.set_message("Analyzing...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::test_server::{unreachable_url, TestServer};
    use crate::client::{ApiError, ApiResult, HttpBackend};
    use crate::models::{
        CorrectionPayload, DetectionPayload, FullAnalysis, HealthStatus, Severity, TrainingBatch,
    };
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Backend double that counts calls and replays a fixed answer.
    struct ScriptedBackend {
        calls: AtomicUsize,
        texts: Mutex<Vec<String>>,
        answer: Option<FullAnalysis>,
        stall: bool,
    }

    impl ScriptedBackend {
        fn answering(answer: FullAnalysis) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                texts: Mutex::new(Vec::new()),
                answer: Some(answer),
                stall: false,
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                texts: Mutex::new(Vec::new()),
                answer: None,
                stall: false,
            }
        }

        /// Accepts the request and never answers.
        fn stalling() -> Self {
            Self {
                stall: true,
                ..Self::answering(sample_response())
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl BiasBackend for ScriptedBackend {
        async fn detect_bias(&self, _text: &str) -> ApiResult<DetectionPayload> {
            unreachable!("session only calls full_analysis")
        }

        async fn correct_bias(&self, _text: &str, _biases: &[String]) -> ApiResult<CorrectionPayload> {
            unreachable!("session only calls full_analysis")
        }

        async fn full_analysis(&self, text: &str) -> ApiResult<FullAnalysis> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.texts.lock().unwrap().push(text.to_string());
            if self.stall {
                std::future::pending::<()>().await;
            }
            match &self.answer {
                Some(answer) => Ok(answer.clone()),
                None => Err(ApiError::Backend {
                    status: 500,
                    message: "boom".to_string(),
                }),
            }
        }

        async fn get_stats(&self) -> ApiResult<Value> {
            Ok(Value::Null)
        }

        async fn generate_training_data(&self, _num_examples: usize) -> ApiResult<TrainingBatch> {
            unreachable!("session only calls full_analysis")
        }

        async fn health(&self) -> ApiResult<HealthStatus> {
            unreachable!("session only calls full_analysis")
        }
    }

    fn sample_response() -> FullAnalysis {
        serde_json::from_value(json!({
            "detection": {
                "biases_detected": ["confirmation"],
                "severity": "high",
                "confidence": 80,
                "reasoning": ["r1"]
            },
            "correction": {
                "corrected": "fixed",
                "recommendations": ["rec1"]
            }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_blank_input_makes_no_call() {
        let mut session = AnalysisSession::new(ScriptedBackend::answering(sample_response()));

        assert_eq!(session.run_analysis().await, AnalysisOutcome::Skipped);
        session.set_input("   \n\t ");
        assert_eq!(session.run_analysis().await, AnalysisOutcome::Skipped);

        assert_eq!(session.backend().calls(), 0);
        assert!(session.result().is_none());
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_successful_run_maps_result() {
        let mut session = AnalysisSession::new(ScriptedBackend::answering(sample_response()));
        session.set_input("This always works.");

        assert_eq!(session.run_analysis().await, AnalysisOutcome::Completed);
        assert!(!session.is_busy());
        assert_eq!(session.backend().calls(), 1);

        let result = session.result().unwrap();
        assert_eq!(result.input, "This always works.");
        assert_eq!(result.corrected_response, "fixed");
        assert_eq!(result.recommendations, vec!["rec1"]);
        assert_eq!(result.severity, Severity::High);
    }

    #[tokio::test]
    async fn test_failed_run_clears_busy_and_sets_no_result() {
        let mut session = AnalysisSession::new(ScriptedBackend::failing());
        session.set_input("some text");

        let outcome = session.run_analysis().await;
        assert_eq!(
            outcome,
            AnalysisOutcome::Failed {
                alert: ANALYSIS_ALERT.to_string()
            }
        );
        assert!(!session.is_busy());
        assert!(session.result().is_none());
    }

    #[test]
    fn test_busy_guard_sets_and_clears() {
        let mut busy = false;
        let guard = BusyGuard::engage(&mut busy);
        assert!(*guard.busy);
        drop(guard);
        assert!(!busy);
    }

    #[tokio::test]
    async fn test_dropped_run_returns_to_idle() {
        let mut session = AnalysisSession::new(ScriptedBackend::stalling());
        session.set_input("waiting forever");

        let first =
            tokio::time::timeout(Duration::from_millis(50), session.run_analysis()).await;
        assert!(first.is_err());
        assert!(!session.is_busy());
        assert!(session.result().is_none());

        // The next trigger issues a new request instead of being skipped.
        let second =
            tokio::time::timeout(Duration::from_millis(50), session.run_analysis()).await;
        assert!(second.is_err());
        assert_eq!(session.backend().calls(), 2);
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_issues_exactly_one_post_to_analyze() {
        let server = TestServer::spawn().await.respond(
            "/analyze",
            200,
            json!({
                "detection": {
                    "biases_detected": [],
                    "severity": "low",
                    "confidence": 0,
                    "reasoning": []
                },
                "correction": null
            }),
        );
        let backend = HttpBackend::new(&server.base_url(), None).unwrap();
        let mut session = AnalysisSession::new(backend);
        session.set_input("Markets fluctuate.");

        assert_eq!(session.run_analysis().await, AnalysisOutcome::Completed);

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].path, "/api/analyze");
        assert_eq!(requests[0].json(), json!({ "text": "Markets fluctuate." }));

        let result = session.result().unwrap();
        assert_eq!(result.corrected_response, "Markets fluctuate.");
        assert!(result.recommendations.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_backend_raises_alert() {
        let backend = HttpBackend::new(&unreachable_url().await, None).unwrap();
        let mut session = AnalysisSession::new(backend);
        session.set_input("anything");

        let outcome = session.run_analysis().await;
        assert!(matches!(outcome, AnalysisOutcome::Failed { .. }));
        assert!(!session.is_busy());
        assert!(session.result().is_none());
    }

    #[tokio::test]
    async fn test_malformed_response_raises_alert() {
        let server = TestServer::spawn()
            .await
            .respond_raw("/analyze", 200, "<html>not json</html>");
        let backend = HttpBackend::new(&server.base_url(), None).unwrap();
        let mut session = AnalysisSession::new(backend);
        session.set_input("anything");

        assert!(matches!(
            session.run_analysis().await,
            AnalysisOutcome::Failed { .. }
        ));
        assert!(session.result().is_none());
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_result() {
        let server = TestServer::spawn()
            .await
            .respond("/analyze", 200, serde_json::to_value(sample_response()).unwrap());
        let backend = HttpBackend::new(&server.base_url(), None).unwrap();
        let mut session = AnalysisSession::new(backend);

        session.set_input("first");
        assert_eq!(session.run_analysis().await, AnalysisOutcome::Completed);

        let server = server.respond("/analyze", 500, json!({ "error": "model crashed" }));
        session.set_input("second");
        assert!(matches!(
            session.run_analysis().await,
            AnalysisOutcome::Failed { .. }
        ));

        assert_eq!(session.result().map(|r| r.input.as_str()), Some("first"));
        assert_eq!(server.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_batch_runs_sequentially_and_skips_blanks() {
        let mut session = AnalysisSession::new(ScriptedBackend::answering(sample_response()));

        let (results, failed) = session.run_batch(vec!["one", "", "two", "  "]).await;

        assert_eq!(results.len(), 2);
        assert_eq!(failed, 0);
        assert_eq!(session.backend().calls(), 2);
        assert_eq!(
            *session.backend().texts.lock().unwrap(),
            vec!["one".to_string(), "two".to_string()]
        );
    }

    #[tokio::test]
    async fn test_batch_counts_failures() {
        let mut session = AnalysisSession::new(ScriptedBackend::failing());

        let (results, failed) = session.run_batch(["a", "b"]).await;

        assert!(results.is_empty());
        assert_eq!(failed, 2);
    }
}
