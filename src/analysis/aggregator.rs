//! Aggregation over several analysis results.
//!
//! Used by batch mode to summarise which biases showed up and how severe
//! the analyzed texts were.

use crate::catalog;
use crate::models::{AnalysisResult, Severity};
use serde::Serialize;
use std::collections::HashMap;

/// Summary of a batch of analyses.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    /// Texts that were analyzed successfully.
    pub analyzed: usize,
    /// Texts whose request failed.
    pub failed: usize,
    /// Analyzed texts with at least one bias.
    pub with_biases: usize,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    /// Occurrences per catalog id (unknown ids kept verbatim).
    pub by_bias: HashMap<String, usize>,
    pub average_confidence: f64,
}

impl BatchSummary {
    /// Build a summary from successful results and the failure count.
    pub fn from_results(results: &[AnalysisResult], failed: usize) -> Self {
        let mut summary = Self {
            analyzed: results.len(),
            failed,
            ..Self::default()
        };

        for result in results {
            if result.has_biases() {
                summary.with_biases += 1;
            }

            match result.severity {
                Severity::Critical => summary.critical += 1,
                Severity::High => summary.high += 1,
                Severity::Medium => summary.medium += 1,
                Severity::Low => summary.low += 1,
            }

            for id in &result.biases_detected {
                let key = match catalog::find(id) {
                    Some(bias) => bias.id.to_string(),
                    None => id.clone(),
                };
                *summary.by_bias.entry(key).or_insert(0) += 1;
            }
        }

        if !results.is_empty() {
            let total: f64 = results.iter().map(|r| r.confidence).sum();
            summary.average_confidence = total / results.len() as f64;
        }

        summary
    }

    /// Highest severity seen, if anything was analyzed.
    pub fn worst_severity(&self) -> Option<Severity> {
        [
            (Severity::Critical, self.critical),
            (Severity::High, self.high),
            (Severity::Medium, self.medium),
            (Severity::Low, self.low),
        ]
        .into_iter()
        .find(|(_, count)| *count > 0)
        .map(|(severity, _)| severity)
    }

    /// The `n` most frequent biases, most frequent first, ties by id.
    pub fn most_common(&self, n: usize) -> Vec<(&str, usize)> {
        let mut counts: Vec<_> = self
            .by_bias
            .iter()
            .map(|(id, count)| (id.as_str(), *count))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        counts.truncate(n);
        counts
    }
}

/// Sort results most severe first, then by confidence.
pub fn sort_by_severity(results: &mut [AnalysisResult]) {
    results.sort_by(|a, b| {
        b.severity.cmp(&a.severity).then_with(|| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    });
}

/// Results at or above `min` severity.
pub fn at_or_above(results: &[AnalysisResult], min: Severity) -> Vec<&AnalysisResult> {
    results.iter().filter(|r| r.severity >= min).collect()
}

/// Ordered `(id, count)` pairs from a service-side distribution map.
pub fn sorted_distribution(distribution: &HashMap<String, u64>) -> Vec<(String, u64)> {
    let mut entries: Vec<_> = distribution
        .iter()
        .map(|(id, count)| (id.clone(), *count))
        .collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries
}
