//! Markdown and JSON rendering.
//!
//! Every command's output goes through here so that `--format` behaves the
//! same everywhere.

use crate::analysis::{sorted_distribution, BatchSummary};
use crate::catalog;
use crate::models::{
    AnalysisResult, BiasType, CorrectionPayload, DetectionPayload, HealthStatus, Severity,
    SystemStats, TrainingBatch,
};
use anyhow::Result;
use serde::Serialize;

/// Render a single analysis.
pub fn generate_analysis_markdown(result: &AnalysisResult) -> String {
    let mut output = String::new();

    output.push_str("# Bias Analysis\n\n");
    output.push_str(&format!(
        "*Analyzed {}*\n\n",
        result.analyzed_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    output.push_str(&generate_verdict_line(
        &result.biases_detected,
        result.severity,
        result.confidence,
    ));
    output.push_str(&generate_bias_list(&result.biases_detected));
    output.push_str(&generate_list_section("Reasoning", &result.reasoning));

    output.push_str("## Original\n\n");
    output.push_str(&quote(&result.original_response));

    output.push_str("## Corrected\n\n");
    if result.was_corrected() {
        output.push_str(&quote(&result.corrected_response));
    } else {
        output.push_str("*No correction suggested.*\n\n");
    }

    output.push_str(&generate_numbered_section(
        "Recommendations",
        &result.recommendations,
    ));
    output
}

/// Render the results of a batch run with its summary table first.
pub fn generate_batch_markdown(results: &[AnalysisResult], summary: &BatchSummary) -> String {
    let mut output = String::new();

    output.push_str("# Batch Bias Analysis\n\n");
    output.push_str(&format!(
        "- **Texts analyzed:** {}\n- **Failed requests:** {}\n- **Texts with biases:** {}\n- **Average confidence:** {:.1}%\n\n",
        summary.analyzed, summary.failed, summary.with_biases, summary.average_confidence
    ));

    output.push_str(&format!(
        "| {} Critical | {} High | {} Medium | {} Low |\n",
        Severity::Critical.emoji(),
        Severity::High.emoji(),
        Severity::Medium.emoji(),
        Severity::Low.emoji(),
    ));
    output.push_str("|:---:|:---:|:---:|:---:|\n");
    output.push_str(&format!(
        "| {} | {} | {} | {} |\n\n",
        summary.critical, summary.high, summary.medium, summary.low
    ));

    let common = summary.most_common(usize::MAX);
    if !common.is_empty() {
        output.push_str("## Biases Found\n\n");
        output.push_str("| Bias | Texts |\n");
        output.push_str("|:---|:---:|\n");
        for (id, count) in common {
            output.push_str(&format!("| {} | {} |\n", catalog::display_name(id), count));
        }
        output.push('\n');
    }

    if !results.is_empty() {
        output.push_str("## Results\n\n");
        for (i, result) in results.iter().enumerate() {
            output.push_str(&format!(
                "{}. {} **{}** ({:.0}%) {}\n",
                i + 1,
                result.severity.emoji(),
                result.severity,
                result.confidence,
                truncate(&result.input, 80)
            ));
        }
        output.push('\n');
    }

    output
}

/// Render a bare detection payload.
pub fn generate_detection_markdown(detection: &DetectionPayload) -> String {
    let mut output = String::new();

    output.push_str("# Bias Detection\n\n");
    output.push_str(&generate_verdict_line(
        &detection.biases_detected,
        detection.severity,
        detection.confidence,
    ));
    output.push_str(&generate_bias_list(&detection.biases_detected));
    output.push_str(&generate_list_section("Reasoning", &detection.reasoning));
    output
}

/// Render a correction payload.
pub fn generate_correction_markdown(text: &str, correction: &CorrectionPayload) -> String {
    let mut output = String::new();

    output.push_str("# Bias Correction\n\n");
    output.push_str("## Original\n\n");
    output.push_str(&quote(correction.original.as_deref().unwrap_or(text)));

    output.push_str("## Corrected\n\n");
    match correction.corrected.as_deref() {
        Some(corrected) if !corrected.is_empty() => output.push_str(&quote(corrected)),
        _ => output.push_str("*No correction returned.*\n\n"),
    }

    if !correction.biases_removed.is_empty() {
        let names: Vec<_> = correction
            .biases_removed
            .iter()
            .map(|id| catalog::display_name(id))
            .collect();
        output.push_str(&format!("**Biases addressed:** {}\n\n", names.join(", ")));
    }

    let recommendations = correction.recommendations.clone().unwrap_or_default();
    output.push_str(&generate_numbered_section("Recommendations", &recommendations));
    output
}

/// Render the service statistics.
pub fn generate_stats_markdown(stats: &SystemStats) -> String {
    let mut output = String::new();

    output.push_str("# Bias API Statistics\n\n");
    output.push_str(&format!("- **Detections:** {}\n", stats.total_detections));
    output.push_str(&format!("- **Corrections:** {}\n", stats.total_corrections));
    output.push_str(&format!(
        "- **Training examples:** {}\n",
        stats.training_examples
    ));
    if let Some(ref uptime) = stats.system_uptime {
        output.push_str(&format!("- **Uptime:** {}\n", uptime));
    }
    if let Some(latency) = stats.avg_latency_ms {
        output.push_str(&format!("- **Average latency:** {:.0} ms\n", latency));
    }
    output.push('\n');

    let distribution = sorted_distribution(&stats.bias_distribution);
    if !distribution.is_empty() {
        output.push_str("## Training Distribution\n\n");
        output.push_str("| Bias | Examples |\n");
        output.push_str("|:---|:---:|\n");
        for (id, count) in distribution {
            output.push_str(&format!("| {} | {} |\n", catalog::display_name(&id), count));
        }
        output.push('\n');
    }

    output
}

/// Render a training generation response.
pub fn generate_training_markdown(batch: &TrainingBatch) -> String {
    let mut output = String::new();

    output.push_str("# Training Data\n\n");
    if batch.message.is_empty() {
        output.push_str(&format!("Generated {} examples.\n\n", batch.count));
    } else {
        output.push_str(&format!("{}\n\n", batch.message));
    }

    if !batch.examples.is_empty() {
        output.push_str(&format!(
            "## Sample ({} of {})\n\n",
            batch.examples.len(),
            batch.count
        ));
        for example in &batch.examples {
            output.push_str(&format!(
                "### {} {}\n\n",
                example.severity.emoji(),
                catalog::display_name(&example.bias_type)
            ));
            output.push_str(&format!("- **Biased:** {}\n", example.biased_text));
            output.push_str(&format!("- **Corrected:** {}\n\n", example.corrected_text));
        }
    }

    output
}

/// Render the health probe.
pub fn generate_health_markdown(base_url: &str, health: &HealthStatus) -> String {
    let icon = if health.is_healthy() { "✅" } else { "⚠️" };
    let version = health
        .version
        .as_deref()
        .map(|v| format!(" (v{})", v))
        .unwrap_or_default();
    format!("{} {} is {}{}\n", icon, base_url, health.status, version)
}

/// Render the bias catalog.
pub fn generate_catalog_markdown(types: &[&BiasType], show_examples: bool) -> String {
    let mut output = String::new();

    output.push_str("# Bias Types\n\n");
    output.push_str("| Id | Name | Severity | Detection Rate |\n");
    output.push_str("|:---|:---|:---:|:---:|\n");
    for bias in types {
        output.push_str(&format!(
            "| `{}` | {} | {} {} | {}% |\n",
            bias.id,
            bias.name,
            bias.severity.emoji(),
            bias.severity,
            bias.detection_rate
        ));
    }
    output.push('\n');

    if show_examples {
        for bias in types {
            output.push_str(&generate_bias_type_markdown(bias));
        }
    }

    output
}

/// Render one catalog entry.
pub fn generate_bias_type_markdown(bias: &BiasType) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", bias.name));
    section.push_str(&format!("{}\n\n", bias.description));
    section.push_str(&format!(
        "*Severity: {} {} | Detection rate: {}% | Color: {}*\n\n",
        bias.severity.emoji(),
        bias.severity,
        bias.detection_rate,
        bias.color
    ));
    for example in bias.examples {
        section.push_str(&format!("- {}\n", example));
    }
    section.push('\n');

    section
}

/// Pretty-printed JSON for any output.
pub fn generate_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}

fn generate_verdict_line(biases: &[String], severity: Severity, confidence: f64) -> String {
    if biases.is_empty() {
        return "✅ **No biases detected.**\n\n".to_string();
    }
    format!(
        "{} **{} severity** | {} bias(es) | confidence {:.0}%\n\n",
        severity.emoji(),
        severity,
        biases.len(),
        confidence
    )
}

fn generate_bias_list(biases: &[String]) -> String {
    if biases.is_empty() {
        return String::new();
    }

    let mut section = String::from("## Detected Biases\n\n");
    for id in biases {
        match catalog::find(id) {
            Some(bias) => section.push_str(&format!(
                "- {} **{}**: {}\n",
                bias.severity.emoji(),
                bias.name,
                bias.description
            )),
            None => section.push_str(&format!("- **{}**\n", id)),
        }
    }
    section.push('\n');
    section
}

fn generate_list_section(title: &str, items: &[String]) -> String {
    if items.is_empty() {
        return String::new();
    }

    let mut section = format!("## {}\n\n", title);
    for item in items {
        section.push_str(&format!("- {}\n", item));
    }
    section.push('\n');
    section
}

fn generate_numbered_section(title: &str, items: &[String]) -> String {
    if items.is_empty() {
        return String::new();
    }

    let mut section = format!("## {}\n\n", title);
    for (i, item) in items.iter().enumerate() {
        section.push_str(&format!("{}. {}\n", i + 1, item));
    }
    section.push('\n');
    section
}

fn quote(text: &str) -> String {
    let mut block = String::new();
    for line in text.lines() {
        block.push_str("> ");
        block.push_str(line);
        block.push('\n');
    }
    block.push('\n');
    block
}

fn truncate(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", cut)
}
