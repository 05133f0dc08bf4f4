//! BiasLens - command-line client for a cognitive bias detection API
//!
//! Sends text to an external detection/correction service and renders
//! the detected biases, a debiased rewrite and recommendations.
//!
//! Exit codes:
//!   0 - Success (no result above threshold, or no --fail-on set)
//!   1 - Runtime error (connection, config, malformed response, etc.)
//!   2 - Severity at or above the --fail-on threshold

mod analysis;
mod catalog;
mod cli;
mod client;
mod config;
mod models;
mod report;
mod session;

use anyhow::{bail, Context, Result};
use cli::{Args, Command, FailOnLevel, OutputFormat};
use client::{BiasBackend, HttpBackend};
use config::{Config, CONFIG_FILE_NAME};
use models::{Severity, SystemStats};
use session::{AnalysisOutcome, AnalysisSession};
use std::path::Path;
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args)?;

    info!("BiasLens v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            error!("Command failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .biaslens.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to point at your bias API or change the output format.");
    Ok(())
}

/// Initialize logging based on verbosity settings. `RUST_LOG` wins if set.
fn init_logging(args: &Args) -> Result<()> {
    let level = LevelFilter::from_level(args.log_level());
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,biaslens={}", level)));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Dispatch the selected command. Returns the exit code.
async fn run(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    let format = config.output_format();

    let Some(command) = args.command.clone() else {
        bail!("No command given");
    };

    match command {
        Command::Biases { id, by_severity } => {
            let output = render_catalog(id.as_deref(), by_severity, &config, format)?;
            emit(&output, args.output.as_deref())?;
            Ok(0)
        }

        Command::Analyze { input, fail_on } => {
            let text = input.resolve()?;
            run_analyze(connect(&config)?, text, fail_on, &args, format).await
        }

        Command::Batch { file, fail_on } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read batch file: {}", file.display()))?;
            run_batch(connect(&config)?, &content, fail_on, &args, format).await
        }

        Command::Detect { input } => {
            let text = require_text(input.resolve()?)?;
            let backend = connect(&config)?;
            let detection = backend
                .detect_bias(&text)
                .await
                .with_context(|| unreachable_hint(&backend))?;
            info!("Detected {} bias(es)", detection.biases_detected.len());

            let output = match format {
                OutputFormat::Json => report::generate_json(&detection)?,
                OutputFormat::Markdown => report::generate_detection_markdown(&detection),
            };
            emit(&output, args.output.as_deref())?;
            Ok(0)
        }

        Command::Correct { input, biases } => {
            let text = require_text(input.resolve()?)?;
            if biases.is_empty() {
                info!("No biases given; the service will detect them first");
            }
            let backend = connect(&config)?;
            let correction = backend
                .correct_bias(&text, &biases)
                .await
                .with_context(|| unreachable_hint(&backend))?;

            let output = match format {
                OutputFormat::Json => report::generate_json(&correction)?,
                OutputFormat::Markdown => report::generate_correction_markdown(&text, &correction),
            };
            emit(&output, args.output.as_deref())?;
            Ok(0)
        }

        Command::Stats => {
            let backend = connect(&config)?;
            let stats = backend
                .get_stats()
                .await
                .with_context(|| unreachable_hint(&backend))?;

            let output = match format {
                OutputFormat::Json => report::generate_json(&stats)?,
                OutputFormat::Markdown => {
                    let view = SystemStats::from_value(&stats)
                        .context("Unexpected statistics payload from bias API")?;
                    report::generate_stats_markdown(&view)
                }
            };
            emit(&output, args.output.as_deref())?;
            Ok(0)
        }

        Command::GenerateTraining { num } => {
            let output = render_training(&connect(&config)?, num, format).await?;
            emit(&output, args.output.as_deref())?;
            Ok(0)
        }

        Command::Health => {
            let backend = connect(&config)?;
            let health = backend
                .health()
                .await
                .with_context(|| unreachable_hint(&backend))?;

            let output = match format {
                OutputFormat::Json => report::generate_json(&health)?,
                OutputFormat::Markdown => {
                    report::generate_health_markdown(backend.base_url(), &health)
                }
            };
            emit(&output, args.output.as_deref())?;
            Ok(if health.is_healthy() { 0 } else { 1 })
        }
    }
}

fn connect(config: &Config) -> Result<HttpBackend> {
    HttpBackend::new(&config.api.base_url, config.timeout())
}

fn unreachable_hint(backend: &HttpBackend) -> String {
    format!(
        "Request to {} failed. Is the bias detection API running?",
        backend.base_url()
    )
}

/// Request synthetic training examples and render them.
///
/// Progress goes to the log only, so the returned text is the whole output.
async fn render_training(backend: &HttpBackend, num: usize, format: OutputFormat) -> Result<String> {
    info!("Requesting {} training examples", num);
    let batch = backend
        .generate_training_data(num)
        .await
        .with_context(|| unreachable_hint(backend))?;
    info!("Service generated {} examples", batch.count);

    match format {
        OutputFormat::Json => report::generate_json(&batch),
        OutputFormat::Markdown => Ok(report::generate_training_markdown(&batch)),
    }
}

/// The live flow: one analysis of one text.
async fn run_analyze(
    backend: HttpBackend,
    text: String,
    fail_on: Option<FailOnLevel>,
    args: &Args,
    format: OutputFormat,
) -> Result<i32> {
    let mut session = AnalysisSession::new(backend).with_progress(!args.quiet);
    session.set_input(text);

    match session.run_analysis().await {
        AnalysisOutcome::Skipped => {
            warn!("Nothing to analyze: input is empty");
            Ok(0)
        }
        AnalysisOutcome::Failed { alert } => {
            eprintln!("\n❌ {}", alert);
            Ok(1)
        }
        AnalysisOutcome::Completed => {
            let Some(result) = session.result() else {
                bail!("Analysis completed without a result");
            };

            let output = match format {
                OutputFormat::Json => report::generate_json(result)?,
                OutputFormat::Markdown => report::generate_analysis_markdown(result),
            };
            emit(&output, args.output.as_deref())?;

            Ok(check_threshold(fail_on, Some(result.severity)))
        }
    }
}

/// Analyze each line of `content` in turn and print the aggregate.
async fn run_batch(
    backend: HttpBackend,
    content: &str,
    fail_on: Option<FailOnLevel>,
    args: &Args,
    format: OutputFormat,
) -> Result<i32> {
    let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        warn!("Batch file has no text to analyze");
        return Ok(0);
    }

    if !args.quiet {
        eprintln!("🔬 Analyzing {} texts...", lines.len());
    }

    let mut session = AnalysisSession::new(backend).with_progress(!args.quiet);
    let (mut results, failed) = session.run_batch(lines).await;

    if results.is_empty() && failed > 0 {
        eprintln!("\n❌ {}", session::ANALYSIS_ALERT);
        return Ok(1);
    }

    let summary = analysis::BatchSummary::from_results(&results, failed);
    analysis::sort_by_severity(&mut results);

    if let Some(level) = fail_on {
        let flagged = analysis::at_or_above(&results, fail_on_to_severity(level)).len();
        info!("{} text(s) at or above {:?} severity", flagged, level);
    }

    let output = match format {
        OutputFormat::Json => report::generate_json(&serde_json::json!({
            "summary": summary,
            "results": results,
        }))?,
        OutputFormat::Markdown => report::generate_batch_markdown(&results, &summary),
    };
    emit(&output, args.output.as_deref())?;

    if failed > 0 {
        warn!("{} of {} requests failed", failed, failed + results.len());
    }

    Ok(check_threshold(fail_on, summary.worst_severity()))
}

/// Render the bias catalog or a single entry.
fn render_catalog(
    id: Option<&str>,
    by_severity: bool,
    config: &Config,
    format: OutputFormat,
) -> Result<String> {
    if let Some(id) = id {
        let Some(bias) = catalog::find(id) else {
            bail!(
                "Unknown bias type '{}'. Known types: {}",
                id,
                catalog::BIAS_TYPES
                    .iter()
                    .map(|b| b.id)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        };
        return match format {
            OutputFormat::Json => report::generate_json(bias),
            OutputFormat::Markdown => Ok(report::generate_bias_type_markdown(bias)),
        };
    }

    let types = if by_severity {
        catalog::by_severity()
    } else {
        catalog::BIAS_TYPES.iter().collect()
    };

    match format {
        OutputFormat::Json => report::generate_json(&types),
        OutputFormat::Markdown => Ok(report::generate_catalog_markdown(
            &types,
            config.output.show_examples,
        )),
    }
}

fn require_text(text: String) -> Result<String> {
    if text.trim().is_empty() {
        bail!("No text provided");
    }
    Ok(text)
}

/// Exit code for a `--fail-on` threshold.
fn check_threshold(fail_on: Option<FailOnLevel>, severity: Option<Severity>) -> i32 {
    match (fail_on, severity) {
        (Some(level), Some(severity)) if severity >= fail_on_to_severity(level) => {
            eprintln!(
                "\n⛔ Severity {} is at or above {:?}. Failing (exit code 2).",
                severity, level
            );
            2
        }
        _ => 0,
    }
}

/// Convert FailOnLevel to Severity for comparison.
fn fail_on_to_severity(level: FailOnLevel) -> Severity {
    match level {
        FailOnLevel::Low => Severity::Low,
        FailOnLevel::Medium => Severity::Medium,
        FailOnLevel::High => Severity::High,
        FailOnLevel::Critical => Severity::Critical,
    }
}

/// Write rendered output to a file, or stdout.
fn emit(content: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write output to {}", path.display()))?;
            eprintln!("✅ Output saved to: {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}
