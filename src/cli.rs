//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;

/// BiasLens - command-line client for a cognitive bias detection API
///
/// Sends text to a running bias detection service and renders the
/// detected biases, a debiased rewrite and recommendations.
///
/// Examples:
///   biaslens analyze "Everyone knows this investment will definitely succeed."
///   echo "Winners all do this" | biaslens analyze --fail-on high
///   biaslens batch --file statements.txt --format json
///   biaslens stats
///   biaslens biases survivorship
///   biaslens --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(subcommand_required = false, arg_required_else_help = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Base URL of the bias detection API
    ///
    /// Defaults to the config file value, or http://localhost:5000/api.
    #[arg(long, value_name = "URL", env = "BIASLENS_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .biaslens.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT", global = true)]
    pub format: Option<OutputFormat>,

    /// Write output to a file instead of stdout
    #[arg(short, long, value_name = "FILE", global = true)]
    pub output: Option<PathBuf>,

    /// Request timeout in seconds
    ///
    /// By default requests wait until the service answers.
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Omit examples when listing bias types
    #[arg(long, global = true)]
    pub no_examples: bool,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Generate a default .biaslens.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Detect and correct biases in one request
    Analyze {
        #[command(flatten)]
        input: TextInput,

        /// Exit with code 2 if the detected severity is at or above this level
        #[arg(long, value_name = "LEVEL")]
        fail_on: Option<FailOnLevel>,
    },

    /// Analyze every non-empty line of a file, one request at a time
    Batch {
        /// File with one text per line
        #[arg(short, long, value_name = "FILE")]
        file: PathBuf,

        /// Exit with code 2 if any text is at or above this severity
        #[arg(long, value_name = "LEVEL")]
        fail_on: Option<FailOnLevel>,
    },

    /// Detect biases without correcting
    Detect {
        #[command(flatten)]
        input: TextInput,
    },

    /// Rewrite text to remove the given biases
    Correct {
        #[command(flatten)]
        input: TextInput,

        /// Bias identifiers to correct (comma-separated)
        ///
        /// When omitted the service detects them first.
        #[arg(long, value_name = "IDS", value_delimiter = ',')]
        biases: Vec<String>,
    },

    /// Show service statistics
    Stats,

    /// Ask the service to synthesize training examples
    GenerateTraining {
        /// Number of examples to generate
        #[arg(short, long, default_value = "100", value_name = "COUNT")]
        num: usize,
    },

    /// Check that the service is up
    Health,

    /// List known bias types, or show one
    Biases {
        /// Bias identifier (e.g. confirmation, survivorship_bias)
        id: Option<String>,

        /// Sort by severity instead of display order
        #[arg(long)]
        by_severity: bool,
    },
}

/// Where the text to analyze comes from.
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct TextInput {
    /// Text to analyze (reads stdin when neither TEXT nor --file is given)
    #[arg(value_name = "TEXT", conflicts_with = "file")]
    pub text: Option<String>,

    /// Read the text from a file
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<PathBuf>,
}

impl TextInput {
    /// Resolve the text from the argument, the file, or stdin.
    pub fn resolve(&self) -> Result<String> {
        if let Some(ref text) = self.text {
            return Ok(text.clone());
        }

        if let Some(ref path) = self.file {
            return std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read input file: {}", path.display()));
        }

        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read text from stdin")?;
        Ok(buffer)
    }
}

/// Output format for rendered results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "markdown",
            OutputFormat::Json => "json",
        }
    }
}

/// Severity level for --fail-on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
pub enum FailOnLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.command.is_none() {
            return Err("No command given. Run with --help for usage.".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        // Validate API URL format
        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        // Validate timeout if provided
        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        match self.command {
            Some(Command::GenerateTraining { num }) if num == 0 => {
                return Err("Number of examples must be at least 1".to_string());
            }
            Some(Command::Batch { ref file, .. }) if !file.is_file() => {
                return Err(format!("Batch file does not exist: {}", file.display()));
            }
            _ => {}
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
