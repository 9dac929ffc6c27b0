//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// IssueLens - LLM-assisted issue-tracker health analyzer
///
/// Derives workflow metrics for a batch of issues, classifies their root
/// causes with a local model, and writes an organizational health report.
///
/// Examples:
///   issuelens --jira-url https://acme.atlassian.net --issues OPS-1,OPS-2
///   issuelens --input export.json --format json
///   issuelens --input export.json --no-llm
///   issuelens --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Issue keys to analyze (comma-separated)
    ///
    /// Required with a Jira tracker. With --input, defaults to every issue
    /// in the export.
    #[arg(short, long, value_name = "KEYS", value_delimiter = ',')]
    pub issues: Option<Vec<String>>,

    /// JSON export of issue records to analyze instead of querying Jira
    #[arg(long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Jira site URL
    #[arg(long, value_name = "URL", env = "ISSUELENS_JIRA_URL")]
    pub jira_url: Option<String>,

    /// Jira account email for basic auth
    #[arg(long, value_name = "EMAIL", env = "ISSUELENS_JIRA_EMAIL")]
    pub jira_email: Option<String>,

    /// Jira API token for basic auth
    #[arg(
        long,
        value_name = "TOKEN",
        env = "ISSUELENS_JIRA_TOKEN",
        hide_env_values = true
    )]
    pub jira_token: Option<String>,

    /// Ollama model to use for classification and scoring
    #[arg(short, long, env = "ISSUELENS_MODEL")]
    pub model: Option<String>,

    /// Ollama API endpoint URL
    #[arg(long, env = "ISSUELENS_OLLAMA_URL")]
    pub ollama_url: Option<String>,

    /// Temperature for LLM responses (0.0 - 1.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Skip all LLM calls and use neutral classification and scores
    #[arg(long)]
    pub no_llm: bool,

    /// Number of issues analyzed concurrently
    #[arg(long, value_name = "NUM")]
    pub concurrency: Option<usize>,

    /// Request timeout in seconds for both the tracker and the model
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .issuelens.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .issuelens.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Issue keys given on the command line, trimmed, empty entries removed.
    pub fn issue_keys(&self) -> Vec<String> {
        self.issues
            .iter()
            .flatten()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .collect()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.input.is_none() && self.issue_keys().is_empty() {
            return Err("Provide --issues or an --input export file".to_string());
        }

        if let Some(ref input) = self.input {
            if !input.is_file() {
                return Err(format!("Input file does not exist: {}", input.display()));
            }
        }

        if let Some(ref url) = self.jira_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Jira URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if !self.no_llm {
            if let Some(ref url) = self.ollama_url {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err("Ollama URL must start with 'http://' or 'https://'".to_string());
                }
            }
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=1.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 1.0".to_string());
            }
        }

        if self.concurrency == Some(0) {
            return Err("Concurrency must be at least 1".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is the `[general] verbose` setting; `--quiet` wins
    /// over both.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
