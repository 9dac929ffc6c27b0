//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.issuelens.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::analysis::RecommendationThresholds;
use crate::classify::PromptLimits;
use crate::metrics::OrgUnitRule;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".issuelens.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Issue tracker settings.
    #[serde(default)]
    pub tracker: TrackerConfig,

    /// Metric derivation and recommendation settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Number of issues analyzed concurrently.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
            concurrency: default_concurrency(),
        }
    }
}

fn default_output() -> String {
    "issuelens_report.md".to_string()
}

fn default_concurrency() -> usize {
    4
}

/// LLM model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Use the model at all. When false, classification and scoring
    /// return their neutral values.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Default model name.
    #[serde(default = "default_model")]
    pub name: String,

    /// Ollama API URL.
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// Temperature for generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds.
    #[serde(default = "default_model_timeout")]
    pub timeout_seconds: u64,

    /// Token budget for a classification answer.
    #[serde(default = "default_classify_max_tokens")]
    pub classify_max_tokens: u32,

    /// Token budget for a comment score answer.
    #[serde(default = "default_score_max_tokens")]
    pub score_max_tokens: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            name: default_model(),
            ollama_url: default_ollama_url(),
            temperature: default_temperature(),
            timeout_seconds: default_model_timeout(),
            classify_max_tokens: default_classify_max_tokens(),
            score_max_tokens: default_score_max_tokens(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_model() -> String {
    "llama3.2:latest".to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_model_timeout() -> u64 {
    120
}

fn default_classify_max_tokens() -> u32 {
    256
}

fn default_score_max_tokens() -> u32 {
    16
}

/// Issue tracker settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Jira site URL, e.g. `https://example.atlassian.net`.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Account email for basic auth. The token is never read from this file.
    #[serde(default)]
    pub email: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_tracker_timeout")]
    pub timeout_seconds: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            email: None,
            timeout_seconds: default_tracker_timeout(),
        }
    }
}

fn default_tracker_timeout() -> u64 {
    30
}

/// Metric derivation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// How identities map to org units.
    #[serde(default)]
    pub org_unit_strategy: OrgUnitRule,

    /// Description characters sent to the classifier.
    #[serde(default = "default_description_limit")]
    pub description_limit: usize,

    /// Comments sent to the classifier.
    #[serde(default = "default_comment_count")]
    pub comment_count: usize,

    /// Comment characters sent to the classifier.
    #[serde(default = "default_comment_limit")]
    pub comment_limit: usize,

    /// Comment characters sent to the scorer.
    #[serde(default = "default_score_comment_limit")]
    pub score_comment_limit: usize,

    /// Recommendation thresholds.
    #[serde(default)]
    pub thresholds: RecommendationThresholds,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            org_unit_strategy: OrgUnitRule::default(),
            description_limit: default_description_limit(),
            comment_count: default_comment_count(),
            comment_limit: default_comment_limit(),
            score_comment_limit: default_score_comment_limit(),
            thresholds: RecommendationThresholds::default(),
        }
    }
}

fn default_description_limit() -> usize {
    500
}

fn default_comment_count() -> usize {
    5
}

fn default_comment_limit() -> usize {
    1000
}

fn default_score_comment_limit() -> usize {
    2000
}

impl AnalysisConfig {
    /// Prompt bounds for the classifier and scorer.
    pub fn prompt_limits(&self) -> PromptLimits {
        PromptLimits {
            description_chars: self.description_limit,
            classify_comments: self.comment_count,
            classify_comment_chars: self.comment_limit,
            score_comment_chars: self.score_comment_limit,
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.issuelens.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were actually provided.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref model) = args.model {
            self.model.name = model.clone();
        }
        if let Some(ref url) = args.ollama_url {
            self.model.ollama_url = url.clone();
        }
        if let Some(temperature) = args.temperature {
            self.model.temperature = temperature;
        }
        if let Some(timeout) = args.timeout {
            self.model.timeout_seconds = timeout;
            self.tracker.timeout_seconds = timeout;
        }
        if args.no_llm {
            self.model.enabled = false;
        }

        if let Some(ref url) = args.jira_url {
            self.tracker.base_url = Some(url.clone());
        }
        if let Some(ref email) = args.jira_email {
            self.tracker.email = Some(email.clone());
        }

        if let Some(concurrency) = args.concurrency {
            self.general.concurrency = concurrency;
        }
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
