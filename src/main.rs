//! IssueLens - LLM-assisted issue-tracker health analyzer
//!
//! A CLI tool that fetches issues from Jira (or a JSON export), derives
//! workflow metrics per issue, classifies root causes with a local Ollama
//! model, and writes an organizational health report.
//!
//! Exit codes:
//!   0 - Success (including runs where some issues were skipped)
//!   1 - Runtime error (bad arguments, config, unreachable tracker, etc.)

mod analysis;
mod classify;
mod cli;
mod config;
mod llm;
mod metrics;
mod models;
mod report;
mod tracker;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use indicatif::{ProgressBar, ProgressStyle};
use models::{AnalysisReport, ReportMetadata};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use analysis::{IssueAnalyzer, ReportAggregator};
use classify::{CommentValueScorer, RootCauseClassifier};
use llm::{LlmClient, OllamaClient, OllamaConfig};
use metrics::OrgUnitExtractor;
use tracker::{FileTracker, IssueTracker, JiraConfig, JiraTracker};

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

    // Config is read before logging starts: `[general] verbose` sets the level
    let (mut config, config_path) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(&args, config.general.verbose);

    info!("IssueLens v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    match config_path {
        Some(path) => info!("Loaded config from: {}", path.display()),
        None => debug!("No config file found, using defaults"),
    }

    match run_analysis(args, config).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Analysis failed: {}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .issuelens.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

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
    println!("   Edit it to customize the model, tracker, and recommendation thresholds.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config_verbose: bool) {
    let level = args.log_level(config_verbose);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete analysis workflow.
async fn run_analysis(args: Args, config: Config) -> Result<()> {
    let start_time = Instant::now();

    // Step 1: Connect to the issue source
    let tracker = build_tracker(&args, &config)?;
    let source = tracker.describe();
    println!("📥 Issue source: {}", source);

    let issue_ids = match args.issue_keys() {
        keys if !keys.is_empty() => keys,
        _ => tracker.list_ids().unwrap_or_default(),
    };
    if issue_ids.is_empty() {
        bail!("No issues to analyze");
    }

    // Step 2: Set up the model-backed collaborators
    let llm = build_llm(&config)?;
    let model_used = llm.as_ref().map(|client| client.model_name().to_string());

    match model_used {
        Some(ref name) => {
            println!("🤖 Model: {}", name);
            println!("   Ollama: {}", config.model.ollama_url);
            println!("   Timeout: {}s", config.model.timeout_seconds);
        }
        None => println!("🤖 Model disabled: using neutral classification and scores"),
    }

    let limits = config.analysis.prompt_limits();
    let classifier = RootCauseClassifier::new(llm.clone(), limits)
        .with_max_output(config.model.classify_max_tokens);
    let scorer = CommentValueScorer::new(llm, limits.score_comment_chars)
        .with_max_output(config.model.score_max_tokens);
    let org_units = OrgUnitExtractor::from_rule(config.analysis.org_unit_strategy);

    let analyzer = IssueAnalyzer::new(tracker, classifier, scorer, org_units)
        .with_concurrency(config.general.concurrency);

    // Step 3: Analyze every issue
    println!("\n🔬 Analyzing {} issues...", issue_ids.len());
    let progress = build_progress_bar(issue_ids.len(), args.quiet);
    let outcome = analyzer.analyze_batch(&issue_ids, Some(&progress)).await;
    progress.finish_and_clear();

    // Step 4: Aggregate
    println!("\n📝 Generating report...");
    let report = ReportAggregator::new(config.analysis.thresholds).aggregate(&outcome.metrics);

    let duration = start_time.elapsed().as_secs_f64();
    let metadata = ReportMetadata {
        source,
        analysis_date: Utc::now(),
        model_used,
        issues_requested: issue_ids.len(),
        issues_analyzed: outcome.metrics.len(),
        issues_skipped: outcome.skipped.len(),
        issues_degraded: outcome.metrics.iter().filter(|m| m.degraded).count(),
        duration_seconds: duration,
    };

    if metadata.issues_degraded > 0 {
        warn!(
            "{} issues used fallback values because the model did not answer usably",
            metadata.issues_degraded
        );
    }

    let analysis_report = AnalysisReport {
        metadata,
        report,
        issues: outcome.metrics,
        skipped: outcome.skipped,
    };

    // Step 5: Write the report
    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&analysis_report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&analysis_report),
    };

    let output_path = output_path(&args, &config);
    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    print_summary(&analysis_report);
    println!(
        "\n✅ Analysis complete! Report saved to: {}",
        output_path.display()
    );

    Ok(())
}

/// Build the tracker: a JSON export if --input was given, Jira otherwise.
fn build_tracker(args: &Args, config: &Config) -> Result<Arc<dyn IssueTracker>> {
    if let Some(ref input) = args.input {
        info!("Reading issues from export: {}", input.display());
        let file: Arc<dyn IssueTracker> = Arc::new(FileTracker::load(input)?);
        return Ok(file);
    }

    let Some(ref base_url) = config.tracker.base_url else {
        bail!("No Jira URL configured. Pass --jira-url or set [tracker] base_url");
    };

    if args.jira_token.is_none() {
        warn!("No Jira API token given; requests will be anonymous");
    }

    let jira: Arc<dyn IssueTracker> = Arc::new(JiraTracker::new(JiraConfig {
        base_url: base_url.clone(),
        email: config.tracker.email.clone(),
        api_token: args.jira_token.clone(),
        timeout_seconds: config.tracker.timeout_seconds,
    })
    .context("Failed to create Jira client")?);

    Ok(jira)
}

/// Build the Ollama client, or `None` when the model is disabled.
fn build_llm(config: &Config) -> Result<Option<Arc<dyn LlmClient>>> {
    if !config.model.enabled {
        return Ok(None);
    }

    let client = OllamaClient::new(OllamaConfig {
        ollama_url: config.model.ollama_url.clone(),
        model_name: config.model.name.clone(),
        temperature: config.model.temperature,
        timeout_seconds: config.model.timeout_seconds,
    })
    .context("Failed to create Ollama client")?;

    let client: Arc<dyn LlmClient> = Arc::new(client);
    Ok(Some(client))
}

fn build_progress_bar(len: usize, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

/// Report path. A JSON report without an explicit path gets a `.json` extension.
fn output_path(args: &Args, config: &Config) -> PathBuf {
    let path = PathBuf::from(&config.general.output);
    if args.output.is_none() && args.format == OutputFormat::Json {
        path.with_extension("json")
    } else {
        path
    }
}

fn print_summary(analysis: &AnalysisReport) {
    let report = &analysis.report;
    let averages = &report.averages;

    println!("\n📊 Analysis Summary:");
    println!(
        "   Issues analyzed: {} ({} resolved, {} skipped)",
        report.total_issues, report.resolved_issues, analysis.metadata.issues_skipped
    );
    println!(
        "   Avg first response: {:.1}h | Avg close: {:.1}h",
        averages.first_response_hours, averages.close_hours
    );
    println!(
        "   Avg iterations: {:.2} | Avg org units: {:.2} | Avg comment value: {:.1}",
        averages.iteration_count, averages.org_units_count, averages.comment_value_score
    );
    if let Some(dominant) = analysis::dominant_root_cause(&report.root_cause_distribution) {
        println!(
            "   Top root cause: {} ({:.1}%)",
            dominant.root_cause, dominant.percentage
        );
    }
    for rec in &report.recommendations {
        println!("   💡 {}", rec);
    }
    println!("   Duration: {:.1}s", analysis.metadata.duration_seconds);
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so problems go straight to stderr.
/// Returns the path of the file that was read, if any.
fn load_config(args: &Args) -> Result<(Config, Option<PathBuf>)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, Some(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, Some(PathBuf::from(CONFIG_FILE_NAME)))),
        Ok(None) => Ok((Config::default(), None)),
        Err(e) => {
            eprintln!("⚠️  Failed to load config, using defaults: {:#}", e);
            Ok((Config::default(), None))
        }
    }
}
