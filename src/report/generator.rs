//! Markdown and JSON report generation.
//!
//! This module renders an [`AnalysisReport`] for humans (Markdown) or
//! machines (JSON).

use anyhow::Result;

use crate::analysis::{dominant_root_cause, most_iterated_issues};
use crate::models::{AnalysisReport, IssueMetrics, Report, ReportMetadata, SkippedIssue};

/// Generate a complete Markdown report.
pub fn generate_markdown_report(analysis: &AnalysisReport) -> String {
    let mut output = String::new();

    // Title
    output.push_str("# Issue Health Report\n\n");

    output.push_str(&generate_metadata_section(&analysis.metadata));
    output.push_str(&generate_summary_section(&analysis.report));
    output.push_str(&generate_distribution_section(&analysis.report));
    output.push_str(&generate_issues_section(&analysis.issues));
    output.push_str(&generate_skipped_section(&analysis.skipped));
    output.push_str(&generate_recommendations_section(
        &analysis.report.recommendations,
    ));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** {}\n", metadata.source));
    section.push_str(&format!(
        "- **Analysis Date:** {}\n",
        metadata.analysis_date.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    match metadata.model_used {
        Some(ref model) => section.push_str(&format!("- **Model Used:** `{}`\n", model)),
        None => section.push_str("- **Model Used:** none (neutral fallback values)\n"),
    }
    section.push_str(&format!(
        "- **Issues Analyzed:** {} of {}\n",
        metadata.issues_analyzed, metadata.issues_requested
    ));
    if metadata.issues_skipped > 0 {
        section.push_str(&format!("- **Issues Skipped:** {}\n", metadata.issues_skipped));
    }
    if metadata.issues_degraded > 0 {
        section.push_str(&format!(
            "- **Issues With Fallback Values:** {}\n",
            metadata.issues_degraded
        ));
    }
    section.push_str(&format!(
        "- **Analysis Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the averages section.
fn generate_summary_section(report: &Report) -> String {
    let mut section = String::new();
    let averages = &report.averages;

    section.push_str("## Summary\n\n");

    if report.total_issues == 0 {
        section.push_str("No issues were analyzed.\n\n");
        return section;
    }

    section.push_str("| Metric | Average |\n");
    section.push_str("|:---|---:|\n");
    section.push_str(&format!(
        "| First response (hours) | {:.1} |\n",
        averages.first_response_hours
    ));
    section.push_str(&format!(
        "| Time to close (hours, {} resolved) | {:.1} |\n",
        report.resolved_issues, averages.close_hours
    ));
    section.push_str(&format!(
        "| Workflow iterations | {:.2} |\n",
        averages.iteration_count
    ));
    section.push_str(&format!(
        "| Comment value (0-10) | {:.1} |\n",
        averages.comment_value_score
    ));
    section.push_str(&format!(
        "| Org units involved | {:.2} |\n",
        averages.org_units_count
    ));
    section.push_str(&format!(
        "| Classification confidence | {:.2} |\n",
        averages.confidence
    ));
    section.push('\n');

    section
}

/// Generate the root-cause distribution section.
fn generate_distribution_section(report: &Report) -> String {
    let mut section = String::new();

    section.push_str("## Root Cause Distribution\n\n");
    section.push_str("| Root Cause | Issues | Share |\n");
    section.push_str("|:---|:---:|---:|\n");

    for share in &report.root_cause_distribution {
        section.push_str(&format!(
            "| {} | {} | {:.1}% |\n",
            share.root_cause, share.count, share.percentage
        ));
    }
    section.push('\n');

    if let Some(dominant) = dominant_root_cause(&report.root_cause_distribution) {
        section.push_str(&format!(
            "Most common root cause: **{}** ({:.1}%)\n\n",
            dominant.root_cause, dominant.percentage
        ));
    }

    section
}

/// Generate the per-issue section.
fn generate_issues_section(issues: &[IssueMetrics]) -> String {
    let mut section = String::new();

    section.push_str("## Issues\n\n");

    if issues.is_empty() {
        section.push_str("No issues to show.\n\n");
        return section;
    }

    let most_iterated = most_iterated_issues(issues, 5);
    if most_iterated.iter().any(|m| m.iteration_count > 1) {
        section.push_str("### Most Iterated Issues\n\n");
        for metrics in most_iterated.iter().filter(|m| m.iteration_count > 1) {
            section.push_str(&format!(
                "- `{}`: {} iterations, {}\n",
                metrics.issue_id, metrics.iteration_count, metrics.root_cause
            ));
        }
        section.push('\n');
    }

    section.push_str("### All Issues\n\n");
    section.push_str(
        "| Issue | First Response (h) | Close (h) | Iterations | Comment Value | Org Units | Root Cause | Confidence |\n",
    );
    section.push_str("|:---|---:|---:|:---:|:---:|:---:|:---|:---:|\n");

    for metrics in issues {
        section.push_str(&generate_issue_row(metrics));
    }
    section.push('\n');

    section
}

/// Generate a single issue table row.
fn generate_issue_row(metrics: &IssueMetrics) -> String {
    let close = match metrics.close_hours {
        Some(hours) => format!("{:.1}", hours),
        None => "open".to_string(),
    };
    let marker = if metrics.degraded { " ⚠️" } else { "" };

    format!(
        "| `{}`{} | {:.1} | {} | {} | {:.1} | {} | {} | {:.2} |\n",
        metrics.issue_id,
        marker,
        metrics.first_response_hours,
        close,
        metrics.iteration_count,
        metrics.comment_value_score,
        metrics.org_units_count,
        metrics.root_cause,
        metrics.confidence
    )
}

/// Generate the skipped-issues section.
fn generate_skipped_section(skipped: &[SkippedIssue]) -> String {
    if skipped.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Skipped Issues\n\n");
    for issue in skipped {
        section.push_str(&format!("- `{}`: {}\n", issue.issue_id, issue.reason));
    }
    section.push('\n');

    section
}

/// Generate the recommendations section.
fn generate_recommendations_section(recommendations: &[String]) -> String {
    let mut section = String::new();

    section.push_str("## Recommendations\n\n");

    if recommendations.is_empty() {
        section.push_str("No thresholds were crossed. Keep monitoring.\n\n");
        return section;
    }

    for (i, rec) in recommendations.iter().enumerate() {
        section.push_str(&format!("{}. {}\n", i + 1, rec));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by IssueLens*\n".to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(analysis: &AnalysisReport) -> Result<String> {
    serde_json::to_string_pretty(analysis).map_err(Into::into)
}
