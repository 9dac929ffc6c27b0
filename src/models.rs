//! Data models for the issue analyzer.
//!
//! This module contains the core data structures used throughout
//! the application: raw tracker records, per-issue metrics, and reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A comment attached to an issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Author identity (usually an email address).
    #[serde(default)]
    pub author: Option<String>,
    /// Comment body text.
    #[serde(default)]
    pub body: String,
    /// When the comment was posted.
    pub created: DateTime<Utc>,
}

/// A single field change from the issue's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEntry {
    /// Name of the changed field (e.g. "status", "assignee").
    pub field: String,
    /// The new value of the field.
    #[serde(default)]
    pub to: Option<String>,
}

/// An issue as supplied by the tracker. Never mutated after fetch.
///
/// Every substructure defaults to empty so that partially populated
/// exports still deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawIssueRecord {
    /// Tracker key, e.g. "PROJ-123".
    pub id: String,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
    /// Resolution timestamp, if the issue is resolved.
    #[serde(default)]
    pub resolved: Option<DateTime<Utc>>,
    /// Comments in tracker order.
    #[serde(default)]
    pub comments: Vec<Comment>,
    /// Change history in tracker order.
    #[serde(default)]
    pub history: Vec<ChangeEntry>,
    /// Current assignee identity.
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
}

/// Root cause of an issue.
///
/// The set is closed: there is no catch-all bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootCause {
    PoorRequirement,
    TechnicalDebt,
    UnclearScope,
    CommunicationGap,
    ResourceConstraint,
    ExternalDependency,
    TestingIssue,
    DesignFlaw,
}

impl RootCause {
    /// All categories in their canonical order.
    pub const ALL: [RootCause; 8] = [
        RootCause::PoorRequirement,
        RootCause::TechnicalDebt,
        RootCause::UnclearScope,
        RootCause::CommunicationGap,
        RootCause::ResourceConstraint,
        RootCause::ExternalDependency,
        RootCause::TestingIssue,
        RootCause::DesignFlaw,
    ];

    /// Stable string tag used in prompts and serialized output.
    pub fn tag(&self) -> &'static str {
        match self {
            RootCause::PoorRequirement => "poor_requirement",
            RootCause::TechnicalDebt => "technical_debt",
            RootCause::UnclearScope => "unclear_scope",
            RootCause::CommunicationGap => "communication_gap",
            RootCause::ResourceConstraint => "resource_constraint",
            RootCause::ExternalDependency => "external_dependency",
            RootCause::TestingIssue => "testing_issue",
            RootCause::DesignFlaw => "design_flaw",
        }
    }

    /// One-line definition shown to the model.
    pub fn definition(&self) -> &'static str {
        match self {
            RootCause::PoorRequirement => "requirements were missing, incomplete or wrong",
            RootCause::TechnicalDebt => "existing code or infrastructure shortcuts slowed the work",
            RootCause::UnclearScope => "the boundaries of the work were undefined or kept shifting",
            RootCause::CommunicationGap => "information was lost between people or teams",
            RootCause::ResourceConstraint => "not enough people, time or budget was available",
            RootCause::ExternalDependency => "the work waited on a third party or another system",
            RootCause::TestingIssue => "defects escaped or tests were missing or unreliable",
            RootCause::DesignFlaw => "the chosen design or architecture was unsuitable",
        }
    }
}

impl fmt::Display for RootCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl FromStr for RootCause {
    type Err = String;

    /// Parses a tag, tolerating case and `-`/space separators.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");

        RootCause::ALL
            .into_iter()
            .find(|cause| cause.tag() == normalized)
            .ok_or_else(|| format!("Unknown root cause: {}", s))
    }
}

/// Metrics derived for one issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueMetrics {
    pub issue_id: String,
    /// Hours from creation to the earliest comment, 0.0 without comments.
    pub first_response_hours: f64,
    /// Hours from creation to resolution; `None` while unresolved.
    pub close_hours: Option<f64>,
    /// Number of status transitions, at least 1.
    pub iteration_count: u32,
    /// Usefulness of the discussion in [0, 10].
    pub comment_value_score: f64,
    /// Distinct org units involved, at least 1.
    pub org_units_count: u32,
    pub root_cause: RootCause,
    /// Classifier confidence in [0, 1].
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    /// True when an LLM call failed and a fallback value was used.
    #[serde(default)]
    pub degraded: bool,
}

/// Batch averages of the numeric metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricAverages {
    pub first_response_hours: f64,
    /// Mean over resolved issues only.
    pub close_hours: f64,
    pub iteration_count: f64,
    pub comment_value_score: f64,
    pub org_units_count: f64,
    pub confidence: f64,
}

/// Count and share of one root cause within a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootCauseShare {
    pub root_cause: RootCause,
    pub count: usize,
    /// Share of the batch, 0-100.
    pub percentage: f64,
}

/// Aggregated health report for a batch of issues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Number of issues in the batch.
    pub total_issues: usize,
    /// Number of issues with a resolution timestamp.
    pub resolved_issues: usize,
    pub averages: MetricAverages,
    /// One entry per root cause, in canonical order.
    pub root_cause_distribution: Vec<RootCauseShare>,
    pub recommendations: Vec<String>,
}

/// An issue that could not be analyzed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedIssue {
    pub issue_id: String,
    pub reason: String,
}

/// Metadata about an analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Where the issues came from (tracker URL or export path).
    pub source: String,
    /// Date and time of the analysis.
    pub analysis_date: DateTime<Utc>,
    /// Name of the LLM model used, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    pub issues_requested: usize,
    pub issues_analyzed: usize,
    pub issues_skipped: usize,
    /// Issues where at least one LLM call fell back.
    pub issues_degraded: usize,
    /// Duration of the analysis in seconds.
    pub duration_seconds: f64,
}

/// The complete output document of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub metadata: ReportMetadata,
    pub report: Report,
    pub issues: Vec<IssueMetrics>,
    pub skipped: Vec<SkippedIssue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_cause_tags_round_trip() {
        for cause in RootCause::ALL {
            assert_eq!(cause.tag().parse::<RootCause>(), Ok(cause));
        }
    }

    #[test]
    fn test_root_cause_from_str_normalizes() {
        assert_eq!(
            "Communication Gap".parse::<RootCause>(),
            Ok(RootCause::CommunicationGap)
        );
        assert_eq!(
            " design-flaw ".parse::<RootCause>(),
            Ok(RootCause::DesignFlaw)
        );
        assert!("other".parse::<RootCause>().is_err());
        assert!("".parse::<RootCause>().is_err());
    }

    #[test]
    fn test_root_cause_serde_uses_tags() {
        let json = serde_json::to_string(&RootCause::ExternalDependency).unwrap();
        assert_eq!(json, "\"external_dependency\"");

        let parsed: RootCause = serde_json::from_str("\"testing_issue\"").unwrap();
        assert_eq!(parsed, RootCause::TestingIssue);
    }

    #[test]
    fn test_raw_record_minimal_json() {
        let json = r#"{"id": "PROJ-1", "created": "2024-01-01T00:00:00Z"}"#;
        let record: RawIssueRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.id, "PROJ-1");
        assert!(record.resolved.is_none());
        assert!(record.comments.is_empty());
        assert!(record.history.is_empty());
        assert!(record.assignee.is_none());
        assert!(record.summary.is_empty());
    }

    #[test]
    fn test_unresolved_close_hours_serializes_as_null() {
        let metrics = IssueMetrics {
            issue_id: "PROJ-1".to_string(),
            first_response_hours: 0.0,
            close_hours: None,
            iteration_count: 1,
            comment_value_score: 5.0,
            org_units_count: 1,
            root_cause: RootCause::PoorRequirement,
            confidence: 0.5,
            rationale: None,
            degraded: false,
        };

        let json = serde_json::to_value(&metrics).unwrap();
        assert!(json["close_hours"].is_null());
        assert_eq!(json["root_cause"], "poor_requirement");
        assert!(json.get("rationale").is_none());
    }
}
