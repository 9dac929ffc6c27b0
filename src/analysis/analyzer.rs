//! Per-issue analysis and batch orchestration.

use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::classify::{CommentValueScorer, RootCauseClassifier};
use crate::metrics::{close_hours, first_response_hours, iteration_count, OrgUnitExtractor};
use crate::models::{IssueMetrics, RawIssueRecord, SkippedIssue};
use crate::tracker::{FetchError, IssueTracker};

/// Metrics for every analyzed issue plus notices for the skipped ones.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// In input order.
    pub metrics: Vec<IssueMetrics>,
    pub skipped: Vec<SkippedIssue>,
}

/// Fetches issues and derives their metrics.
pub struct IssueAnalyzer {
    tracker: Arc<dyn IssueTracker>,
    classifier: RootCauseClassifier,
    scorer: CommentValueScorer,
    org_units: OrgUnitExtractor,
    concurrency: usize,
}

impl IssueAnalyzer {
    pub fn new(
        tracker: Arc<dyn IssueTracker>,
        classifier: RootCauseClassifier,
        scorer: CommentValueScorer,
        org_units: OrgUnitExtractor,
    ) -> Self {
        Self {
            tracker,
            classifier,
            scorer,
            org_units,
            concurrency: 1,
        }
    }

    /// Maximum number of issues in flight at once.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Derive metrics for an already fetched record. Never fails.
    pub async fn analyze_record(&self, record: &RawIssueRecord) -> IssueMetrics {
        let (classification, score) = tokio::join!(
            self.classifier
                .classify(&record.summary, &record.description, &record.comments),
            self.scorer.score(&record.comments),
        );

        IssueMetrics {
            issue_id: record.id.clone(),
            first_response_hours: first_response_hours(record),
            close_hours: close_hours(record),
            iteration_count: iteration_count(record),
            comment_value_score: score.value,
            org_units_count: self.org_units.org_units_count(record),
            root_cause: classification.root_cause,
            confidence: classification.confidence,
            rationale: classification.rationale,
            degraded: classification.fallback || score.fallback,
        }
    }

    /// Fetch one issue and derive its metrics.
    pub async fn analyze_issue(&self, issue_id: &str) -> Result<IssueMetrics, FetchError> {
        let record = self.tracker.fetch(issue_id).await?;
        debug!(
            "Fetched {}: {} comments, {} history entries",
            record.id,
            record.comments.len(),
            record.history.len()
        );
        Ok(self.analyze_record(&record).await)
    }

    /// Analyze a batch. A failing issue is skipped, never fatal.
    ///
    /// Duplicate ids are analyzed once. Returns after every issue has
    /// either completed or been skipped.
    pub async fn analyze_batch(
        &self,
        issue_ids: &[String],
        progress: Option<&ProgressBar>,
    ) -> BatchOutcome {
        let mut seen = HashSet::new();
        let unique: Vec<&String> = issue_ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .collect();

        if unique.len() < issue_ids.len() {
            debug!(
                "Ignoring {} duplicate issue ids",
                issue_ids.len() - unique.len()
            );
        }

        info!(
            "Analyzing {} issues (concurrency {})",
            unique.len(),
            self.concurrency
        );

        let results: Vec<(String, Result<IssueMetrics, FetchError>)> = stream::iter(unique)
            .map(|id| async move {
                let result = self.analyze_issue(id).await;
                if let Some(pb) = progress {
                    pb.inc(1);
                }
                (id.clone(), result)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut outcome = BatchOutcome::default();
        for (issue_id, result) in results {
            match result {
                Ok(metrics) => outcome.metrics.push(metrics),
                Err(e) => {
                    warn!("Skipping {}: {}", issue_id, e);
                    outcome.skipped.push(SkippedIssue {
                        issue_id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Analyzed {} issues, skipped {}",
            outcome.metrics.len(),
            outcome.skipped.len()
        );

        outcome
    }
}
