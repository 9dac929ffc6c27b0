//! Batch aggregation and recommendations.
//!
//! This module reduces a batch of [`IssueMetrics`] into averages, a
//! root-cause distribution and rule-based recommendations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::models::{IssueMetrics, MetricAverages, Report, RootCause, RootCauseShare};

/// Thresholds at which recommendations fire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecommendationThresholds {
    /// Share (percent) of `poor_requirement` above which rule 1 fires.
    #[serde(default = "default_poor_requirement_share")]
    pub poor_requirement_share: f64,

    /// Share (percent) of `communication_gap` above which rule 2 fires.
    #[serde(default = "default_communication_gap_share")]
    pub communication_gap_share: f64,

    /// Mean iteration count above which rule 3 fires.
    #[serde(default = "default_mean_iterations")]
    pub mean_iterations: f64,

    /// Mean org-unit count above which rule 4 fires.
    #[serde(default = "default_mean_org_units")]
    pub mean_org_units: f64,
}

impl Default for RecommendationThresholds {
    fn default() -> Self {
        Self {
            poor_requirement_share: default_poor_requirement_share(),
            communication_gap_share: default_communication_gap_share(),
            mean_iterations: default_mean_iterations(),
            mean_org_units: default_mean_org_units(),
        }
    }
}

fn default_poor_requirement_share() -> f64 {
    30.0
}

fn default_communication_gap_share() -> f64 {
    25.0
}

fn default_mean_iterations() -> f64 {
    5.0
}

fn default_mean_org_units() -> f64 {
    3.0
}

/// A recommendation the aggregator can emit, in firing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    ImproveRequirements,
    CrossTeamCommunication,
    UpfrontPlanning,
    ReduceCrossOrgDependencies,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Recommendation::ImproveRequirements => {
                "Improve requirement gathering and documentation: poor requirements are the most common root cause."
            }
            Recommendation::CrossTeamCommunication => {
                "Establish clearer cross-team communication protocols: communication gaps are the most common root cause."
            }
            Recommendation::UpfrontPlanning => {
                "Invest in stronger upfront planning: issues cycle through too many workflow iterations."
            }
            Recommendation::ReduceCrossOrgDependencies => {
                "Reduce cross-organizational dependencies: issues routinely span too many teams."
            }
        };
        write!(f, "{}", text)
    }
}

/// Reduces batches of metrics into [`Report`]s.
#[derive(Debug, Clone, Default)]
pub struct ReportAggregator {
    thresholds: RecommendationThresholds,
}

impl ReportAggregator {
    pub fn new(thresholds: RecommendationThresholds) -> Self {
        Self { thresholds }
    }

    /// Build a report. An empty batch yields a zero report.
    pub fn aggregate(&self, batch: &[IssueMetrics]) -> Report {
        let averages = compute_averages(batch);
        let root_cause_distribution = root_cause_distribution(batch);
        let recommendations = self
            .recommendations(&root_cause_distribution, &averages)
            .into_iter()
            .map(|r| r.to_string())
            .collect();

        Report {
            total_issues: batch.len(),
            resolved_issues: batch.iter().filter(|m| m.close_hours.is_some()).count(),
            averages,
            root_cause_distribution,
            recommendations,
        }
    }

    /// Evaluate every rule independently, in fixed order.
    pub fn recommendations(
        &self,
        distribution: &[RootCauseShare],
        averages: &MetricAverages,
    ) -> Vec<Recommendation> {
        let mut fired = Vec::new();

        if let Some(dominant) = dominant_root_cause(distribution) {
            let rule = match dominant.root_cause {
                RootCause::PoorRequirement => Some((
                    self.thresholds.poor_requirement_share,
                    Recommendation::ImproveRequirements,
                )),
                RootCause::CommunicationGap => Some((
                    self.thresholds.communication_gap_share,
                    Recommendation::CrossTeamCommunication,
                )),
                RootCause::TechnicalDebt
                | RootCause::UnclearScope
                | RootCause::ResourceConstraint
                | RootCause::ExternalDependency
                | RootCause::TestingIssue
                | RootCause::DesignFlaw => None,
            };

            if let Some((threshold, recommendation)) = rule {
                if dominant.percentage > threshold {
                    fired.push(recommendation);
                }
            }
        }

        if averages.iteration_count > self.thresholds.mean_iterations {
            fired.push(Recommendation::UpfrontPlanning);
        }

        if averages.org_units_count > self.thresholds.mean_org_units {
            fired.push(Recommendation::ReduceCrossOrgDependencies);
        }

        fired
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Arithmetic means; `close_hours` only over resolved issues.
pub fn compute_averages(batch: &[IssueMetrics]) -> MetricAverages {
    MetricAverages {
        first_response_hours: mean(batch.iter().map(|m| m.first_response_hours)),
        close_hours: mean(batch.iter().filter_map(|m| m.close_hours)),
        iteration_count: mean(batch.iter().map(|m| f64::from(m.iteration_count))),
        comment_value_score: mean(batch.iter().map(|m| m.comment_value_score)),
        org_units_count: mean(batch.iter().map(|m| f64::from(m.org_units_count))),
        confidence: mean(batch.iter().map(|m| m.confidence)),
    }
}

/// Count and percentage for every category, in canonical order.
pub fn root_cause_distribution(batch: &[IssueMetrics]) -> Vec<RootCauseShare> {
    let mut counts: BTreeMap<RootCause, usize> = BTreeMap::new();
    for metrics in batch {
        *counts.entry(metrics.root_cause).or_default() += 1;
    }

    RootCause::ALL
        .into_iter()
        .map(|root_cause| {
            let count = counts.get(&root_cause).copied().unwrap_or(0);
            let percentage = if batch.is_empty() {
                0.0
            } else {
                count as f64 * 100.0 / batch.len() as f64
            };
            RootCauseShare {
                root_cause,
                count,
                percentage,
            }
        })
        .collect()
}

/// Most frequent category; ties go to the earliest in canonical order.
pub fn dominant_root_cause(distribution: &[RootCauseShare]) -> Option<&RootCauseShare> {
    distribution
        .iter()
        .filter(|share| share.count > 0)
        .fold(None, |best: Option<&RootCauseShare>, share| match best {
            Some(b) if b.count >= share.count => Some(b),
            _ => Some(share),
        })
}

/// The `n` issues with the most workflow iterations.
pub fn most_iterated_issues(batch: &[IssueMetrics], n: usize) -> Vec<&IssueMetrics> {
    let mut sorted: Vec<&IssueMetrics> = batch.iter().collect();
    sorted.sort_by_key(|m| std::cmp::Reverse(m.iteration_count));
    sorted.truncate(n);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_metrics(root_cause: RootCause) -> IssueMetrics {
        IssueMetrics {
            issue_id: "T-1".to_string(),
            first_response_hours: 2.0,
            close_hours: Some(10.0),
            iteration_count: 2,
            comment_value_score: 6.0,
            org_units_count: 1,
            root_cause,
            confidence: 0.8,
            rationale: None,
            degraded: false,
        }
    }

    fn batch_of(causes: &[RootCause]) -> Vec<IssueMetrics> {
        causes
            .iter()
            .enumerate()
            .map(|(i, cause)| IssueMetrics {
                issue_id: format!("T-{}", i + 1),
                ..create_test_metrics(*cause)
            })
            .collect()
    }

    #[test]
    fn test_empty_batch_is_zero_report() {
        let report = ReportAggregator::default().aggregate(&[]);

        assert_eq!(report.total_issues, 0);
        assert_eq!(report.averages, MetricAverages::default());
        assert_eq!(report.root_cause_distribution.len(), 8);
        assert!(report
            .root_cause_distribution
            .iter()
            .all(|s| s.count == 0 && s.percentage == 0.0));
        assert!(report.recommendations.is_empty());
    }

    #[test]
    fn test_poor_requirement_majority_fires_rule_one_only() {
        use RootCause::*;
        let batch = batch_of(&[PoorRequirement, PoorRequirement, TechnicalDebt]);
        let report = ReportAggregator::default().aggregate(&batch);

        let share = &report.root_cause_distribution[0];
        assert_eq!(share.root_cause, PoorRequirement);
        assert_eq!(share.count, 2);
        assert!((share.percentage - 66.666).abs() < 0.01);

        assert_eq!(
            report.recommendations,
            vec![Recommendation::ImproveRequirements.to_string()]
        );
    }

    #[test]
    fn test_communication_gap_rule() {
        use RootCause::*;
        let batch = batch_of(&[CommunicationGap, CommunicationGap, DesignFlaw, TestingIssue]);
        let report = ReportAggregator::default().aggregate(&batch);

        assert_eq!(
            report.recommendations,
            vec![Recommendation::CrossTeamCommunication.to_string()]
        );
    }

    #[test]
    fn test_share_must_exceed_threshold() {
        use RootCause::*;
        // 30% exactly does not fire.
        let mut causes = vec![PoorRequirement; 3];
        causes.extend([TechnicalDebt, TechnicalDebt, UnclearScope, UnclearScope]);
        causes.extend([DesignFlaw, TestingIssue, ExternalDependency]);
        let report = ReportAggregator::default().aggregate(&batch_of(&causes));

        assert!((report.root_cause_distribution[0].percentage - 30.0).abs() < 1e-9);
        assert!(report.recommendations.is_empty());
    }

    #[test]
    fn test_tie_breaks_by_canonical_order() {
        use RootCause::*;
        let batch = batch_of(&[CommunicationGap, PoorRequirement]);
        let distribution = root_cause_distribution(&batch);

        let dominant = dominant_root_cause(&distribution).unwrap();
        assert_eq!(dominant.root_cause, PoorRequirement);

        let report = ReportAggregator::default().aggregate(&batch);
        assert_eq!(
            report.recommendations,
            vec![Recommendation::ImproveRequirements.to_string()]
        );
    }

    #[test]
    fn test_iteration_and_org_unit_rules() {
        let mut batch = batch_of(&[RootCause::DesignFlaw, RootCause::TechnicalDebt]);
        batch[0].iteration_count = 9;
        batch[1].iteration_count = 3;
        batch[0].org_units_count = 5;
        batch[1].org_units_count = 2;

        let report = ReportAggregator::default().aggregate(&batch);

        assert_eq!(report.averages.iteration_count, 6.0);
        assert_eq!(report.averages.org_units_count, 3.5);
        assert_eq!(
            report.recommendations,
            vec![
                Recommendation::UpfrontPlanning.to_string(),
                Recommendation::ReduceCrossOrgDependencies.to_string(),
            ]
        );
    }

    #[test]
    fn test_all_rules_fire_in_order() {
        let mut batch = batch_of(&[RootCause::PoorRequirement; 2]);
        for m in &mut batch {
            m.iteration_count = 6;
            m.org_units_count = 4;
        }

        let report = ReportAggregator::default().aggregate(&batch);
        assert_eq!(report.recommendations.len(), 3);
        assert_eq!(
            report.recommendations[0],
            Recommendation::ImproveRequirements.to_string()
        );
    }

    #[test]
    fn test_close_hours_mean_skips_unresolved() {
        let mut batch = batch_of(&[RootCause::DesignFlaw; 3]);
        batch[0].close_hours = Some(4.0);
        batch[1].close_hours = None;
        batch[2].close_hours = Some(0.0);

        let report = ReportAggregator::default().aggregate(&batch);

        assert_eq!(report.resolved_issues, 2);
        assert_eq!(report.averages.close_hours, 2.0);
    }

    #[test]
    fn test_percentages_sum_to_hundred() {
        use RootCause::*;
        let batch = batch_of(&[
            PoorRequirement,
            TechnicalDebt,
            UnclearScope,
            DesignFlaw,
            DesignFlaw,
            ExternalDependency,
            TestingIssue,
        ]);
        let total: f64 = root_cause_distribution(&batch)
            .iter()
            .map(|s| s.percentage)
            .sum();

        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        use RootCause::*;
        let batch = batch_of(&[ResourceConstraint, CommunicationGap, CommunicationGap]);
        let aggregator = ReportAggregator::default();

        assert_eq!(aggregator.aggregate(&batch), aggregator.aggregate(&batch));
    }

    #[test]
    fn test_custom_thresholds() {
        let aggregator = ReportAggregator::new(RecommendationThresholds {
            mean_iterations: 1.0,
            ..RecommendationThresholds::default()
        });
        let report = aggregator.aggregate(&batch_of(&[RootCause::DesignFlaw]));

        assert_eq!(
            report.recommendations,
            vec![Recommendation::UpfrontPlanning.to_string()]
        );
    }

    #[test]
    fn test_most_iterated_issues() {
        let mut batch = batch_of(&[RootCause::DesignFlaw; 3]);
        batch[1].iteration_count = 7;
        batch[2].iteration_count = 4;

        let top = most_iterated_issues(&batch, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].issue_id, "T-2");
        assert_eq!(top[1].issue_id, "T-3");
    }
}
