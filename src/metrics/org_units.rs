//! Organizational span of an issue.
//!
//! Org units are inferred from identity strings, which only works when the
//! deployment follows a naming convention. The convention is therefore a
//! pluggable [`OrgUnitStrategy`], chosen through [`OrgUnitRule`] in the
//! config file.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::models::RawIssueRecord;

/// Maps an identity (usually an email address) to an org-unit token.
pub trait OrgUnitStrategy: Send + Sync {
    fn org_unit(&self, identity: &str) -> Option<String>;
}

/// `team.person@host`: the first dot-separated segment of the local part.
///
/// Local parts without a dot contribute nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalPartPrefix;

impl OrgUnitStrategy for LocalPartPrefix {
    fn org_unit(&self, identity: &str) -> Option<String> {
        let (local, _) = identity.split_once('@')?;
        let mut segments = local.split('.');
        let first = segments.next()?;

        if segments.next().is_none() || first.is_empty() {
            return None;
        }
        Some(first.to_lowercase())
    }
}

/// `person@unit.example.com`: the whole domain is the org unit.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailDomain;

impl OrgUnitStrategy for EmailDomain {
    fn org_unit(&self, identity: &str) -> Option<String> {
        let (_, domain) = identity.split_once('@')?;
        let domain = domain.trim();

        if domain.is_empty() {
            return None;
        }
        Some(domain.to_lowercase())
    }
}

/// Configurable choice of strategy.
///
/// Both rules need email-shaped identities. Jira Cloud records past
/// assignees in the changelog by account id only, so with a Jira source
/// only the current assignee and comment authors (when their email is
/// visible) contribute; file exports carrying emails count all three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrgUnitRule {
    #[default]
    LocalPartPrefix,
    EmailDomain,
}

impl OrgUnitRule {
    pub fn strategy(self) -> Box<dyn OrgUnitStrategy> {
        match self {
            OrgUnitRule::LocalPartPrefix => Box::new(LocalPartPrefix),
            OrgUnitRule::EmailDomain => Box::new(EmailDomain),
        }
    }
}

/// Counts distinct org units touching an issue.
pub struct OrgUnitExtractor {
    strategy: Box<dyn OrgUnitStrategy>,
}

impl Default for OrgUnitExtractor {
    fn default() -> Self {
        Self::new(OrgUnitRule::default().strategy())
    }
}

impl OrgUnitExtractor {
    pub fn new(strategy: Box<dyn OrgUnitStrategy>) -> Self {
        Self { strategy }
    }

    pub fn from_rule(rule: OrgUnitRule) -> Self {
        Self::new(rule.strategy())
    }

    /// Distinct tokens from past assignees, the current assignee and
    /// comment authors.
    pub fn org_units(&self, record: &RawIssueRecord) -> BTreeSet<String> {
        let past_assignees = record
            .history
            .iter()
            .filter(|entry| entry.field.eq_ignore_ascii_case("assignee"))
            .filter_map(|entry| entry.to.as_deref());

        let comment_authors = record.comments.iter().filter_map(|c| c.author.as_deref());

        past_assignees
            .chain(record.assignee.as_deref())
            .chain(comment_authors)
            .filter_map(|identity| self.strategy.org_unit(identity))
            .collect()
    }

    /// Number of distinct org units, floored at 1.
    pub fn org_units_count(&self, record: &RawIssueRecord) -> u32 {
        u32::try_from(self.org_units(record).len())
            .unwrap_or(u32::MAX)
            .max(1)
    }
}
