//! Issue-tracker collaborators.
//!
//! The analyzer fetches records through the [`IssueTracker`] trait. Two
//! sources are provided: a Jira REST client and a JSON export on disk.

pub mod file;
pub mod jira;

#[cfg(test)]
pub mod mock;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::RawIssueRecord;

pub use file::FileTracker;
pub use jira::{JiraConfig, JiraTracker};

/// Errors from fetching a single issue.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// The issue does not exist in the tracker.
    #[error("issue not found: {0}")]
    NotFound(String),

    /// The tracker answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request did not finish in time.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// Network or connection error.
    #[error("request failed: {0}")]
    Request(String),

    /// The payload could not be decoded into a record.
    #[error("invalid issue payload: {0}")]
    Decode(String),
}

/// A source of raw issue records.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Fetch one issue by its key.
    async fn fetch(&self, issue_id: &str) -> Result<RawIssueRecord, FetchError>;

    /// Every issue key this source can enumerate, if it supports listing.
    fn list_ids(&self) -> Option<Vec<String>> {
        None
    }

    /// Human-readable description of the source for report metadata.
    fn describe(&self) -> String;
}
