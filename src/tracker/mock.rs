//! In-memory tracker for tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{FetchError, IssueTracker};
use crate::models::RawIssueRecord;

/// Serves records from a map and fails on configured ids.
#[derive(Debug, Clone, Default)]
pub struct MockTracker {
    inner: Arc<Mutex<MockTrackerInner>>,
}

#[derive(Debug, Default)]
struct MockTrackerInner {
    records: HashMap<String, RawIssueRecord>,
    failures: HashMap<String, FetchError>,
    fetched: Vec<String>,
}

impl MockTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(self, record: RawIssueRecord) -> Self {
        self.inner
            .lock()
            .unwrap()
            .records
            .insert(record.id.clone(), record);
        self
    }

    pub fn with_failure(self, issue_id: &str, error: FetchError) -> Self {
        self.inner
            .lock()
            .unwrap()
            .failures
            .insert(issue_id.to_string(), error);
        self
    }

    /// Ids requested so far, in call order.
    pub fn fetched(&self) -> Vec<String> {
        self.inner.lock().unwrap().fetched.clone()
    }
}

#[async_trait]
impl IssueTracker for MockTracker {
    async fn fetch(&self, issue_id: &str) -> Result<RawIssueRecord, FetchError> {
        let mut inner = self.inner.lock().unwrap();
        inner.fetched.push(issue_id.to_string());

        if let Some(error) = inner.failures.get(issue_id) {
            return Err(error.clone());
        }

        inner
            .records
            .get(issue_id)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(issue_id.to_string()))
    }

    fn describe(&self) -> String {
        "mock tracker".to_string()
    }
}
