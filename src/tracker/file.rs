//! Issue records loaded from a JSON export.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

use super::{FetchError, IssueTracker};
use crate::models::RawIssueRecord;

/// Serves records from a JSON array of [`RawIssueRecord`]s.
pub struct FileTracker {
    path: PathBuf,
    /// Ids in file order.
    order: Vec<String>,
    records: HashMap<String, RawIssueRecord>,
}

impl FileTracker {
    /// Load an export file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read issue export: {}", path.display()))?;

        let parsed: Vec<RawIssueRecord> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse issue export: {}", path.display()))?;

        info!("Loaded {} issues from {}", parsed.len(), path.display());
        Ok(Self::from_records(path.to_path_buf(), parsed))
    }

    fn from_records(path: PathBuf, parsed: Vec<RawIssueRecord>) -> Self {
        let mut order = Vec::with_capacity(parsed.len());
        let mut records = HashMap::with_capacity(parsed.len());

        for record in parsed {
            if !records.contains_key(&record.id) {
                order.push(record.id.clone());
            }
            // Later duplicates win, matching a re-export that appends updates.
            records.insert(record.id.clone(), record);
        }

        Self {
            path,
            order,
            records,
        }
    }
}

#[async_trait]
impl IssueTracker for FileTracker {
    async fn fetch(&self, issue_id: &str) -> Result<RawIssueRecord, FetchError> {
        self.records
            .get(issue_id)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(issue_id.to_string()))
    }

    fn list_ids(&self) -> Option<Vec<String>> {
        Some(self.order.clone())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
