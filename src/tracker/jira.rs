//! Jira REST client.
//!
//! Fetches one issue per request from `/rest/api/2/issue/{key}` with the
//! changelog expanded, and maps it into a [`RawIssueRecord`].

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{FetchError, IssueTracker};
use crate::models::{ChangeEntry, Comment, RawIssueRecord};

/// Connection settings for a Jira site.
#[derive(Debug, Clone)]
pub struct JiraConfig {
    pub base_url: String,
    /// Account email for basic auth.
    pub email: Option<String>,
    /// API token for basic auth.
    pub api_token: Option<String>,
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize)]
struct ApiIssue {
    key: String,
    fields: ApiFields,
    #[serde(default)]
    changelog: Option<ApiChangelog>,
}

#[derive(Debug, Deserialize)]
struct ApiFields {
    #[serde(default)]
    created: Option<String>,
    #[serde(default)]
    resolutiondate: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    assignee: Option<ApiUser>,
    #[serde(default)]
    comment: Option<ApiComments>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiUser {
    #[serde(default)]
    email_address: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    account_id: Option<String>,
}

impl ApiUser {
    /// Best available identity: email, then username, then account id.
    fn identity(&self) -> Option<String> {
        self.email_address
            .clone()
            .or_else(|| self.name.clone())
            .or_else(|| self.account_id.clone())
    }
}

#[derive(Debug, Default, Deserialize)]
struct ApiComments {
    #[serde(default)]
    comments: Vec<ApiComment>,
}

#[derive(Debug, Deserialize)]
struct ApiComment {
    #[serde(default)]
    author: Option<ApiUser>,
    #[serde(default)]
    body: Option<String>,
    created: String,
}

#[derive(Debug, Default, Deserialize)]
struct ApiChangelog {
    #[serde(default)]
    histories: Vec<ApiHistory>,
}

#[derive(Debug, Deserialize)]
struct ApiHistory {
    #[serde(default)]
    items: Vec<ApiHistoryItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiHistoryItem {
    field: String,
    #[serde(default)]
    to: Option<String>,
    #[serde(default, rename = "toString")]
    to_display: Option<String>,
}

/// Parse a Jira timestamp.
///
/// Jira emits `2024-01-01T05:30:00.000+0000`, which is not RFC 3339, so
/// both forms are accepted.
pub fn parse_jira_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::<FixedOffset>::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

impl ApiIssue {
    fn into_record(self) -> Result<RawIssueRecord, FetchError> {
        let fields = self.fields;

        let created = fields
            .created
            .as_deref()
            .and_then(parse_jira_timestamp)
            .ok_or_else(|| {
                FetchError::Decode(format!("{} has no valid creation timestamp", self.key))
            })?;

        let resolved = fields.resolutiondate.as_deref().and_then(parse_jira_timestamp);

        let comments = fields
            .comment
            .unwrap_or_default()
            .comments
            .into_iter()
            .filter_map(|c| {
                let created = parse_jira_timestamp(&c.created)?;
                Some(Comment {
                    author: c.author.and_then(|a| a.identity()),
                    body: c.body.unwrap_or_default(),
                    created,
                })
            })
            .collect();

        let history = self
            .changelog
            .unwrap_or_default()
            .histories
            .into_iter()
            .flat_map(|h| h.items)
            // Jira Cloud puts an account id, never an email, in `to` for assignee changes.
            .map(|item| ChangeEntry {
                field: item.field,
                to: item.to.or(item.to_display),
            })
            .collect();

        Ok(RawIssueRecord {
            id: self.key,
            created,
            resolved,
            comments,
            history,
            assignee: fields.assignee.and_then(|a| a.identity()),
            summary: fields.summary.unwrap_or_default(),
            description: fields.description.unwrap_or_default(),
        })
    }
}

/// Tracker backed by the Jira REST API.
pub struct JiraTracker {
    config: JiraConfig,
    client: reqwest::Client,
}

impl JiraTracker {
    pub fn new(config: JiraConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| FetchError::Request(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn issue_url(&self, issue_id: &str) -> String {
        format!(
            "{}/rest/api/2/issue/{}?expand=changelog",
            self.config.base_url.trim_end_matches('/'),
            issue_id
        )
    }
}

#[async_trait]
impl IssueTracker for JiraTracker {
    async fn fetch(&self, issue_id: &str) -> Result<RawIssueRecord, FetchError> {
        let url = self.issue_url(issue_id);
        debug!("Fetching {}", url);

        let mut request = self.client.get(&url);
        if let (Some(email), Some(token)) = (&self.config.email, &self.config.api_token) {
            request = request.basic_auth(email, Some(token));
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(self.config.timeout_seconds)
            } else {
                FetchError::Request(e.to_string())
            }
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(issue_id.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let issue: ApiIssue = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        issue.into_record()
    }

    fn describe(&self) -> String {
        self.config.base_url.clone()
    }
}
