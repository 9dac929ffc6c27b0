//! Response and close durations.

use chrono::{DateTime, Utc};

use crate::models::RawIssueRecord;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

fn hours_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_milliseconds() as f64 / MILLIS_PER_HOUR
}

/// Hours from creation to the earliest comment; 0.0 when there are none.
///
/// Ties keep the first comment in tracker order. Inconsistent upstream
/// data can yield a negative value.
pub fn first_response_hours(record: &RawIssueRecord) -> f64 {
    record
        .comments
        .iter()
        .min_by_key(|c| c.created)
        .map(|c| hours_between(record.created, c.created))
        .unwrap_or(0.0)
}

/// Hours from creation to resolution, or `None` while unresolved.
pub fn close_hours(record: &RawIssueRecord) -> Option<f64> {
    record
        .resolved
        .map(|resolved| hours_between(record.created, resolved))
}
