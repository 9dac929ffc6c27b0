//! Workflow iteration counting.

use crate::models::RawIssueRecord;

/// Number of status transitions in the history, floored at 1.
///
/// A ticket that never moved still went through one workflow pass.
pub fn iteration_count(record: &RawIssueRecord) -> u32 {
    let transitions = record
        .history
        .iter()
        .filter(|entry| entry.field.eq_ignore_ascii_case("status"))
        .count();

    u32::try_from(transitions).unwrap_or(u32::MAX).max(1)
}
