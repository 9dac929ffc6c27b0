//! Deterministic per-issue metrics.
//!
//! Everything here is a pure function of a [`RawIssueRecord`]; the
//! LLM-backed scores live in `classify`.
//!
//! [`RawIssueRecord`]: crate::models::RawIssueRecord

pub mod iterations;
pub mod org_units;
pub mod temporal;

pub use iterations::iteration_count;
pub use org_units::{OrgUnitExtractor, OrgUnitRule};
pub use temporal::{close_hours, first_response_hours};
