//! Issue analysis and batch aggregation.

pub mod aggregator;
pub mod analyzer;

pub use aggregator::*;
pub use analyzer::IssueAnalyzer;
