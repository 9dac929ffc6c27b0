//! Comment usefulness scoring.

use std::sync::Arc;
use tracing::{debug, warn};

use super::truncate_chars;
use crate::llm::LlmClient;
use crate::models::Comment;

/// Neutral score used whenever scoring is unavailable or fails.
pub const NEUTRAL_SCORE: f64 = 5.0;
pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 10.0;

const DEFAULT_MAX_OUTPUT: u32 = 16;

/// Result of scoring a discussion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommentScore {
    /// Always within [0, 10].
    pub value: f64,
    /// True when a model call was attempted and its answer was unusable.
    pub fallback: bool,
}

impl CommentScore {
    fn neutral(attempted: bool) -> Self {
        Self {
            value: NEUTRAL_SCORE,
            fallback: attempted,
        }
    }
}

/// Rates how much the comments on an issue moved it forward.
pub struct CommentValueScorer {
    llm: Option<Arc<dyn LlmClient>>,
    max_chars: usize,
    max_output: u32,
}

impl CommentValueScorer {
    pub fn new(llm: Option<Arc<dyn LlmClient>>, max_chars: usize) -> Self {
        Self {
            llm,
            max_chars,
            max_output: DEFAULT_MAX_OUTPUT,
        }
    }

    pub fn with_max_output(mut self, max_output: u32) -> Self {
        self.max_output = max_output;
        self
    }

    /// Score the comments. Never fails: every error path yields 5.0.
    pub async fn score(&self, comments: &[Comment]) -> CommentScore {
        if comments.is_empty() {
            return CommentScore::neutral(false);
        }
        let Some(llm) = &self.llm else {
            return CommentScore::neutral(false);
        };

        let prompt = self.build_prompt(comments);

        let response = match llm.complete(&prompt, self.max_output).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Comment scoring failed, using neutral score: {}", e);
                return CommentScore::neutral(true);
            }
        };

        match decode_score(&response) {
            Some(value) => {
                debug!("Comment value score: {:.1}", value);
                CommentScore {
                    value,
                    fallback: false,
                }
            }
            None => {
                warn!("Unusable comment score {:?}, using neutral score", response.trim());
                CommentScore::neutral(true)
            }
        }
    }

    fn build_prompt(&self, comments: &[Comment]) -> String {
        let joined = comments
            .iter()
            .map(|c| c.body.trim())
            .collect::<Vec<_>>()
            .join("\n---\n");
        let discussion = truncate_chars(&joined, self.max_chars);

        let mut prompt = String::new();
        prompt.push_str("Rate how valuable the following issue comments are on a scale of 0 to 10.\n\n");
        prompt.push_str("Rubric:\n");
        prompt.push_str("- 0-3: noise (status pings, +1s, off-topic chatter)\n");
        prompt.push_str("- 4-6: partially useful (some relevant detail, little progress)\n");
        prompt.push_str("- 7-10: highly valuable (root-cause analysis, decisions, clear next steps)\n\n");
        prompt.push_str("=== COMMENTS ===\n");
        prompt.push_str(discussion);
        prompt.push_str("\n=== END OF COMMENTS ===\n\n");
        prompt.push_str("Respond with a single number only.");

        prompt
    }
}

/// Decode a model answer into a score in [0, 10].
///
/// The whole reply must be one number, optionally followed by `/10` or a
/// full stop. Replies with surrounding prose are rejected, since they tend
/// to echo the rubric scale rather than state a score.
fn decode_score(response: &str) -> Option<f64> {
    let trimmed = response.trim();
    let trimmed = trimmed.strip_suffix('.').unwrap_or(trimmed);
    let number = trimmed.strip_suffix("/10").unwrap_or(trimmed).trim_end();

    let value = number.parse::<f64>().ok()?;
    if !value.is_finite() {
        return None;
    }

    Some(value.clamp(MIN_SCORE, MAX_SCORE))
}
