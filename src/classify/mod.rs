//! LLM-backed per-issue judgements.
//!
//! Both analyzers degrade to a fixed neutral value whenever the model is
//! missing, fails, or answers in an unusable shape, so a batch never
//! aborts because of one bad completion.

pub mod comment_value;
pub mod root_cause;

pub use comment_value::CommentValueScorer;
pub use root_cause::RootCauseClassifier;

/// Bounds on how much issue text goes into each prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptLimits {
    /// Characters of the description sent to the classifier.
    pub description_chars: usize,
    /// Comments sent to the classifier.
    pub classify_comments: usize,
    /// Characters of concatenated comments sent to the classifier.
    pub classify_comment_chars: usize,
    /// Characters of concatenated comments sent to the scorer.
    pub score_comment_chars: usize,
}

impl Default for PromptLimits {
    fn default() -> Self {
        Self {
            description_chars: 500,
            classify_comments: 5,
            classify_comment_chars: 1000,
            score_comment_chars: 2000,
        }
    }
}

/// First `max_chars` characters of `text`, never splitting a code point.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
