//! Root-cause classification.

use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{truncate_chars, PromptLimits};
use crate::llm::LlmClient;
use crate::models::{Comment, RootCause};

/// Category used whenever classification is unavailable or fails.
pub const FALLBACK_ROOT_CAUSE: RootCause = RootCause::PoorRequirement;
/// Confidence paired with [`FALLBACK_ROOT_CAUSE`].
pub const FALLBACK_CONFIDENCE: f64 = 0.5;

const DEFAULT_MAX_OUTPUT: u32 = 256;

/// Result of classifying one issue.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub root_cause: RootCause,
    /// Always within [0, 1].
    pub confidence: f64,
    pub rationale: Option<String>,
    /// True when a model call was attempted and its answer was unusable.
    pub fallback: bool,
}

impl Classification {
    fn fallback(attempted: bool) -> Self {
        Self {
            root_cause: FALLBACK_ROOT_CAUSE,
            confidence: FALLBACK_CONFIDENCE,
            rationale: None,
            fallback: attempted,
        }
    }
}

/// Shape requested from the model.
#[derive(Debug, Deserialize)]
struct ClassificationReply {
    category: String,
    confidence: f64,
    #[serde(default)]
    rationale: Option<String>,
}

/// Assigns one of the eight [`RootCause`] categories to an issue.
pub struct RootCauseClassifier {
    llm: Option<Arc<dyn LlmClient>>,
    limits: PromptLimits,
    max_output: u32,
}

impl RootCauseClassifier {
    pub fn new(llm: Option<Arc<dyn LlmClient>>, limits: PromptLimits) -> Self {
        Self {
            llm,
            limits,
            max_output: DEFAULT_MAX_OUTPUT,
        }
    }

    pub fn with_max_output(mut self, max_output: u32) -> Self {
        self.max_output = max_output;
        self
    }

    /// Classify an issue. Never fails: every error path yields the
    /// `(poor_requirement, 0.5)` fallback.
    pub async fn classify(
        &self,
        summary: &str,
        description: &str,
        comments: &[Comment],
    ) -> Classification {
        let Some(llm) = &self.llm else {
            return Classification::fallback(false);
        };

        let prompt = self.build_prompt(summary, description, comments);

        let response = match llm.complete(&prompt, self.max_output).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Root-cause classification failed, using fallback: {}", e);
                return Classification::fallback(true);
            }
        };

        match decode_classification(&response) {
            Some(classification) => {
                debug!(
                    "Classified as {} ({:.2})",
                    classification.root_cause, classification.confidence
                );
                classification
            }
            None => {
                warn!("Unusable classification response, using fallback");
                debug!("Raw classification response: {}", response);
                Classification::fallback(true)
            }
        }
    }

    fn build_prompt(&self, summary: &str, description: &str, comments: &[Comment]) -> String {
        let description = truncate_chars(description, self.limits.description_chars);

        let joined = comments
            .iter()
            .take(self.limits.classify_comments)
            .map(|c| c.body.trim())
            .collect::<Vec<_>>()
            .join("\n---\n");
        let discussion = truncate_chars(&joined, self.limits.classify_comment_chars);

        let mut prompt = String::new();
        prompt.push_str(
            "Classify the root cause of why the following issue needed extra work or iteration.\n\n",
        );
        prompt.push_str("Categories:\n");
        for cause in RootCause::ALL {
            prompt.push_str(&format!("- {}: {}\n", cause.tag(), cause.definition()));
        }

        prompt.push_str("\n=== ISSUE ===\n");
        prompt.push_str(&format!("Summary: {}\n", summary.trim()));
        prompt.push_str(&format!("Description: {}\n", description.trim()));
        prompt.push_str(&format!("Comments:\n{}\n", discussion));
        prompt.push_str("=== END OF ISSUE ===\n\n");

        prompt.push_str("Respond with exactly one JSON object in this format:\n");
        prompt.push_str(
            r#"{"category": "one of the category tags above", "confidence": 0.0 to 1.0, "rationale": "one sentence"}"#,
        );
        prompt.push_str("\nOnly output JSON, no other text.");

        prompt
    }
}

/// Decode a model answer into a validated classification.
///
/// The JSON object may be wrapped in code fences or chatter. The first
/// object that has the requested shape is used, whatever follows it.
/// Unknown categories and missing or non-finite confidence are rejected;
/// confidence is clamped to [0, 1].
fn decode_classification(response: &str) -> Option<Classification> {
    let reply = response
        .match_indices('{')
        .find_map(|(start, _)| first_reply(&response[start..]))?;
    let root_cause = reply.category.parse::<RootCause>().ok()?;

    if !reply.confidence.is_finite() {
        return None;
    }

    let rationale = reply
        .rationale
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());

    Some(Classification {
        root_cause,
        confidence: reply.confidence.clamp(0.0, 1.0),
        rationale,
        fallback: false,
    })
}

/// Deserialize one reply from the start of `text`, ignoring anything after it.
fn first_reply(text: &str) -> Option<ClassificationReply> {
    serde_json::Deserializer::from_str(text)
        .into_iter::<ClassificationReply>()
        .next()?
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::MockLlm;
    use crate::llm::LlmError;
    use chrono::Utc;

    fn classifier(mock: &MockLlm) -> RootCauseClassifier {
        RootCauseClassifier::new(Some(Arc::new(mock.clone())), PromptLimits::default())
    }

    fn comments(bodies: &[&str]) -> Vec<Comment> {
        bodies
            .iter()
            .map(|b| Comment {
                author: None,
                body: b.to_string(),
                created: Utc::now(),
            })
            .collect()
    }

    #[test]
    fn test_decode_plain_json() {
        let c = decode_classification(
            r#"{"category": "technical_debt", "confidence": 0.82, "rationale": "legacy module"}"#,
        )
        .unwrap();

        assert_eq!(c.root_cause, RootCause::TechnicalDebt);
        assert_eq!(c.confidence, 0.82);
        assert_eq!(c.rationale.as_deref(), Some("legacy module"));
        assert!(!c.fallback);
    }

    #[test]
    fn test_decode_fenced_json_with_chatter() {
        let response = "Sure!\n```json\n{\"category\": \"Communication Gap\", \"confidence\": 1}\n```";
        let c = decode_classification(response).unwrap();

        assert_eq!(c.root_cause, RootCause::CommunicationGap);
        assert_eq!(c.confidence, 1.0);
        assert!(c.rationale.is_none());
    }

    #[test]
    fn test_decode_ignores_trailing_text() {
        let c = decode_classification(
            "{\"category\": \"design_flaw\", \"confidence\": 0.8}\nNote: see {ticket}.",
        )
        .unwrap();
        assert_eq!(c.root_cause, RootCause::DesignFlaw);
        assert_eq!(c.confidence, 0.8);

        let two = concat!(
            r#"{"category": "testing_issue", "confidence": 0.6}"#,
            "\n",
            r#"{"category": "design_flaw", "confidence": 0.9}"#,
        );
        assert_eq!(
            decode_classification(two).unwrap().root_cause,
            RootCause::TestingIssue
        );
    }

    #[test]
    fn test_decode_skips_braces_before_the_object() {
        let response = r#"Format {category}: {"category": "unclear_scope", "confidence": 0.4}"#;
        let c = decode_classification(response).unwrap();

        assert_eq!(c.root_cause, RootCause::UnclearScope);
    }

    #[test]
    fn test_decode_clamps_confidence() {
        let high = decode_classification(r#"{"category": "design_flaw", "confidence": 7.5}"#);
        assert_eq!(high.unwrap().confidence, 1.0);

        let low = decode_classification(r#"{"category": "design_flaw", "confidence": -0.3}"#);
        assert_eq!(low.unwrap().confidence, 0.0);
    }

    #[test]
    fn test_decode_rejects_bad_answers() {
        assert!(decode_classification("technical_debt").is_none());
        assert!(decode_classification("} nonsense {").is_none());
        assert!(decode_classification(r#"{"category": "other", "confidence": 0.9}"#).is_none());
        assert!(decode_classification(r#"{"category": "design_flaw"}"#).is_none());
        assert!(
            decode_classification(r#"{"category": "design_flaw", "confidence": "high"}"#)
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_no_llm_returns_fallback_without_call() {
        let classifier = RootCauseClassifier::new(None, PromptLimits::default());
        let c = classifier.classify("s", "d", &[]).await;

        assert_eq!(c.root_cause, RootCause::PoorRequirement);
        assert_eq!(c.confidence, 0.5);
        assert!(!c.fallback);
    }

    #[tokio::test]
    async fn test_llm_error_returns_exact_fallback() {
        let mock = MockLlm::failing(LlmError::Timeout(30));
        let c = classifier(&mock).classify("s", "d", &[]).await;

        assert_eq!((c.root_cause, c.confidence), (RootCause::PoorRequirement, 0.5));
        assert!(c.fallback);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_garbage_response_returns_fallback() {
        let mock = MockLlm::always("I think it's probably a requirements thing.");
        let c = classifier(&mock).classify("s", "d", &[]).await;

        assert_eq!((c.root_cause, c.confidence), (RootCause::PoorRequirement, 0.5));
        assert!(c.fallback);
    }

    #[tokio::test]
    async fn test_valid_response_is_used() {
        let mock = MockLlm::always(
            r#"{"category": "external_dependency", "confidence": 0.9, "rationale": "vendor API"}"#,
        );
        let c = classifier(&mock).classify("s", "d", &[]).await;

        assert_eq!(c.root_cause, RootCause::ExternalDependency);
        assert_eq!(c.confidence, 0.9);
    }

    #[tokio::test]
    async fn test_each_call_is_independent() {
        let mock = MockLlm::new();
        mock.push_error(LlmError::Api {
            status: 500,
            body: "model crashed".to_string(),
        })
        .push_reply(r#"{"category": "unclear_scope", "confidence": 0.6}"#);
        let classifier = classifier(&mock);

        let first = classifier.classify("a", "b", &[]).await;
        let second = classifier.classify("a", "b", &[]).await;

        assert!(first.fallback);
        assert_eq!(second.root_cause, RootCause::UnclearScope);
        assert!(!second.fallback);
    }

    #[tokio::test]
    async fn test_prompt_is_bounded() {
        let mock = MockLlm::always(r#"{"category": "design_flaw", "confidence": 0.4}"#);
        let description = "d".repeat(2_000);
        let bodies: Vec<String> = (0..8).map(|i| format!("comment-{}", i)).collect();
        let body_refs: Vec<&str> = bodies.iter().map(String::as_str).collect();

        classifier(&mock)
            .classify("Checkout fails", &description, &comments(&body_refs))
            .await;

        let prompt = &mock.prompts()[0];
        assert!(prompt.contains("Summary: Checkout fails"));
        assert!(prompt.contains(&"d".repeat(500)));
        assert!(!prompt.contains(&"d".repeat(501)));
        assert!(prompt.contains("comment-4"));
        assert!(!prompt.contains("comment-5"));
        for cause in RootCause::ALL {
            assert!(prompt.contains(cause.tag()));
        }
    }
}
