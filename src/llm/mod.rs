//! Language-model collaborator.
//!
//! The analyzers only see the [`LlmClient`] trait; the Ollama client is
//! one implementation and tests substitute [`mock::MockLlm`].

pub mod ollama;

#[cfg(test)]
pub mod mock;

use async_trait::async_trait;
use thiserror::Error;

pub use ollama::{OllamaClient, OllamaConfig};

/// Errors from a completion request.
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    /// The request did not finish within the configured timeout.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// The model server could not be reached.
    #[error("cannot connect to {0}")]
    Connect(String),

    /// The server answered with a non-success status.
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    /// The response body was not in the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Any other transport failure.
    #[error("request failed: {0}")]
    Request(String),
}

/// Produces a text completion for a prompt.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Complete `prompt`, producing at most `max_output` tokens.
    async fn complete(&self, prompt: &str, max_output: u32) -> Result<String, LlmError>;

    /// Model name for report metadata.
    fn model_name(&self) -> &str;
}
