//! Scripted LLM client for tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::{LlmClient, LlmError};

/// Returns queued replies in order and records every prompt.
///
/// Once the queue is empty, the last configured fallback reply is used.
#[derive(Debug, Clone, Default)]
pub struct MockLlm {
    inner: Arc<Mutex<MockLlmInner>>,
}

#[derive(Debug, Default)]
struct MockLlmInner {
    replies: VecDeque<Result<String, LlmError>>,
    fallback: Option<Result<String, LlmError>>,
    prompts: Vec<String>,
}

impl MockLlm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answer with `reply`.
    pub fn always(reply: &str) -> Self {
        let mock = Self::new();
        mock.inner.lock().unwrap().fallback = Some(Ok(reply.to_string()));
        mock
    }

    /// Always fail with `error`.
    pub fn failing(error: LlmError) -> Self {
        let mock = Self::new();
        mock.inner.lock().unwrap().fallback = Some(Err(error));
        mock
    }

    /// Queue a reply for the next call.
    pub fn push_reply(&self, reply: &str) -> &Self {
        self.inner
            .lock()
            .unwrap()
            .replies
            .push_back(Ok(reply.to_string()));
        self
    }

    /// Queue an error for the next call.
    pub fn push_error(&self, error: LlmError) -> &Self {
        self.inner.lock().unwrap().replies.push_back(Err(error));
        self
    }

    /// Prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.inner.lock().unwrap().prompts.clone()
    }

    pub fn call_count(&self) -> usize {
        self.inner.lock().unwrap().prompts.len()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn complete(&self, prompt: &str, _max_output: u32) -> Result<String, LlmError> {
        let mut inner = self.inner.lock().unwrap();
        inner.prompts.push(prompt.to_string());

        match inner.replies.pop_front() {
            Some(reply) => reply,
            None => inner
                .fallback
                .clone()
                .unwrap_or_else(|| Err(LlmError::Request("no scripted reply".to_string()))),
        }
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}
