//! Mock provider for testing.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use studyforge_core::error::ProviderError;
use studyforge_core::traits::{ChatRequest, ChatResponse, LlmProvider, TokenUsage};

/// A mock LLM provider for exercising the study engine without real API calls.
///
/// Replies are chosen by the first rule whose key occurs in the system or
/// user prompt; unmatched requests get the default reply.
pub struct MockProvider {
    /// Ordered (prompt substring, reply) rules.
    rules: Vec<(String, MockReply)>,
    default_reply: MockReply,
    call_count: AtomicU32,
    requests: Mutex<Vec<ChatRequest>>,
}

/// What the mock answers with.
#[derive(Debug, Clone)]
pub enum MockReply {
    Content(String),
    Failure(String),
}

impl MockProvider {
    /// A mock that always returns the same content.
    pub fn with_fixed_response(content: &str) -> Self {
        Self::from_default(MockReply::Content(content.to_string()))
    }

    /// A mock whose every call fails with a network error.
    pub fn failing(message: &str) -> Self {
        Self::from_default(MockReply::Failure(message.to_string()))
    }

    fn from_default(default_reply: MockReply) -> Self {
        Self {
            rules: Vec::new(),
            default_reply,
            call_count: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Reply with `content` when a prompt contains `key`.
    pub fn respond_when(mut self, key: &str, content: &str) -> Self {
        self.rules
            .push((key.to_string(), MockReply::Content(content.to_string())));
        self
    }

    /// Fail when a prompt contains `key`.
    pub fn fail_when(mut self, key: &str, message: &str) -> Self {
        self.rules
            .push((key.to_string(), MockReply::Failure(message.to_string())));
        self
    }

    /// Get the number of calls made to this provider.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the last request made to this provider.
    pub fn last_request(&self) -> Option<ChatRequest> {
        self.requests.lock().ok()?.last().cloned()
    }

    /// All requests made to this provider, oldest first.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &ChatRequest) -> anyhow::Result<ChatResponse> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let reply = self
            .rules
            .iter()
            .find(|(key, _)| {
                request.system_prompt.contains(key.as_str())
                    || request.user_prompt.contains(key.as_str())
            })
            .map(|(_, reply)| reply)
            .unwrap_or(&self.default_reply);

        let content = match reply {
            MockReply::Content(content) => content.clone(),
            MockReply::Failure(message) => {
                return Err(ProviderError::NetworkError(message.clone()).into())
            }
        };

        let prompt_tokens = ((request.system_prompt.len() + request.user_prompt.len()) / 4) as u32;
        let completion_tokens = (content.len() / 4) as u32; // Rough estimate

        Ok(ChatResponse {
            content,
            model: request.model.clone(),
            token_usage: TokenUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            },
            latency_ms: 1,
        })
    }
}
