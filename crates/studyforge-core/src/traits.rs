//! Collaborator trait definitions: LLM providers, exam stores, and
//! document extractors.
//!
//! LLM providers are implemented in `studyforge-providers`, the Redis store in
//! `studyforge-store`. An in-memory store and a plain-text extractor live in
//! this crate.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{DocumentError, StoreError};
use crate::model::{Exam, MistakeRecord, SessionId};

// ---------------------------------------------------------------------------
// LLM Provider trait
// ---------------------------------------------------------------------------

/// Trait for LLM backends that answer structured prompts.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g. "openai").
    fn name(&self) -> &str;

    /// Send one system + user prompt pair and return the raw reply.
    async fn complete(&self, request: &ChatRequest) -> anyhow::Result<ChatResponse>;
}

/// A single prompt sent to an LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model identifier (e.g. "deepseek-chat").
    pub model: String,
    /// System instructions.
    pub system_prompt: String,
    /// User content.
    pub user_prompt: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
    /// Ask the backend to constrain output to a JSON object, if supported.
    #[serde(default)]
    pub json_mode: bool,
}

/// Response from an LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The raw response content.
    pub content: String,
    /// Model that actually produced the response.
    pub model: String,
    /// Token usage.
    #[serde(default)]
    pub token_usage: TokenUsage,
    /// Latency in milliseconds.
    pub latency_ms: u64,
}

/// Token accounting reported by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

// ---------------------------------------------------------------------------
// Exam store trait
// ---------------------------------------------------------------------------

/// Transient exam storage plus the durable mistake book.
///
/// Modelled on `SET key value EX ttl`, `GET key`, `LPUSH key value` and
/// `LRANGE key 0 -1`. Implementations must make each call atomic; callers do
/// no locking of their own.
#[async_trait]
pub trait ExamStore: Send + Sync {
    /// Replace the session's current exam. It expires after `ttl`.
    async fn put_current_exam(
        &self,
        session: &SessionId,
        exam: &Exam,
        ttl: Duration,
    ) -> Result<(), StoreError>;

    /// The session's current exam, or `None` if never set or expired.
    async fn get_current_exam(&self, session: &SessionId) -> Result<Option<Exam>, StoreError>;

    /// Prepend a record to the mistake book.
    async fn append_mistake(&self, record: &MistakeRecord) -> Result<(), StoreError>;

    /// All mistake records, most recent first.
    async fn list_mistakes(&self) -> Result<Vec<MistakeRecord>, StoreError>;

    /// Backend name for logs (e.g. "memory", "redis").
    fn backend(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Document extractor trait
// ---------------------------------------------------------------------------

/// Converts a study document into plain text.
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    async fn extract(&self, path: &Path) -> Result<String, DocumentError>;
}

// ---------------------------------------------------------------------------
// JSON payload extraction
// ---------------------------------------------------------------------------

/// Extract the JSON payload from an LLM reply.
///
/// Handles:
/// - ```json``` blocks (preferred)
/// - Generic ``` blocks
/// - Raw replies with prose around the JSON, by slicing from the first
///   `[`/`{` to the last matching closer
pub fn extract_json_from_markdown(response: &str) -> String {
    let mut json_blocks = Vec::new();
    let mut generic_blocks = Vec::new();
    let mut in_block = false;
    let mut is_json_block = false;
    let mut is_generic_block = false;
    let mut current_block = String::new();

    for line in response.lines() {
        let trimmed = line.trim();

        if !in_block && trimmed.starts_with("```") {
            in_block = true;
            let lang = trimmed.trim_start_matches('`').trim().to_lowercase();
            is_json_block = lang == "json";
            is_generic_block = lang.is_empty();
            current_block.clear();
            continue;
        }

        if in_block && trimmed == "```" {
            in_block = false;
            if is_json_block {
                json_blocks.push(current_block.clone());
            } else if is_generic_block {
                generic_blocks.push(current_block.clone());
            }
            current_block.clear();
            continue;
        }

        if in_block {
            if !current_block.is_empty() {
                current_block.push('\n');
            }
            current_block.push_str(line);
        }
    }

    // Truncated (unclosed) block: keep what accumulated
    if in_block && !current_block.is_empty() {
        if is_json_block {
            json_blocks.push(current_block);
        } else if is_generic_block {
            generic_blocks.push(current_block);
        }
    }

    if let Some(block) = json_blocks.into_iter().next() {
        return block.trim().to_string();
    }
    if let Some(block) = generic_blocks.into_iter().next() {
        return block.trim().to_string();
    }

    slice_outer_json(response).trim().to_string()
}

fn slice_outer_json(text: &str) -> &str {
    let Some(start) = text.find(['[', '{']) else {
        return text;
    };
    let closer = if text[start..].starts_with('[') { ']' } else { '}' };
    match text.rfind(closer) {
        Some(end) if end > start => &text[start..=end],
        _ => &text[start..],
    }
}
