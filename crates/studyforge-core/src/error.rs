//! Error types for the exam lifecycle and its collaborators.
//!
//! `ProviderError` is defined here rather than in `studyforge-providers` so
//! the generator and grader can classify failures without string matching.

use thiserror::Error;

/// Errors that can occur when interacting with an LLM provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The requested model was not found.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),
}

/// Failures of the key-value/list store backing exams and the mistake book.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend rejected or failed the operation.
    #[error("store backend error: {0}")]
    Backend(String),

    /// A stored value could not be encoded or decoded as JSON.
    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures while turning a document into plain text.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to read document {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse PDF {path}: {message}")]
    Pdf { path: String, message: String },

    #[error("unsupported document type: {0}")]
    Unsupported(String),

    #[error("document {0} contains no text")]
    Empty(String),
}

/// "No exam produced". Nothing is stored when any of these occur.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The study text was empty after trimming.
    #[error("no study text provided")]
    EmptyInput,

    /// The LLM collaborator call failed.
    #[error("exam generation request failed: {0:#}")]
    Provider(anyhow::Error),

    /// The collaborator answered, but not with a list of question objects.
    #[error("malformed exam output: {0}")]
    Malformed(String),

    /// The output parsed but no element carried usable question text.
    #[error("generated exam contains no usable questions")]
    NoQuestions,

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("failed to store generated exam: {0}")]
    Store(#[from] StoreError),
}

/// The requested ordinal matched no question of the current exam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("question {index} not found")]
pub struct QuestionNotFound {
    pub index: u32,
}

/// Failures of an answer submission. Grading failures are not errors; they
/// degrade to a worst-case verdict instead.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The session has no current exam (never generated or expired).
    #[error("no active exam; generate one first")]
    NoActiveExam,

    #[error("question {index} not found in the current exam")]
    QuestionNotFound { index: u32 },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<QuestionNotFound> for SubmitError {
    fn from(err: QuestionNotFound) -> Self {
        SubmitError::QuestionNotFound { index: err.index }
    }
}
