//! studyforge-providers: LLM provider integrations.
//!
//! Implements the `LlmProvider` trait for OpenAI-compatible APIs (OpenAI,
//! DeepSeek, and similar) and Ollama, plus a scripted mock, and loads the
//! studyforge configuration file.

pub mod config;
pub mod mock;
pub mod ollama;
pub mod openai;

pub use config::{create_provider, load_config, ProviderConfig, StoreConfig, StudyforgeConfig};
pub use studyforge_core::error::ProviderError;
