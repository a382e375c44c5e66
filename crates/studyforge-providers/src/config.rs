//! Configuration loading and provider factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use studyforge_core::engine::EngineConfig;
use studyforge_core::model::QuestionPlan;
use studyforge_core::traits::LlmProvider;

use crate::ollama::OllamaProvider;
use crate::openai::{OpenAiProvider, DEEPSEEK_BASE_URL};

/// Configuration for a single LLM provider.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    /// Any OpenAI-compatible endpoint, including DeepSeek.
    OpenAI {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        org_id: Option<String>,
    },
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,
    },
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::OpenAI {
                api_key: _,
                base_url,
                org_id,
            } => f
                .debug_struct("OpenAI")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .field("org_id", org_id)
                .finish(),
            ProviderConfig::Ollama { base_url } => f
                .debug_struct("Ollama")
                .field("base_url", base_url)
                .finish(),
        }
    }
}

fn default_ollama_url() -> String {
    crate::ollama::DEFAULT_BASE_URL.to_string()
}

/// Where exams and the mistake book live.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    /// Process-local; nothing survives the process.
    #[default]
    Memory,
    Redis {
        #[serde(default = "default_redis_url")]
        url: String,
    },
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

/// Top-level studyforge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyforgeConfig {
    /// Provider configurations keyed by name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Provider used for generation and grading.
    #[serde(default = "default_provider")]
    pub default_provider: String,
    /// Model used for generation and grading.
    #[serde(default = "default_model")]
    pub default_model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Lifetime of a generated exam in seconds.
    #[serde(default = "default_exam_ttl")]
    pub exam_ttl_secs: u64,
    /// Study text is truncated to this many characters.
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,
    #[serde(default)]
    pub plan: QuestionPlan,
    #[serde(default)]
    pub store: StoreConfig,
}

fn default_provider() -> String {
    "deepseek".to_string()
}
fn default_model() -> String {
    "deepseek-chat".to_string()
}
fn default_temperature() -> f64 {
    0.5
}
fn default_max_tokens() -> u32 {
    2048
}
fn default_exam_ttl() -> u64 {
    3600
}
fn default_max_context_chars() -> usize {
    studyforge_core::extract::DEFAULT_MAX_CONTEXT_CHARS
}

impl Default for StudyforgeConfig {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider(),
            default_model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            exam_ttl_secs: default_exam_ttl(),
            max_context_chars: default_max_context_chars(),
            plan: QuestionPlan::default(),
            store: StoreConfig::default(),
        }
    }
}

impl StudyforgeConfig {
    /// Engine settings derived from this configuration.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            model: self.default_model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            plan: self.plan,
            exam_ttl: Duration::from_secs(self.exam_ttl_secs),
            max_context_chars: self.max_context_chars,
        }
    }

    /// Instantiate the default provider.
    pub fn default_llm(&self) -> Result<Arc<dyn LlmProvider>> {
        let provider_config = self.providers.get(&self.default_provider).with_context(|| {
            format!(
                "provider '{}' is not configured; run `studyforge init` or set STUDYFORGE_DEEPSEEK_KEY",
                self.default_provider
            )
        })?;
        Ok(Arc::from(create_provider(&self.default_provider, provider_config)?))
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Resolve env vars in a provider config.
fn resolve_provider_config(config: &ProviderConfig) -> ProviderConfig {
    match config {
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => ProviderConfig::OpenAI {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
            org_id: org_id.as_ref().map(|o| resolve_env_vars(o)),
        },
        ProviderConfig::Ollama { base_url } => ProviderConfig::Ollama {
            base_url: resolve_env_vars(base_url),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `studyforge.toml` in the current directory
/// 2. `~/.config/studyforge/config.toml`
///
/// Environment variable overrides: `STUDYFORGE_DEEPSEEK_KEY`,
/// `STUDYFORGE_OPENAI_KEY`, `STUDYFORGE_REDIS_URL`.
pub fn load_config() -> Result<StudyforgeConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<StudyforgeConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("studyforge.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<StudyforgeConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => StudyforgeConfig::default(),
    };
    anyhow::ensure!(config.exam_ttl_secs > 0, "exam_ttl_secs must be at least 1");

    if let Ok(key) = std::env::var("STUDYFORGE_DEEPSEEK_KEY") {
        override_api_key(&mut config, "deepseek", key, Some(DEEPSEEK_BASE_URL));
    }
    if let Ok(key) = std::env::var("STUDYFORGE_OPENAI_KEY") {
        override_api_key(&mut config, "openai", key, None);
    }
    if let Ok(url) = std::env::var("STUDYFORGE_REDIS_URL") {
        config.store = StoreConfig::Redis { url };
    }

    config.providers = config
        .providers
        .iter()
        .map(|(k, v)| (k.clone(), resolve_provider_config(v)))
        .collect();

    Ok(config)
}

fn override_api_key(
    config: &mut StudyforgeConfig,
    name: &str,
    key: String,
    default_base_url: Option<&str>,
) {
    let entry = config
        .providers
        .entry(name.to_string())
        .or_insert_with(|| ProviderConfig::OpenAI {
            api_key: String::new(),
            base_url: default_base_url.map(str::to_string),
            org_id: None,
        });
    if let ProviderConfig::OpenAI { api_key, .. } = entry {
        *api_key = key;
    }
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("studyforge"))
}

/// Create a provider instance from its configuration.
pub fn create_provider(name: &str, config: &ProviderConfig) -> Result<Box<dyn LlmProvider>> {
    match config {
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => {
            anyhow::ensure!(!api_key.is_empty(), "provider '{name}' has an empty api_key");
            Ok(Box::new(OpenAiProvider::new(
                api_key,
                base_url.clone(),
                org_id.clone(),
            )))
        }
        ProviderConfig::Ollama { base_url } => Ok(Box::new(OllamaProvider::new(base_url))),
    }
}
