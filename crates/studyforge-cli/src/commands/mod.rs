pub mod generate;
pub mod init;
pub mod mistakes;
pub mod quiz;
pub mod submit;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use studyforge_core::matcher::effective_ordinal;
use studyforge_core::model::{Exam, GradeVerdict, QuestionKind};
use studyforge_core::store::MemoryStore;
use studyforge_core::traits::ExamStore;
use studyforge_core::StudyEngine;
use studyforge_providers::config::load_config_from;
use studyforge_providers::{StoreConfig, StudyforgeConfig};
use studyforge_store::RedisStore;

/// Open the configured exam store.
pub async fn open_store(config: &StudyforgeConfig) -> Result<Arc<dyn ExamStore>> {
    match &config.store {
        StoreConfig::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreConfig::Redis { url } => {
            let store = RedisStore::connect(url)
                .await
                .with_context(|| format!("failed to connect to redis at {url}"))?;
            Ok(Arc::new(store))
        }
    }
}

/// Load config and assemble an engine from it.
pub async fn build_engine(config_path: Option<&Path>) -> Result<(StudyforgeConfig, StudyEngine)> {
    let config = load_config_from(config_path)?;
    let store = open_store(&config).await?;
    let provider = config.default_llm()?;
    let engine = StudyEngine::new(provider, store, config.engine_config());
    Ok((config, engine))
}

/// Separate invocations cannot share a memory store.
pub fn warn_if_ephemeral(config: &StudyforgeConfig) {
    if config.store == StoreConfig::Memory {
        eprintln!(
            "Note: the memory store does not persist between commands. \
             Configure [store] type = \"redis\" or use `studyforge quiz`."
        );
    }
}

pub fn print_exam(exam: &Exam) {
    for (position, question) in exam.questions.iter().enumerate() {
        let number = effective_ordinal(question, position);
        let label = match question.kind {
            QuestionKind::MultipleChoice => "multiple choice",
            QuestionKind::ShortAnswer => "short answer",
        };
        println!("{number}. [{label}] {}", question.prompt);
        for option in &question.options {
            println!("     {option}");
        }
        println!();
    }
}

pub fn print_verdict(verdict: &GradeVerdict, recorded: bool) {
    let status = if verdict.is_correct { "CORRECT" } else { "INCORRECT" };
    match verdict.score {
        Some(score) => println!("{status} ({score}/100)"),
        None => println!("{status}"),
    }
    if !verdict.feedback.is_empty() {
        println!("{}", verdict.feedback);
    }
    if recorded {
        println!("Added to your mistake book.");
    }
}
