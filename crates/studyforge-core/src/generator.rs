//! Exam generation: study text in, validated questions out.
//!
//! The LLM's output is untrusted. [`parse_questions`] validates and repairs it
//! into strict [`Question`]s before anything downstream sees it.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{instrument, warn};

use crate::error::GenerationError;
use crate::model::{Question, QuestionKind, QuestionPlan};
use crate::prompts::{generation_system_prompt, generation_user_prompt};
use crate::traits::{extract_json_from_markdown, ChatRequest, LlmProvider};

/// Keys under which a generator sometimes wraps the question list.
const WRAPPER_KEYS: &[&str] = &["questions", "exam", "items"];
const PROMPT_KEYS: &[&str] = &["question", "prompt", "stem"];
const ANSWER_KEYS: &[&str] = &["answer", "reference_answer", "standard_answer", "correct_answer"];
const KIND_KEYS: &[&str] = &["type", "kind"];

/// Settings for exam generation requests.
#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub plan: QuestionPlan,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            model: "deepseek-chat".to_string(),
            temperature: 0.5,
            max_tokens: 2048,
            plan: QuestionPlan::default(),
        }
    }
}

/// Turns extracted study text into questions via an LLM.
pub struct ExamGenerator {
    provider: Arc<dyn LlmProvider>,
    settings: GeneratorSettings,
}

impl ExamGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>, settings: GeneratorSettings) -> Self {
        Self { provider, settings }
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    /// Generate questions for `text`. No retry is attempted.
    #[instrument(skip(self, text), fields(provider = self.provider.name(), chars = text.chars().count()))]
    pub async fn generate(&self, text: &str) -> Result<Vec<Question>, GenerationError> {
        if text.trim().is_empty() {
            return Err(GenerationError::EmptyInput);
        }

        let request = ChatRequest {
            model: self.settings.model.clone(),
            system_prompt: generation_system_prompt(&self.settings.plan),
            user_prompt: generation_user_prompt(text),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            json_mode: false,
        };

        let response = self.provider.complete(&request).await.map_err(|e| {
            tracing::error!("exam generation failed: {e:#}");
            GenerationError::Provider(e)
        })?;

        let questions = parse_questions(&response.content).inspect_err(|e| {
            tracing::error!("exam generation returned unusable output: {e}");
        })?;

        let expected = self.settings.plan.total() as usize;
        if questions.len() != expected {
            warn!(
                "generator returned {} questions, plan asked for {expected}",
                questions.len()
            );
        }

        Ok(questions)
    }
}

/// Validate an LLM reply into questions, repairing what can be repaired.
pub fn parse_questions(raw: &str) -> Result<Vec<Question>, GenerationError> {
    let payload = extract_json_from_markdown(raw);
    let value: Value = serde_json::from_str(&payload)
        .map_err(|e| GenerationError::Malformed(format!("not valid JSON: {e}")))?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => WRAPPER_KEYS
            .iter()
            .find_map(|key| match map.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .ok_or_else(|| GenerationError::Malformed("expected a list of questions".into()))?,
        other => {
            return Err(GenerationError::Malformed(format!(
                "expected a list of questions, got {}",
                json_type_name(&other)
            )))
        }
    };

    let mut questions = Vec::with_capacity(items.len());
    for (position, item) in items.into_iter().enumerate() {
        let Value::Object(map) = item else {
            return Err(GenerationError::Malformed(format!(
                "question {} is {}, not an object",
                position + 1,
                json_type_name(&item)
            )));
        };
        match question_from_object(&map) {
            Some(q) => questions.push(q),
            None => warn!("dropping generated question {} without text", position + 1),
        }
    }

    if questions.is_empty() {
        return Err(GenerationError::NoQuestions);
    }

    normalize_indices(&mut questions);
    Ok(questions)
}

fn question_from_object(map: &Map<String, Value>) -> Option<Question> {
    let prompt = first_string(map, PROMPT_KEYS).filter(|p| !p.trim().is_empty())?;
    let reference_answer = first_string(map, ANSWER_KEYS).unwrap_or_default();
    let analysis = map
        .get("analysis")
        .and_then(scalar_to_string)
        .unwrap_or_default();

    let options: Vec<String> = match map.get("options") {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_to_string).collect(),
        // Some generators emit {"A": "...", "B": "..."}
        Some(Value::Object(choices)) => choices
            .iter()
            .filter_map(|(letter, text)| scalar_to_string(text).map(|t| format!("{letter}. {t}")))
            .collect(),
        _ => Vec::new(),
    };

    let declared = first_string(map, KIND_KEYS).and_then(|k| k.parse::<QuestionKind>().ok());
    let kind = match (declared, options.is_empty()) {
        (_, true) => QuestionKind::ShortAnswer,
        (Some(QuestionKind::ShortAnswer), false) | (None, false) => QuestionKind::MultipleChoice,
        (Some(kind), false) => kind,
    };
    if declared.is_some_and(|d| d != kind) {
        warn!("question type {declared:?} contradicts its options; treating as {kind}");
    }

    Some(Question {
        index: map.get("index").and_then(parse_ordinal),
        id: map.get("id").and_then(scalar_to_string),
        kind,
        prompt,
        options,
        reference_answer,
        analysis,
    })
}

/// Give every question a distinct ordinal in `1..=len`.
///
/// A declared `index` is kept when it is in range and unclaimed, else a
/// numeric `id` under the same rule. Unlabelled questions take their
/// position if it is free, and the rest take the smallest free ordinals in
/// order. Ids that do not match the final ordinal are cleared.
fn normalize_indices(questions: &mut [Question]) {
    let len = questions.len() as u32;
    let mut taken = HashSet::new();
    let mut ordinals: Vec<Option<u32>> = Vec::with_capacity(questions.len());

    for (position, question) in questions.iter().enumerate() {
        let declared = question
            .index
            .or_else(|| question.id.as_deref().and_then(|id| id.trim().parse::<u32>().ok()));
        let kept = declared.filter(|n| (1..=len).contains(n) && taken.insert(*n));
        if let (Some(n), None) = (declared, kept) {
            warn!(
                "ignoring unusable ordinal {n} on question at position {}",
                position + 1
            );
        }
        ordinals.push(kept);
    }

    for (position, ordinal) in ordinals.iter_mut().enumerate() {
        let own = position as u32 + 1;
        if ordinal.is_none() && !taken.contains(&own) {
            taken.insert(own);
            *ordinal = Some(own);
        }
    }

    let mut free = (1..=len).filter(|n| !taken.contains(n));
    for ordinal in ordinals.iter_mut().filter(|o| o.is_none()) {
        *ordinal = free.next();
    }

    for (question, ordinal) in questions.iter_mut().zip(ordinals) {
        if question
            .id
            .as_deref()
            .is_some_and(|id| ordinal.map(|n| n.to_string()).as_deref() != Some(id.trim()))
        {
            question.id = None;
        }
        question.index = ordinal;
    }
}

fn parse_ordinal(value: &Value) -> Option<u32> {
    let n = match value {
        Value::Number(n) => n.as_u64()?,
        Value::String(s) => s.trim().parse::<u64>().ok()?,
        _ => return None,
    };
    u32::try_from(n).ok().filter(|n| *n > 0)
}

fn first_string(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| map.get(*key).and_then(scalar_to_string))
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        // Short-answer key points sometimes arrive as a list
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(scalar_to_string).collect();
            (!parts.is_empty()).then(|| parts.join("\n"))
        }
        _ => None,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
