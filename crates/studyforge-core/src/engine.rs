//! The exam lifecycle: generate → store → match → grade → record.
//!
//! `StudyEngine` holds no current exam itself; every operation names the
//! session it addresses and the store keeps one current exam per session.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::{GenerationError, StoreError, SubmitError};
use crate::extract::{truncate_chars, DefaultExtractor, DEFAULT_MAX_CONTEXT_CHARS};
use crate::generator::{ExamGenerator, GeneratorSettings};
use crate::grader::{Grader, GraderSettings};
use crate::matcher::resolve_question;
use crate::model::{Exam, GradeVerdict, MistakeRecord, QuestionPlan, SessionId};
use crate::recorder::WeaknessRecorder;
use crate::traits::{DocumentExtractor, ExamStore, LlmProvider};

/// Configuration for the study engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Model used for both generation and grading.
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub plan: QuestionPlan,
    /// Lifetime of a generated exam.
    pub exam_ttl: Duration,
    /// Study text is truncated to this many characters before generation.
    pub max_context_chars: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model: "deepseek-chat".to_string(),
            temperature: 0.5,
            max_tokens: 2048,
            plan: QuestionPlan::default(),
            exam_ttl: Duration::from_secs(3600),
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
        }
    }
}

/// Result of grading one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitOutcome {
    /// The ordinal the learner submitted.
    pub index: u32,
    pub verdict: GradeVerdict,
    /// Whether the attempt was added to the mistake book.
    pub recorded: bool,
}

/// Coordinates the generator, store, matcher, grader, and recorder.
pub struct StudyEngine {
    generator: ExamGenerator,
    grader: Grader,
    recorder: WeaknessRecorder,
    store: Arc<dyn ExamStore>,
    extractor: Arc<dyn DocumentExtractor>,
    config: EngineConfig,
}

impl StudyEngine {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        store: Arc<dyn ExamStore>,
        config: EngineConfig,
    ) -> Self {
        let generator = ExamGenerator::new(
            Arc::clone(&provider),
            GeneratorSettings {
                model: config.model.clone(),
                temperature: config.temperature,
                max_tokens: config.max_tokens,
                plan: config.plan,
            },
        );
        let grader = Grader::new(
            provider,
            GraderSettings {
                model: config.model.clone(),
                temperature: config.temperature,
                max_tokens: config.max_tokens,
            },
        );
        Self {
            generator,
            grader,
            recorder: WeaknessRecorder::new(Arc::clone(&store)),
            store,
            extractor: Arc::new(DefaultExtractor),
            config,
        }
    }

    /// Replace the default extension-based extractor.
    pub fn with_extractor(mut self, extractor: Arc<dyn DocumentExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Generate an exam from study text and make it the session's current
    /// exam. On failure nothing is stored and the previous exam is kept.
    #[instrument(skip(self, session, text), fields(session = %session))]
    pub async fn generate_exam(
        &self,
        session: &SessionId,
        text: &str,
    ) -> Result<Exam, GenerationError> {
        let questions = self.generator.generate(text).await?;
        let exam = Exam::new(questions);
        self.store
            .put_current_exam(session, &exam, self.config.exam_ttl)
            .await?;
        info!(
            questions = exam.len(),
            backend = self.store.backend(),
            "stored current exam"
        );
        Ok(exam)
    }

    /// Extract a document, truncate it to the context limit, and generate.
    #[instrument(skip(self, session), fields(session = %session))]
    pub async fn generate_from_document(
        &self,
        session: &SessionId,
        path: &Path,
    ) -> Result<Exam, GenerationError> {
        let text = self.extractor.extract(path).await?;
        let material = truncate_chars(&text, self.config.max_context_chars);
        if material.len() < text.len() {
            info!(
                limit = self.config.max_context_chars,
                "truncated study text to context limit"
            );
        }
        self.generate_exam(session, material).await
    }

    /// The session's current exam, if one exists and has not expired.
    pub async fn current_exam(&self, session: &SessionId) -> Result<Option<Exam>, StoreError> {
        self.store.get_current_exam(session).await
    }

    /// Grade an answer to question `index` of the session's current exam.
    ///
    /// Lookup failures return before any grading call. Grading failures do
    /// not error; they yield a zero-score verdict that is recorded.
    #[instrument(skip(self, session, user_answer), fields(session = %session))]
    pub async fn submit(
        &self,
        session: &SessionId,
        index: u32,
        user_answer: &str,
    ) -> Result<SubmitOutcome, SubmitError> {
        let exam = self
            .store
            .get_current_exam(session)
            .await?
            .ok_or(SubmitError::NoActiveExam)?;

        let question = resolve_question(&exam.questions, index)?;

        let verdict = self
            .grader
            .grade(&question.prompt, &question.reference_answer, user_answer)
            .await;

        let recorded = self.recorder.record(question, user_answer, &verdict).await?;
        info!(
            index,
            correct = verdict.is_correct,
            score = ?verdict.score,
            recorded,
            "graded submission"
        );

        Ok(SubmitOutcome {
            index,
            verdict,
            recorded,
        })
    }

    /// All mistake records, most recent first.
    pub async fn list_mistakes(&self) -> Result<Vec<MistakeRecord>, StoreError> {
        self.store.list_mistakes().await
    }
}
