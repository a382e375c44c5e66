//! studyforge-core: Exam lifecycle engine, traits, and data model.
//!
//! This crate defines the question/verdict/mistake data model, the collaborator
//! traits (LLM provider, exam store, document extractor), and the lifecycle
//! that ties them together: generation, transient storage, answer matching,
//! grading, and weakness accumulation.

pub mod engine;
pub mod error;
pub mod extract;
pub mod generator;
pub mod grader;
pub mod matcher;
pub mod model;
pub mod prompts;
pub mod recorder;
pub mod store;
pub mod traits;

pub use engine::{EngineConfig, StudyEngine, SubmitOutcome};
pub use error::{DocumentError, GenerationError, ProviderError, StoreError, SubmitError};
pub use model::{Exam, GradeVerdict, MistakeRecord, Question, QuestionKind, QuestionPlan, SessionId};
