//! Core data model types for studyforge.
//!
//! Questions and exams are produced by an untrusted generator and validated
//! into these strict types at the boundary (see [`crate::generator`]).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of a generated question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    MultipleChoice,
    ShortAnswer,
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionKind::MultipleChoice => write!(f, "multiple-choice"),
            QuestionKind::ShortAnswer => write!(f, "short-answer"),
        }
    }
}

impl FromStr for QuestionKind {
    type Err = String;

    /// Lenient parse of the labels generators actually emit, including the
    /// Chinese single/multiple choice and short-answer labels.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "multiple-choice" | "multiple-choice-question" | "single-choice" | "choice"
            | "mcq" | "mc" | "选择题" | "单选题" | "多选题" => Ok(QuestionKind::MultipleChoice),
            "short-answer" | "short-answer-question" | "open" | "open-ended" | "essay" | "sa"
            | "简答题" | "问答题" => Ok(QuestionKind::ShortAnswer),
            other => Err(format!("unknown question type: {other}")),
        }
    }
}

/// One generated assessment item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Ordinal supplied by the generator. Not guaranteed present or unique.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    /// Id-like value supplied by the generator, stringified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub prompt: String,
    /// Choices for multiple-choice questions; empty for short-answer.
    #[serde(default)]
    pub options: Vec<String>,
    /// Letter key for multiple-choice, bullet summary for short-answer.
    pub reference_answer: String,
    /// Explanation shown to the learner. Never used in grading.
    #[serde(default)]
    pub analysis: String,
}

/// The current ordered set of generated questions for a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exam {
    pub questions: Vec<Question>,
    pub generated_at: DateTime<Utc>,
}

impl Exam {
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            questions,
            generated_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// How many questions of each kind to request from the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionPlan {
    #[serde(default = "default_multiple_choice")]
    pub multiple_choice: u32,
    #[serde(default = "default_short_answer")]
    pub short_answer: u32,
}

fn default_multiple_choice() -> u32 {
    2
}

fn default_short_answer() -> u32 {
    1
}

impl Default for QuestionPlan {
    fn default() -> Self {
        Self {
            multiple_choice: default_multiple_choice(),
            short_answer: default_short_answer(),
        }
    }
}

impl QuestionPlan {
    pub fn total(&self) -> u32 {
        self.multiple_choice + self.short_answer
    }
}

/// Outcome of grading one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeVerdict {
    pub is_correct: bool,
    /// 0–100. Absent when the grader omitted it.
    #[serde(default)]
    pub score: Option<u8>,
    #[serde(default)]
    pub feedback: String,
}

/// A durable mistake-book entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MistakeRecord {
    pub question_text: String,
    pub reference_answer: String,
    pub user_answer: String,
    pub feedback: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<DateTime<Utc>>,
}

impl MistakeRecord {
    pub fn new(question: &Question, user_answer: &str, verdict: &GradeVerdict) -> Self {
        Self {
            question_text: question.prompt.clone(),
            reference_answer: question.reference_answer.clone(),
            user_answer: user_answer.to_string(),
            feedback: verdict.feedback.clone(),
            recorded_at: Some(Utc::now()),
        }
    }
}

/// Names the session whose current exam a store operation addresses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh session, used by interactive quizzes.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self("default".to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
