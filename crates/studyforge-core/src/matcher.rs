//! Resolve a submitted ordinal to a stored question.
//!
//! Each question's effective ordinal is its explicit `index` if present,
//! else its `id`, else its 1-based position. The first question whose
//! effective ordinal equals the submitted one wins.

use crate::error::QuestionNotFound;
use crate::model::Question;

/// Find the question the learner meant by ordinal `n`.
pub fn resolve_question(questions: &[Question], n: u32) -> Result<&Question, QuestionNotFound> {
    if n == 0 || n as usize > questions.len() {
        return Err(QuestionNotFound { index: n });
    }

    let wanted = n.to_string();
    questions
        .iter()
        .enumerate()
        .find(|(position, question)| effective_ordinal(question, *position) == wanted)
        .map(|(_, question)| question)
        .ok_or(QuestionNotFound { index: n })
}

/// The ordinal a learner uses to address the question at `position` (0-based).
pub fn effective_ordinal(question: &Question, position: usize) -> String {
    if let Some(index) = question.index.filter(|i| *i > 0) {
        return index.to_string();
    }
    match question.id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => (position + 1).to_string(),
    }
}
