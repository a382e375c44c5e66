//! Weakness recording: decide whether an attempt belongs in the mistake book.

use std::sync::Arc;

use tracing::info;

use crate::error::StoreError;
use crate::model::{GradeVerdict, MistakeRecord, Question};
use crate::traits::ExamStore;

/// Scores strictly below this are recorded even when marked correct.
pub const PASSING_SCORE: u8 = 60;

/// An attempt qualifies when it is marked incorrect or scores below
/// [`PASSING_SCORE`]. An absent score counts as 100.
pub fn should_record(verdict: &GradeVerdict) -> bool {
    !verdict.is_correct || verdict.score.unwrap_or(100) < PASSING_SCORE
}

/// Appends qualifying attempts to the durable mistake book.
pub struct WeaknessRecorder {
    store: Arc<dyn ExamStore>,
}

impl WeaknessRecorder {
    pub fn new(store: Arc<dyn ExamStore>) -> Self {
        Self { store }
    }

    /// Append one record if the verdict qualifies. Returns whether it did.
    ///
    /// Repeated mistakes on the same question produce separate entries.
    pub async fn record(
        &self,
        question: &Question,
        user_answer: &str,
        verdict: &GradeVerdict,
    ) -> Result<bool, StoreError> {
        if !should_record(verdict) {
            return Ok(false);
        }
        let record = MistakeRecord::new(question, user_answer, verdict);
        self.store.append_mistake(&record).await?;
        info!(score = ?verdict.score, "recorded mistake");
        Ok(true)
    }
}
