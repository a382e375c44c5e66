//! Process-local [`ExamStore`].
//!
//! Expiry is measured on the tokio clock, so paused-time tests can advance
//! past the TTL without sleeping.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error::StoreError;
use crate::model::{Exam, MistakeRecord, SessionId};
use crate::traits::ExamStore;

/// Zero TTLs round up to this, matching `SET ... EX` on Redis.
const MIN_TTL: Duration = Duration::from_secs(1);

struct StoredExam {
    exam: Exam,
    /// `None` when the TTL is too large to represent; the exam never expires.
    expires_at: Option<Instant>,
}

#[derive(Default)]
struct Inner {
    exams: HashMap<SessionId, StoredExam>,
    /// Most recent first.
    mistakes: Vec<MistakeRecord>,
}

/// In-memory exam store. State is lost when the process exits.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl ExamStore for MemoryStore {
    async fn put_current_exam(
        &self,
        session: &SessionId,
        exam: &Exam,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let stored = StoredExam {
            exam: exam.clone(),
            expires_at: Instant::now().checked_add(ttl.max(MIN_TTL)),
        };
        self.lock()?.exams.insert(session.clone(), stored);
        Ok(())
    }

    async fn get_current_exam(&self, session: &SessionId) -> Result<Option<Exam>, StoreError> {
        let mut inner = self.lock()?;
        let expired = match inner.exams.get(session) {
            None => return Ok(None),
            Some(stored) => stored
                .expires_at
                .is_some_and(|deadline| Instant::now() >= deadline),
        };
        if expired {
            inner.exams.remove(session);
            return Ok(None);
        }
        Ok(inner.exams.get(session).map(|stored| stored.exam.clone()))
    }

    async fn append_mistake(&self, record: &MistakeRecord) -> Result<(), StoreError> {
        self.lock()?.mistakes.insert(0, record.clone());
        Ok(())
    }

    async fn list_mistakes(&self) -> Result<Vec<MistakeRecord>, StoreError> {
        Ok(self.lock()?.mistakes.clone())
    }

    fn backend(&self) -> &str {
        "memory"
    }
}
