//! studyforge-store: Redis-backed [`ExamStore`].
//!
//! Current exams are JSON strings written with `SET key value EX ttl`; the
//! mistake book is a Redis list grown with `LPUSH` and read with
//! `LRANGE 0 -1`, which yields most-recent-first order.

pub mod keys;

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::debug;

use studyforge_core::error::StoreError;
use studyforge_core::model::{Exam, MistakeRecord, SessionId};
use studyforge_core::traits::ExamStore;

/// Exam store backed by a Redis server.
#[derive(Clone)]
pub struct RedisStore {
    connection: MultiplexedConnection,
}

impl RedisStore {
    pub fn new(connection: MultiplexedConnection) -> Self {
        Self { connection }
    }

    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url).map_err(backend_error)?;
        let connection = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(backend_error)?;
        debug!("connected to redis at {redis_url}");
        Ok(Self::new(connection))
    }

    pub async fn is_connected(&self) -> bool {
        let mut conn = self.connection.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .is_ok()
    }
}

fn backend_error(err: redis::RedisError) -> StoreError {
    StoreError::Backend(err.to_string())
}

/// `SET ... EX` rejects zero, so sub-second TTLs round up to one second.
fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl ExamStore for RedisStore {
    async fn put_current_exam(
        &self,
        session: &SessionId,
        exam: &Exam,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let payload = serde_json::to_string(exam)?;
        let mut conn = self.connection.clone();
        let _: () = conn
            .set_ex(keys::exam_key(session), payload, ttl_secs(ttl))
            .await
            .map_err(backend_error)?;
        Ok(())
    }

    async fn get_current_exam(&self, session: &SessionId) -> Result<Option<Exam>, StoreError> {
        let mut conn = self.connection.clone();
        let payload: Option<String> = conn
            .get(keys::exam_key(session))
            .await
            .map_err(backend_error)?;
        match payload {
            Some(p) => Ok(Some(serde_json::from_str(&p)?)),
            None => Ok(None),
        }
    }

    async fn append_mistake(&self, record: &MistakeRecord) -> Result<(), StoreError> {
        let payload = serde_json::to_string(record)?;
        let mut conn = self.connection.clone();
        let _: i64 = conn
            .lpush(keys::MISTAKE_BOOK_KEY, payload)
            .await
            .map_err(backend_error)?;
        Ok(())
    }

    async fn list_mistakes(&self) -> Result<Vec<MistakeRecord>, StoreError> {
        let mut conn = self.connection.clone();
        let payloads: Vec<String> = conn
            .lrange(keys::MISTAKE_BOOK_KEY, 0, -1)
            .await
            .map_err(backend_error)?;
        decode_records(&payloads)
    }

    fn backend(&self) -> &str {
        "redis"
    }
}

fn decode_records(payloads: &[String]) -> Result<Vec<MistakeRecord>, StoreError> {
    payloads
        .iter()
        .map(|p| serde_json::from_str(p).map_err(StoreError::from))
        .collect()
}
