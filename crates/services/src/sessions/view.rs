use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use exam_core::model::{ExamResult, SubjectId};
use storage::repository::{ResultRepository, ResultRow};

use crate::Clock;
use crate::error::SessionError;

/// Storage identifier for a persisted exam result.
///
/// NOTE: This is currently `i64` to match `SQLite` row IDs.
pub type ResultId = i64;

/// Presentation-agnostic list item for a finished attempt.
///
/// No pre-formatted strings: the UI formats timestamps and durations itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultListItem {
    pub id: ResultId,
    pub attempt_id: Uuid,
    pub exam_name: String,
    pub completed_at: DateTime<Utc>,

    pub score: u32,
    pub correct_count: u32,
    pub total_questions: u32,
    pub time_taken_secs: u32,
    pub integrity_violation_count: u32,
}

impl ResultListItem {
    #[must_use]
    pub fn from_result(id: ResultId, result: &ExamResult) -> Self {
        Self {
            id,
            attempt_id: result.attempt_id(),
            exam_name: result.exam_name().to_owned(),
            completed_at: result.completed_at(),
            score: result.score(),
            correct_count: result.correct_count(),
            total_questions: result.total_questions(),
            time_taken_secs: result.time_taken_secs(),
            integrity_violation_count: result.integrity_violation_count(),
        }
    }

    #[must_use]
    pub fn from_row(row: &ResultRow) -> Self {
        Self::from_result(row.id, &row.result)
    }
}

/// Presentation-facing history facade over the persistence sink.
#[derive(Clone)]
pub struct ResultHistoryService {
    clock: Clock,
    results: Arc<dyn ResultRepository>,
}

impl ResultHistoryService {
    #[must_use]
    pub fn new(clock: Clock, results: Arc<dyn ResultRepository>) -> Self {
        Self { clock, results }
    }

    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::new(
            clock,
            Arc::new(storage::repository::InMemoryRepository::new()),
        )
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Latest results for a subject, newest first.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on repository failures.
    pub async fn list_recent(
        &self,
        subject_id: SubjectId,
        limit: u32,
    ) -> Result<Vec<ResultListItem>, SessionError> {
        let rows = self.results.list_results(subject_id, limit).await?;
        Ok(rows.iter().map(ResultListItem::from_row).collect())
    }

    /// Full record of one attempt, including the submitted answers.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the result is missing or unreadable.
    pub async fn get_result(&self, id: ResultId) -> Result<ExamResult, SessionError> {
        Ok(self.results.get_result(id).await?)
    }
}
