use async_trait::async_trait;
use exam_core::model::{Exam, ExamResult, SubjectId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Lightweight listing entry for the exam picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamListing {
    pub subject_id: SubjectId,
    pub name: String,
    pub question_count: usize,
    pub duration_minutes: Option<u32>,
}

impl ExamListing {
    #[must_use]
    pub fn from_exam(exam: &Exam) -> Self {
        Self {
            subject_id: exam.subject_id(),
            name: exam.name().to_owned(),
            question_count: exam.total_questions(),
            duration_minutes: exam.meta().duration_minutes,
        }
    }
}

/// Persisted result with its storage id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    pub id: i64,
    pub result: ExamResult,
}

impl ResultRow {
    #[must_use]
    pub fn new(id: i64, result: ExamResult) -> Self {
        Self { id, result }
    }
}

/// Read side of the question bank. The exam session never writes back.
#[async_trait]
pub trait QuestionBank: Send + Sync {
    /// Persist or replace an exam and its questions.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the exam cannot be stored.
    async fn upsert_exam(&self, exam: &Exam) -> Result<(), StorageError>;

    /// Fetch the exam for a subject, if present.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for storage or decoding failures.
    async fn get_exam(&self, subject_id: SubjectId) -> Result<Option<Exam>, StorageError>;

    /// List available exams ordered by subject id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for storage failures.
    async fn list_exams(&self, limit: u32) -> Result<Vec<ExamListing>, StorageError>;
}

/// Persistence sink for finished attempts.
#[async_trait]
pub trait ResultRepository: Send + Sync {
    /// Append a finished result and return its id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the attempt was already stored.
    async fn append_result(&self, result: &ExamResult) -> Result<i64, StorageError>;

    /// Fetch a result by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing.
    async fn get_result(&self, id: i64) -> Result<ExamResult, StorageError>;

    /// Latest results for a subject, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for storage or decoding failures.
    async fn list_results(
        &self,
        subject_id: SubjectId,
        limit: u32,
    ) -> Result<Vec<ResultRow>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    exams: Arc<Mutex<HashMap<SubjectId, Exam>>>,
    results: Arc<Mutex<Vec<ResultRow>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuestionBank for InMemoryRepository {
    async fn upsert_exam(&self, exam: &Exam) -> Result<(), StorageError> {
        let mut guard = self
            .exams
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(exam.subject_id(), exam.clone());
        Ok(())
    }

    async fn get_exam(&self, subject_id: SubjectId) -> Result<Option<Exam>, StorageError> {
        let guard = self
            .exams
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&subject_id).cloned())
    }

    async fn list_exams(&self, limit: u32) -> Result<Vec<ExamListing>, StorageError> {
        let guard = self
            .exams
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut listings: Vec<_> = guard.values().map(ExamListing::from_exam).collect();
        listings.sort_by_key(|l| l.subject_id);
        listings.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(listings)
    }
}

#[async_trait]
impl ResultRepository for InMemoryRepository {
    async fn append_result(&self, result: &ExamResult) -> Result<i64, StorageError> {
        let mut guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if guard
            .iter()
            .any(|row| row.result.attempt_id() == result.attempt_id())
        {
            return Err(StorageError::Conflict);
        }
        let id = i64::try_from(guard.len() + 1)
            .map_err(|_| StorageError::Serialization("result id overflow".into()))?;
        guard.push(ResultRow::new(id, result.clone()));
        Ok(id)
    }

    async fn get_result(&self, id: i64) -> Result<ExamResult, StorageError> {
        let guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .iter()
            .find(|row| row.id == id)
            .map(|row| row.result.clone())
            .ok_or(StorageError::NotFound)
    }

    async fn list_results(
        &self,
        subject_id: SubjectId,
        limit: u32,
    ) -> Result<Vec<ResultRow>, StorageError> {
        let guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut rows: Vec<_> = guard
            .iter()
            .filter(|row| row.result.subject_id() == subject_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.result
                .completed_at()
                .cmp(&a.result.completed_at())
                .then(b.id.cmp(&a.id))
        });
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }
}

/// Aggregates the question bank and result sink behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionBank>,
    pub results: Arc<dyn ResultRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let questions: Arc<dyn QuestionBank> = Arc::new(repo.clone());
        let results: Arc<dyn ResultRepository> = Arc::new(repo);
        Self { questions, results }
    }
}
