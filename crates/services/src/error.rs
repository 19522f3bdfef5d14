//! Shared error types for the services crate.

use thiserror::Error;

use exam_core::model::{ExamConfigError, ResultRecordError, SubjectId};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by exam session services.
///
/// Only configuration problems at start and persistence problems at the end
/// surface here; anomalies while an attempt is running are reported through
/// outcome values instead.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("invalid exam configuration: {0}")]
    InvalidExamConfiguration(#[from] ExamConfigError),
    #[error("no exam found for subject {0}")]
    ExamNotFound(SubjectId),
    #[error("session already started")]
    AlreadyStarted,
    #[error("session is not awaiting persistence")]
    NotSubmitting,
    #[error(transparent)]
    Result(#[from] ResultRecordError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
