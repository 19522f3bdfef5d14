use std::sync::Arc;

use exam_core::model::ExamSettings;
use storage::repository::{QuestionBank, Storage};

use crate::Clock;
use crate::error::AppServicesError;
use crate::sessions::{ExamLoopService, ResultHistoryService};

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    questions: Arc<dyn QuestionBank>,
    exam_loop: Arc<ExamLoopService>,
    result_history: Arc<ResultHistoryService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        settings: ExamSettings,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, settings))
    }

    #[must_use]
    pub fn in_memory(clock: Clock, settings: ExamSettings) -> Self {
        Self::from_storage(&Storage::in_memory(), clock, settings)
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock, settings: ExamSettings) -> Self {
        let exam_loop = Arc::new(
            ExamLoopService::new(
                clock,
                Arc::clone(&storage.questions),
                Arc::clone(&storage.results),
            )
            .with_settings(settings),
        );
        let result_history = Arc::new(ResultHistoryService::new(
            clock,
            Arc::clone(&storage.results),
        ));

        Self {
            questions: Arc::clone(&storage.questions),
            exam_loop,
            result_history,
        }
    }

    /// Question bank, for seeding and listings.
    #[must_use]
    pub fn questions(&self) -> Arc<dyn QuestionBank> {
        Arc::clone(&self.questions)
    }

    #[must_use]
    pub fn exam_loop(&self) -> Arc<ExamLoopService> {
        Arc::clone(&self.exam_loop)
    }

    #[must_use]
    pub fn result_history(&self) -> Arc<ResultHistoryService> {
        Arc::clone(&self.result_history)
    }
}
