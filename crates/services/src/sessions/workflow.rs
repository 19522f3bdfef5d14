use std::sync::Arc;

use exam_core::model::{Exam, ExamSettings, SubjectId};
use exam_core::monitor::ExamEnvironment;
use storage::repository::{QuestionBank, ResultRepository};

use super::controller::ExamController;
use super::host::ExamHost;
use super::service::ExamSession;
use crate::Clock;
use crate::error::SessionError;

/// Builds exam attempts from the question bank.
#[derive(Clone)]
pub struct ExamLoopService {
    clock: Clock,
    settings: ExamSettings,
    questions: Arc<dyn QuestionBank>,
    results: Arc<dyn ResultRepository>,
}

impl ExamLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        questions: Arc<dyn QuestionBank>,
        results: Arc<dyn ResultRepository>,
    ) -> Self {
        Self {
            clock,
            settings: ExamSettings::default(),
            questions,
            results,
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: ExamSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &ExamSettings {
        &self.settings
    }

    /// Load the exam for a subject.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::ExamNotFound` if the subject has no exam, or
    /// `SessionError::Storage` on repository failures.
    pub async fn load_exam(&self, subject_id: SubjectId) -> Result<Exam, SessionError> {
        self.questions
            .get_exam(subject_id)
            .await?
            .ok_or(SessionError::ExamNotFound(subject_id))
    }

    /// Create a fresh, not-yet-started attempt for a subject.
    ///
    /// # Errors
    ///
    /// See [`Self::load_exam`].
    pub async fn new_session(&self, subject_id: SubjectId) -> Result<ExamSession, SessionError> {
        let exam = self.load_exam(subject_id).await?;
        Ok(ExamSession::new(exam, self.settings.clone()))
    }

    /// Create a controller for a fresh attempt, wired to the result sink.
    ///
    /// # Errors
    ///
    /// See [`Self::load_exam`].
    pub async fn new_controller(
        &self,
        subject_id: SubjectId,
        env: Box<dyn ExamEnvironment>,
        host: Arc<dyn ExamHost>,
    ) -> Result<ExamController, SessionError> {
        let session = self.new_session(subject_id).await?;
        Ok(ExamController::new(
            session,
            env,
            Arc::clone(&self.results),
            host,
            self.clock,
        ))
    }
}
