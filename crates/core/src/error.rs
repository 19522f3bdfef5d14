use thiserror::Error;

use crate::model::{ExamConfigError, QuestionError, ResultRecordError, SettingsError};
use crate::monitor::CapabilityUnavailable;
use crate::timer::TimerError;

/// Umbrella error for callers that do not care which core check failed.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    ExamConfig(#[from] ExamConfigError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    ResultRecord(#[from] ResultRecordError),
    #[error(transparent)]
    Timer(#[from] TimerError),
    #[error(transparent)]
    Capability(#[from] CapabilityUnavailable),
}
