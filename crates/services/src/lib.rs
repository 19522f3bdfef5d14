#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod sessions;

pub use exam_core::Clock;
pub use sessions as session;

pub use app_services::AppServices;
pub use error::{AppServicesError, SessionError};

pub use sessions::{
    AnswerOutcome, ExamController, ExamHost, ExamInput, ExamLoopService, ExamOutcome,
    ExamSession, NoopHost, ResultHistoryService, ResultId, ResultListItem, SessionCommand,
    SessionProgress, SubmitOutcome, run_exam,
};
