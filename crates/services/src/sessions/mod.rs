mod controller;
mod events;
mod host;
mod progress;
mod runner;
mod service;
pub mod timer_task;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use controller::{ExamController, SubmitOutcome};
pub use events::{ExamInput, SessionCommand};
pub use host::{ExamHost, NoopHost};
pub use progress::{QuestionStatus, ReviewSummary, SessionProgress};
pub use runner::{ExamOutcome, run_exam};
pub use service::{AnswerOutcome, ExamSession};
pub use timer_task::{TimerControl, TimerEvents, TimerHandle};
pub use view::{ResultHistoryService, ResultId, ResultListItem};
pub use workflow::ExamLoopService;
