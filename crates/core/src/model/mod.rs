mod answer;
mod exam;
mod ids;
mod integrity;
mod question;
mod result;
mod session;
mod settings;

pub use answer::{AnswerSheet, FlagSet};
pub use exam::{Exam, ExamConfigError, ExamMeta, ExamSection};
pub use ids::{ParseIdError, QuestionId, SubjectId};
pub use integrity::{IntegrityEvent, IntegrityEventKind, IntegrityLog};
pub use question::{AnswerOption, Question, QuestionError, QuestionKind};
pub use result::{AttemptInfo, ExamResult, ResultRecordError, ScoreResult};
pub use session::{Milestone, SessionLifecycle};
pub use settings::{DEFAULT_WARNING_THRESHOLDS, ExamSettings, SettingsError};
