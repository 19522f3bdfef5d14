use exam_core::model::{AnswerSheet, IntegrityEvent, Milestone};

/// Callbacks into the hosting UI.
///
/// Hooks run inline on the session loop, so they must return quickly. The
/// host owns all rendering and any confirmation dialogs.
pub trait ExamHost: Send + Sync {
    /// The countdown reached zero. Called once, before the forced submission.
    fn on_time_up(&self);

    /// Answers being submitted, for either submission path.
    fn on_submit(&self, answers: &AnswerSheet);

    fn on_integrity_event(&self, event: &IntegrityEvent);

    fn on_timer_warning(&self, _mark: u32) {}

    fn on_milestone(&self, _milestone: Milestone) {}
}

/// Host that ignores every callback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHost;

impl ExamHost for NoopHost {
    fn on_time_up(&self) {}

    fn on_submit(&self, _answers: &AnswerSheet) {}

    fn on_integrity_event(&self, _event: &IntegrityEvent) {}
}
