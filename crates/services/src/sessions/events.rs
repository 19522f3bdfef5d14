use exam_core::monitor::EnvironmentSignal;

/// User-driven requests routed to the session loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    RequestStart,
    CancelStart,
    ConfirmStart,
    Answer { index: usize, value: String },
    ToggleFlag(usize),
    Navigate(usize),
    Next,
    Previous,
    EnterReview,
    ResumeFromReview,
    PauseTimer,
    ResumeTimer,
    Submit,
    /// Retry persisting a result whose first write failed.
    FinalizeResult,
}

/// Everything the host can feed into a running exam.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExamInput {
    Command(SessionCommand),
    Signal(EnvironmentSignal),
    /// Leave the exam through an approved exit without submitting.
    Discard,
}

impl From<SessionCommand> for ExamInput {
    fn from(command: SessionCommand) -> Self {
        ExamInput::Command(command)
    }
}

impl From<EnvironmentSignal> for ExamInput {
    fn from(signal: EnvironmentSignal) -> Self {
        ExamInput::Signal(signal)
    }
}
