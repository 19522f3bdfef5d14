use exam_core::model::{AnswerSheet, FlagSet, SessionLifecycle};
use exam_core::scoring::percent;

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub flagged: usize,
    /// Share of answered questions, 0..=100.
    pub percent_answered: u32,
    pub current: usize,
    pub is_complete: bool,
}

impl SessionProgress {
    pub(crate) fn from_parts(
        total: usize,
        answers: &AnswerSheet,
        flags: &FlagSet,
        current: usize,
        lifecycle: SessionLifecycle,
    ) -> Self {
        let answered = answers.len();
        Self {
            total,
            answered,
            remaining: total.saturating_sub(answered),
            flagged: flags.len(),
            percent_answered: percent(answered, total),
            current,
            is_complete: lifecycle.is_terminal(),
        }
    }
}

/// Per-question marker for a navigation grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionStatus {
    pub index: usize,
    pub answered: bool,
    pub flagged: bool,
    pub current: bool,
}

/// What is still open when the user enters review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewSummary {
    pub total: usize,
    pub answered: usize,
    pub unanswered: Vec<usize>,
    pub flagged: Vec<usize>,
}

impl ReviewSummary {
    pub(crate) fn from_parts(total: usize, answers: &AnswerSheet, flags: &FlagSet) -> Self {
        Self {
            total,
            answered: answers.len(),
            unanswered: (0..total).filter(|i| !answers.is_answered(*i)).collect(),
            flagged: flags.iter().collect(),
        }
    }

    #[must_use]
    pub fn unanswered_count(&self) -> usize {
        self.unanswered.len()
    }

    #[must_use]
    pub fn flagged_count(&self) -> usize {
        self.flagged.len()
    }

    #[must_use]
    pub fn all_answered(&self) -> bool {
        self.unanswered.is_empty()
    }
}
