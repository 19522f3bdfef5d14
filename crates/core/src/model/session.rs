use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase of a single exam attempt.
///
/// `NotStarted → Confirming → InProgress ⇄ Reviewing → Submitting → Completed`,
/// with `InProgress`/`Reviewing` also allowed to jump straight to
/// `Submitting`. `Completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SessionLifecycle {
    #[default]
    NotStarted,
    Confirming,
    InProgress,
    Reviewing,
    Submitting,
    Completed,
}

impl SessionLifecycle {
    /// Answers, flags and navigation are accepted only in these phases.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, SessionLifecycle::InProgress | SessionLifecycle::Reviewing)
    }

    #[must_use]
    pub fn can_start(self) -> bool {
        matches!(self, SessionLifecycle::NotStarted | SessionLifecycle::Confirming)
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionLifecycle::Completed)
    }
}

impl fmt::Display for SessionLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionLifecycle::NotStarted => "not started",
            SessionLifecycle::Confirming => "confirming",
            SessionLifecycle::InProgress => "in progress",
            SessionLifecycle::Reviewing => "reviewing",
            SessionLifecycle::Submitting => "submitting",
            SessionLifecycle::Completed => "completed",
        };
        f.write_str(label)
    }
}

/// Observational progress notification raised while answering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Milestone {
    /// The answered count reached a multiple of the configured interval.
    Answered(usize),
    /// Half of the questions (rounded up) are answered.
    HalfwayThere,
    /// Every question has an answer.
    AllAnswered,
}

impl Milestone {
    /// Milestone reached when the answered count moves to `answered`.
    ///
    /// Completion outranks the halfway mark, which outranks the periodic count.
    #[must_use]
    pub fn reached(answered: usize, total: usize, every: usize) -> Option<Self> {
        if total == 0 || answered == 0 {
            return None;
        }
        if answered == total {
            return Some(Milestone::AllAnswered);
        }
        if answered == total.div_ceil(2) {
            return Some(Milestone::HalfwayThere);
        }
        if every > 0 && answered % every == 0 {
            return Some(Milestone::Answered(answered));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_phases_are_in_progress_and_reviewing() {
        assert!(SessionLifecycle::InProgress.is_active());
        assert!(SessionLifecycle::Reviewing.is_active());
        assert!(!SessionLifecycle::Submitting.is_active());
        assert!(!SessionLifecycle::Confirming.is_active());
        assert!(SessionLifecycle::Completed.is_terminal());
    }

    #[test]
    fn milestones_follow_priority() {
        assert_eq!(Milestone::reached(20, 20, 5), Some(Milestone::AllAnswered));
        assert_eq!(Milestone::reached(10, 20, 5), Some(Milestone::HalfwayThere));
        assert_eq!(Milestone::reached(5, 20, 5), Some(Milestone::Answered(5)));
        assert_eq!(Milestone::reached(3, 20, 5), None);
        assert_eq!(Milestone::reached(2, 3, 5), Some(Milestone::HalfwayThere));
    }
}
