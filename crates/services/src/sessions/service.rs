use chrono::{DateTime, Utc};
use uuid::Uuid;

use exam_core::model::{
    AnswerSheet, AttemptInfo, Exam, ExamResult, ExamSettings, FlagSet, Milestone, Question,
    ResultRecordError, SessionLifecycle,
};
use exam_core::scoring;

use super::progress::{QuestionStatus, ReviewSummary, SessionProgress};
use crate::error::SessionError;

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// What happened to a `record_answer` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// The answer was stored; `milestone` is set when this answer reached one.
    Recorded { milestone: Option<Milestone> },
    /// Wrong phase or index out of range. Nothing changed.
    Ignored,
}

impl AnswerOutcome {
    #[must_use]
    pub fn is_recorded(self) -> bool {
        matches!(self, AnswerOutcome::Recorded { .. })
    }

    #[must_use]
    pub fn milestone(self) -> Option<Milestone> {
        match self {
            AnswerOutcome::Recorded { milestone } => milestone,
            AnswerOutcome::Ignored => None,
        }
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// State of one exam attempt: position, answers, flags and lifecycle.
///
/// Every mutation is a named transition. Calls that do not apply in the
/// current phase change nothing and report that through their return value.
#[derive(Debug, Clone)]
pub struct ExamSession {
    exam: Exam,
    settings: ExamSettings,
    attempt_id: Uuid,
    lifecycle: SessionLifecycle,
    current: usize,
    answers: AnswerSheet,
    flags: FlagSet,
    started_at: Option<DateTime<Utc>>,
    submitted_at: Option<DateTime<Utc>>,
}

impl ExamSession {
    /// Create a not-yet-started attempt. The exam is validated on `confirm_start`.
    #[must_use]
    pub fn new(exam: Exam, settings: ExamSettings) -> Self {
        Self {
            exam,
            settings,
            attempt_id: Uuid::new_v4(),
            lifecycle: SessionLifecycle::NotStarted,
            current: 0,
            answers: AnswerSheet::new(),
            flags: FlagSet::new(),
            started_at: None,
            submitted_at: None,
        }
    }

    #[must_use]
    pub fn exam(&self) -> &Exam {
        &self.exam
    }

    #[must_use]
    pub fn settings(&self) -> &ExamSettings {
        &self.settings
    }

    #[must_use]
    pub fn attempt_id(&self) -> Uuid {
        self.attempt_id
    }

    #[must_use]
    pub fn lifecycle(&self) -> SessionLifecycle {
        self.lifecycle
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.exam.question(self.current)
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.exam.total_questions()
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerSheet {
        &self.answers
    }

    #[must_use]
    pub fn flags(&self) -> &FlagSet {
        &self.flags
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.lifecycle.is_terminal()
    }

    //
    // ─── START ─────────────────────────────────────────────────────────────────
    //

    /// `NotStarted → Confirming`. Returns false in any other phase.
    pub fn request_start(&mut self) -> bool {
        if self.lifecycle != SessionLifecycle::NotStarted {
            return false;
        }
        self.lifecycle = SessionLifecycle::Confirming;
        true
    }

    /// `Confirming → NotStarted`. Returns false in any other phase.
    pub fn cancel_start(&mut self) -> bool {
        if self.lifecycle != SessionLifecycle::Confirming {
            return false;
        }
        self.lifecycle = SessionLifecycle::NotStarted;
        true
    }

    /// `NotStarted | Confirming → InProgress`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyStarted` once the attempt has started, and
    /// `SessionError::InvalidExamConfiguration` when the exam fails validation.
    /// The lifecycle is unchanged on error.
    pub fn confirm_start(&mut self, at: DateTime<Utc>) -> Result<(), SessionError> {
        if !self.lifecycle.can_start() {
            return Err(SessionError::AlreadyStarted);
        }
        self.exam.validate(&self.settings)?;

        self.lifecycle = SessionLifecycle::InProgress;
        self.current = 0;
        self.started_at = Some(at);
        tracing::info!(
            subject = %self.exam.subject_id(),
            attempt = %self.attempt_id,
            questions = self.exam.total_questions(),
            "exam session started"
        );
        Ok(())
    }

    //
    // ─── ANSWERING ─────────────────────────────────────────────────────────────
    //

    /// Store or overwrite the answer for `index`.
    pub fn record_answer(&mut self, index: usize, value: impl Into<String>) -> AnswerOutcome {
        if !self.accepts_input(index, "answer") {
            return AnswerOutcome::Ignored;
        }

        let newly_answered = self.answers.record(index, value);
        let milestone = if newly_answered {
            Milestone::reached(
                self.answers.len(),
                self.exam.total_questions(),
                self.settings.milestone_every(),
            )
        } else {
            None
        };
        AnswerOutcome::Recorded { milestone }
    }

    /// Flip the review-later flag on `index`.
    ///
    /// Returns the new membership, or `None` when the call did not apply.
    pub fn toggle_flag(&mut self, index: usize) -> Option<bool> {
        if !self.accepts_input(index, "flag") {
            return None;
        }
        Some(self.flags.toggle(index))
    }

    /// Move to `index`. Out-of-range targets are ignored.
    pub fn navigate(&mut self, index: usize) -> bool {
        if !self.accepts_input(index, "navigate") {
            return false;
        }
        self.current = index;
        true
    }

    pub fn next_question(&mut self) -> bool {
        self.navigate(self.current.saturating_add(1))
    }

    pub fn previous_question(&mut self) -> bool {
        match self.current.checked_sub(1) {
            Some(index) => self.navigate(index),
            None => false,
        }
    }

    fn accepts_input(&self, index: usize, action: &'static str) -> bool {
        if !self.lifecycle.is_active() {
            tracing::debug!(action, lifecycle = %self.lifecycle, "ignored outside an active attempt");
            return false;
        }
        if index >= self.exam.total_questions() {
            tracing::debug!(action, index, total = self.exam.total_questions(), "ignored out-of-range index");
            return false;
        }
        true
    }

    //
    // ─── REVIEW ────────────────────────────────────────────────────────────────
    //

    /// `InProgress → Reviewing`, returning what is still open.
    ///
    /// Entry is never blocked by unanswered questions.
    pub fn enter_review(&mut self) -> Option<ReviewSummary> {
        if self.lifecycle != SessionLifecycle::InProgress {
            return None;
        }
        self.lifecycle = SessionLifecycle::Reviewing;
        Some(self.review_summary())
    }

    /// `Reviewing → InProgress`.
    pub fn resume_from_review(&mut self) -> bool {
        if self.lifecycle != SessionLifecycle::Reviewing {
            return false;
        }
        self.lifecycle = SessionLifecycle::InProgress;
        true
    }

    //
    // ─── SUBMISSION ────────────────────────────────────────────────────────────
    //

    /// `InProgress | Reviewing → Submitting`.
    ///
    /// Returns false once the attempt has left the active phases, which makes
    /// a second submission a no-op.
    pub fn begin_submission(&mut self, at: DateTime<Utc>) -> bool {
        if !self.lifecycle.is_active() {
            tracing::debug!(lifecycle = %self.lifecycle, "duplicate submission ignored");
            return false;
        }
        self.lifecycle = SessionLifecycle::Submitting;
        self.submitted_at = Some(at);
        true
    }

    /// `Submitting → Completed`.
    pub fn complete(&mut self) -> bool {
        if self.lifecycle != SessionLifecycle::Submitting {
            return false;
        }
        self.lifecycle = SessionLifecycle::Completed;
        true
    }

    /// Score the current answers into a result record.
    ///
    /// # Errors
    ///
    /// Returns `ResultRecordError` if the record fails its consistency checks.
    pub fn build_result(
        &self,
        completed_at: DateTime<Utc>,
        time_taken_secs: u32,
        integrity_violation_count: u32,
    ) -> Result<ExamResult, ResultRecordError> {
        let started_at = self.started_at.unwrap_or(completed_at);
        let info = AttemptInfo {
            attempt_id: self.attempt_id,
            subject_id: self.exam.subject_id(),
            exam_name: self.exam.name().to_owned(),
            started_at,
            completed_at: completed_at.max(started_at),
            time_taken_secs,
            integrity_violation_count,
        };
        let score = scoring::score(self.exam.questions(), &self.answers);
        ExamResult::new(info, score, self.answers.clone())
    }

    //
    // ─── SELECTORS ─────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress::from_parts(
            self.exam.total_questions(),
            &self.answers,
            &self.flags,
            self.current,
            self.lifecycle,
        )
    }

    #[must_use]
    pub fn question_status(&self, index: usize) -> Option<QuestionStatus> {
        (index < self.exam.total_questions()).then(|| QuestionStatus {
            index,
            answered: self.answers.is_answered(index),
            flagged: self.flags.contains(index),
            current: index == self.current,
        })
    }

    /// Status for every question in navigation order.
    #[must_use]
    pub fn question_statuses(&self) -> Vec<QuestionStatus> {
        (0..self.exam.total_questions())
            .filter_map(|index| self.question_status(index))
            .collect()
    }

    #[must_use]
    pub fn review_summary(&self) -> ReviewSummary {
        ReviewSummary::from_parts(self.exam.total_questions(), &self.answers, &self.flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::{
        AnswerOption, ExamConfigError, ExamMeta, QuestionId, QuestionKind, SubjectId,
    };
    use exam_core::time::fixed_now;

    fn exam_with(count: u64) -> Exam {
        let questions = (1..=count)
            .map(|id| {
                Question::new(
                    QuestionId::new(id),
                    format!("Q{id}"),
                    QuestionKind::MultipleChoice {
                        options: vec![AnswerOption::new("a", "A"), AnswerOption::new("b", "B")],
                        correct: "a".into(),
                    },
                    "",
                )
                .unwrap()
            })
            .collect();
        Exam::new(SubjectId::new(1), ExamMeta::new("Quiz", Some(10)), questions)
    }

    fn started(count: u64) -> ExamSession {
        let mut session = ExamSession::new(exam_with(count), ExamSettings::default());
        session.confirm_start(fixed_now()).unwrap();
        session
    }

    #[test]
    fn confirm_start_moves_through_confirming() {
        let mut session = ExamSession::new(exam_with(2), ExamSettings::default());
        assert!(session.request_start());
        assert_eq!(session.lifecycle(), SessionLifecycle::Confirming);
        assert!(session.cancel_start());
        assert_eq!(session.lifecycle(), SessionLifecycle::NotStarted);

        session.request_start();
        session.confirm_start(fixed_now()).unwrap();
        assert_eq!(session.lifecycle(), SessionLifecycle::InProgress);
        assert_eq!(session.started_at(), Some(fixed_now()));
        assert!(matches!(
            session.confirm_start(fixed_now()),
            Err(SessionError::AlreadyStarted)
        ));
    }

    #[test]
    fn empty_exam_never_enters_progress() {
        let mut session = ExamSession::new(exam_with(0), ExamSettings::default());
        let err = session.confirm_start(fixed_now()).unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidExamConfiguration(ExamConfigError::EmptyQuestions)
        ));
        assert_eq!(session.lifecycle(), SessionLifecycle::NotStarted);
    }

    #[test]
    fn answers_are_ignored_before_start_and_out_of_range() {
        let mut session = ExamSession::new(exam_with(3), ExamSettings::default());
        assert_eq!(session.record_answer(0, "a"), AnswerOutcome::Ignored);

        session.confirm_start(fixed_now()).unwrap();
        assert_eq!(session.record_answer(3, "a"), AnswerOutcome::Ignored);
        assert!(session.record_answer(2, "b").is_recorded());
        assert!(session.record_answer(2, "a").is_recorded());
        assert_eq!(session.answers().get(2), Some("a"));
        assert_eq!(session.answers().len(), 1);
    }

    #[test]
    fn milestones_fire_once_per_count() {
        let mut session = started(10);
        let mut fired = Vec::new();
        for index in 0..10 {
            if let Some(m) = session.record_answer(index, "a").milestone() {
                fired.push(m);
            }
        }
        assert_eq!(
            fired,
            vec![Milestone::HalfwayThere, Milestone::AllAnswered]
        );

        // Overwriting does not re-fire.
        assert_eq!(session.record_answer(9, "b").milestone(), None);
    }

    #[test]
    fn toggling_twice_restores_flag_membership() {
        let mut session = started(3);
        assert_eq!(session.toggle_flag(1), Some(true));
        assert_eq!(session.toggle_flag(1), Some(false));
        assert!(!session.flags().contains(1));
        assert_eq!(session.toggle_flag(7), None);
    }

    #[test]
    fn out_of_range_navigation_keeps_position() {
        let mut session = started(3);
        assert!(session.navigate(2));
        assert!(!session.navigate(3));
        assert!(!session.navigate(usize::MAX));
        assert_eq!(session.current_index(), 2);
        assert!(!session.next_question());
        assert!(session.previous_question());
        assert_eq!(session.current_index(), 1);
    }

    #[test]
    fn question_grid_follows_answers_flags_and_position() {
        let mut session = started(3);
        assert_eq!(session.current_question().unwrap().id(), QuestionId::new(1));

        session.record_answer(0, "b");
        session.toggle_flag(2);
        session.navigate(2);
        assert_eq!(session.current_question().unwrap().id(), QuestionId::new(3));

        let statuses = session.question_statuses();
        assert_eq!(statuses.len(), 3);
        assert_eq!(
            statuses[0],
            QuestionStatus {
                index: 0,
                answered: true,
                flagged: false,
                current: false,
            }
        );
        assert!(!statuses[1].answered && !statuses[1].flagged && !statuses[1].current);
        assert!(statuses[2].flagged && statuses[2].current && !statuses[2].answered);
        assert_eq!(session.question_status(3), None);
    }

    #[test]
    fn review_reports_open_questions_without_blocking() {
        let mut session = started(4);
        session.record_answer(0, "a");
        session.toggle_flag(3);

        let summary = session.enter_review().expect("review entered");
        assert_eq!(session.lifecycle(), SessionLifecycle::Reviewing);
        assert_eq!(summary.unanswered, vec![1, 2, 3]);
        assert_eq!(summary.flagged, vec![3]);

        assert!(session.record_answer(1, "b").is_recorded());
        assert!(session.resume_from_review());
        assert_eq!(session.lifecycle(), SessionLifecycle::InProgress);
    }

    #[test]
    fn second_submission_is_a_no_op() {
        let mut session = started(2);
        assert!(session.begin_submission(fixed_now()));
        assert!(!session.begin_submission(fixed_now()));
        assert_eq!(session.record_answer(0, "a"), AnswerOutcome::Ignored);
        assert!(session.complete());
        assert!(session.is_complete());
        assert!(!session.complete());
    }

    #[test]
    fn build_result_scores_current_answers() {
        let mut session = started(4);
        session.record_answer(0, "a");
        session.record_answer(1, "b");
        session.begin_submission(fixed_now());

        let result = session
            .build_result(fixed_now() + chrono::Duration::seconds(90), 90, 2)
            .unwrap();
        assert_eq!(result.correct_count(), 1);
        assert_eq!(result.total_questions(), 4);
        assert_eq!(result.score(), 25);
        assert_eq!(result.per_question(), &[true, false, false, false]);
        assert_eq!(result.integrity_violation_count(), 2);
        assert_eq!(result.attempt_id(), session.attempt_id());
    }
}
