use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::model::answer::AnswerSheet;
use crate::model::ids::SubjectId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResultRecordError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("correct count ({correct}) exceeds total questions ({total})")]
    CountMismatch { correct: u32, total: u32 },

    #[error("score {0} is outside 0..=100")]
    InvalidScore(u32),

    #[error("per-question breakdown has {len} entries for {total} questions")]
    BreakdownMismatch { len: usize, total: u32 },
}

/// Outcome of scoring an answer sheet against a question list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub correct_count: u32,
    pub total_questions: u32,
    pub score_percent: u32,
    pub per_question: Vec<bool>,
}

/// Record handed to the persistence sink once an attempt completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamResult {
    attempt_id: Uuid,
    subject_id: SubjectId,
    exam_name: String,
    score: u32,
    correct_count: u32,
    total_questions: u32,
    per_question: Vec<bool>,
    time_taken_secs: u32,
    answers: AnswerSheet,
    integrity_violation_count: u32,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
}

/// Attempt context that is not part of the score itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptInfo {
    pub attempt_id: Uuid,
    pub subject_id: SubjectId,
    pub exam_name: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub time_taken_secs: u32,
    pub integrity_violation_count: u32,
}

impl ExamResult {
    /// Assemble a result from a fresh score.
    ///
    /// # Errors
    ///
    /// Returns `ResultRecordError` if the score is internally inconsistent or
    /// the time range is inverted.
    pub fn new(
        info: AttemptInfo,
        score: ScoreResult,
        answers: AnswerSheet,
    ) -> Result<Self, ResultRecordError> {
        Self::from_persisted(info, score, answers)
    }

    /// Rehydrate a result from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `ResultRecordError` if counts, score or breakdown disagree.
    pub fn from_persisted(
        info: AttemptInfo,
        score: ScoreResult,
        answers: AnswerSheet,
    ) -> Result<Self, ResultRecordError> {
        if info.completed_at < info.started_at {
            return Err(ResultRecordError::InvalidTimeRange);
        }
        if score.correct_count > score.total_questions {
            return Err(ResultRecordError::CountMismatch {
                correct: score.correct_count,
                total: score.total_questions,
            });
        }
        if score.score_percent > 100 {
            return Err(ResultRecordError::InvalidScore(score.score_percent));
        }
        let expected = usize::try_from(score.total_questions).unwrap_or(usize::MAX);
        if score.per_question.len() != expected {
            return Err(ResultRecordError::BreakdownMismatch {
                len: score.per_question.len(),
                total: score.total_questions,
            });
        }

        Ok(Self {
            attempt_id: info.attempt_id,
            subject_id: info.subject_id,
            exam_name: info.exam_name,
            score: score.score_percent,
            correct_count: score.correct_count,
            total_questions: score.total_questions,
            per_question: score.per_question,
            time_taken_secs: info.time_taken_secs,
            answers,
            integrity_violation_count: info.integrity_violation_count,
            started_at: info.started_at,
            completed_at: info.completed_at,
        })
    }

    #[must_use]
    pub fn attempt_id(&self) -> Uuid {
        self.attempt_id
    }

    #[must_use]
    pub fn subject_id(&self) -> SubjectId {
        self.subject_id
    }

    #[must_use]
    pub fn exam_name(&self) -> &str {
        &self.exam_name
    }

    /// Percentage score, 0..=100.
    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn per_question(&self) -> &[bool] {
        &self.per_question
    }

    #[must_use]
    pub fn time_taken_secs(&self) -> u32 {
        self.time_taken_secs
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerSheet {
        &self.answers
    }

    #[must_use]
    pub fn integrity_violation_count(&self) -> u32 {
        self.integrity_violation_count
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn info() -> AttemptInfo {
        AttemptInfo {
            attempt_id: Uuid::new_v4(),
            subject_id: SubjectId::new(3),
            exam_name: "Physics".into(),
            started_at: fixed_now(),
            completed_at: fixed_now() + chrono::Duration::minutes(12),
            time_taken_secs: 720,
            integrity_violation_count: 2,
        }
    }

    #[test]
    fn result_keeps_score_and_context() {
        let score = ScoreResult {
            correct_count: 1,
            total_questions: 2,
            score_percent: 50,
            per_question: vec![true, false],
        };
        let result = ExamResult::new(info(), score, AnswerSheet::new()).unwrap();

        assert_eq!(result.score(), 50);
        assert_eq!(result.subject_id(), SubjectId::new(3));
        assert_eq!(result.integrity_violation_count(), 2);
        assert_eq!(result.time_taken_secs(), 720);
    }

    #[test]
    fn inconsistent_breakdown_is_rejected() {
        let score = ScoreResult {
            correct_count: 1,
            total_questions: 3,
            score_percent: 33,
            per_question: vec![true],
        };
        let err = ExamResult::from_persisted(info(), score, AnswerSheet::new()).unwrap_err();
        assert_eq!(err, ResultRecordError::BreakdownMismatch { len: 1, total: 3 });
    }

    #[test]
    fn inverted_time_range_is_rejected() {
        let mut info = info();
        info.completed_at = info.started_at - chrono::Duration::seconds(1);
        let score = ScoreResult {
            correct_count: 0,
            total_questions: 0,
            score_percent: 0,
            per_question: Vec::new(),
        };
        let err = ExamResult::new(info, score, AnswerSheet::new()).unwrap_err();
        assert_eq!(err, ResultRecordError::InvalidTimeRange);
    }
}
