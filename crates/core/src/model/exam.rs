use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::{QuestionId, SubjectId};
use crate::model::question::Question;
use crate::model::settings::ExamSettings;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Reasons an exam cannot be started.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExamConfigError {
    #[error("exam has no questions")]
    EmptyQuestions,

    #[error("exam name is missing")]
    MissingName,

    #[error("exam requires a positive duration")]
    MissingDuration,

    #[error("question id {0} appears more than once")]
    DuplicateQuestionId(QuestionId),

    #[error("section `{title}` does not fit in {total} questions")]
    SectionOutOfRange { title: String, total: usize },
}

//
// ─── METADATA ──────────────────────────────────────────────────────────────────
//

/// Contiguous, titled slice of the question sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamSection {
    pub title: String,
    pub start: usize,
    pub len: usize,
}

impl ExamSection {
    #[must_use]
    pub fn new(title: impl Into<String>, start: usize, len: usize) -> Self {
        Self {
            title: title.into(),
            start,
            len,
        }
    }

    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index - self.start < self.len
    }
}

/// Exam metadata supplied next to the question list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamMeta {
    pub name: String,
    /// `None` or `Some(0)` means the exam is untimed.
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub sections: Vec<ExamSection>,
}

impl ExamMeta {
    #[must_use]
    pub fn new(name: impl Into<String>, duration_minutes: Option<u32>) -> Self {
        Self {
            name: name.into(),
            duration_minutes,
            sections: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_sections(mut self, sections: Vec<ExamSection>) -> Self {
        self.sections = sections;
        self
    }

    /// Positive duration in minutes, if the exam is timed.
    #[must_use]
    pub fn timed_minutes(&self) -> Option<u32> {
        self.duration_minutes.filter(|minutes| *minutes > 0)
    }
}

//
// ─── EXAM ──────────────────────────────────────────────────────────────────────
//

/// Ordered question list plus metadata for one subject.
///
/// Construction does not validate; [`Exam::validate`] is the start-time
/// precondition check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exam {
    subject_id: SubjectId,
    meta: ExamMeta,
    questions: Vec<Question>,
}

impl Exam {
    #[must_use]
    pub fn new(subject_id: SubjectId, meta: ExamMeta, questions: Vec<Question>) -> Self {
        Self {
            subject_id,
            meta,
            questions,
        }
    }

    /// Check that the exam can be started.
    ///
    /// # Errors
    ///
    /// Returns `ExamConfigError` for an empty question list, a blank name,
    /// a missing duration when `settings` require one, duplicated question
    /// ids, or sections reaching past the last question.
    pub fn validate(&self, settings: &ExamSettings) -> Result<(), ExamConfigError> {
        if self.questions.is_empty() {
            return Err(ExamConfigError::EmptyQuestions);
        }
        if self.meta.name.trim().is_empty() {
            return Err(ExamConfigError::MissingName);
        }
        if settings.require_duration() && self.meta.timed_minutes().is_none() {
            return Err(ExamConfigError::MissingDuration);
        }

        let mut seen = HashSet::with_capacity(self.questions.len());
        for question in &self.questions {
            if !seen.insert(question.id()) {
                return Err(ExamConfigError::DuplicateQuestionId(question.id()));
            }
        }

        let total = self.questions.len();
        for section in &self.meta.sections {
            let fits = section
                .start
                .checked_add(section.len)
                .is_some_and(|end| end <= total);
            if !fits {
                return Err(ExamConfigError::SectionOutOfRange {
                    title: section.title.clone(),
                    total,
                });
            }
        }

        Ok(())
    }

    #[must_use]
    pub fn subject_id(&self) -> SubjectId {
        self.subject_id
    }

    #[must_use]
    pub fn meta(&self) -> &ExamMeta {
        &self.meta
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.meta.name
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    /// Section containing the question at `index`, if any.
    #[must_use]
    pub fn section_for(&self, index: usize) -> Option<&ExamSection> {
        self.meta.sections.iter().find(|s| s.contains(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionKind;

    fn tf(id: u64) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("Statement {id}"),
            QuestionKind::TrueFalse { correct: true },
            "",
        )
        .unwrap()
    }

    #[test]
    fn empty_exam_is_invalid() {
        let exam = Exam::new(SubjectId::new(1), ExamMeta::new("Empty", Some(10)), Vec::new());
        assert_eq!(
            exam.validate(&ExamSettings::default()),
            Err(ExamConfigError::EmptyQuestions)
        );
    }

    #[test]
    fn blank_name_is_invalid() {
        let exam = Exam::new(SubjectId::new(1), ExamMeta::new("  ", Some(10)), vec![tf(1)]);
        assert_eq!(
            exam.validate(&ExamSettings::default()),
            Err(ExamConfigError::MissingName)
        );
    }

    #[test]
    fn zero_duration_only_fails_when_required() {
        let exam = Exam::new(SubjectId::new(1), ExamMeta::new("Quiz", Some(0)), vec![tf(1)]);
        assert!(exam.validate(&ExamSettings::default()).is_ok());

        let strict = ExamSettings::new(vec![60], 6, 5, 5, true).unwrap();
        assert_eq!(exam.validate(&strict), Err(ExamConfigError::MissingDuration));
    }

    #[test]
    fn duplicate_ids_are_invalid() {
        let exam = Exam::new(
            SubjectId::new(1),
            ExamMeta::new("Quiz", None),
            vec![tf(1), tf(1)],
        );
        assert_eq!(
            exam.validate(&ExamSettings::default()),
            Err(ExamConfigError::DuplicateQuestionId(QuestionId::new(1)))
        );
    }

    #[test]
    fn sections_must_fit_and_resolve_by_index() {
        let meta = ExamMeta::new("Quiz", Some(5)).with_sections(vec![
            ExamSection::new("Part A", 0, 2),
            ExamSection::new("Part B", 2, 1),
        ]);
        let exam = Exam::new(SubjectId::new(1), meta, vec![tf(1), tf(2), tf(3)]);
        assert!(exam.validate(&ExamSettings::default()).is_ok());
        assert_eq!(exam.section_for(1).map(|s| s.title.as_str()), Some("Part A"));
        assert_eq!(exam.section_for(2).map(|s| s.title.as_str()), Some("Part B"));
        assert!(exam.section_for(3).is_none());

        let overflowing = Exam::new(
            SubjectId::new(1),
            ExamMeta::new("Quiz", None).with_sections(vec![ExamSection::new("Tail", 2, 5)]),
            vec![tf(1), tf(2), tf(3)],
        );
        assert!(matches!(
            overflowing.validate(&ExamSettings::default()),
            Err(ExamConfigError::SectionOutOfRange { total: 3, .. })
        ));
    }
}
