use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyText,

    #[error("multiple choice question needs at least one option")]
    NoOptions,

    #[error("option id `{0}` appears more than once")]
    DuplicateOption(String),

    #[error("correct answer `{0}` does not name any option")]
    UnknownCorrectOption(String),

    #[error("fill-in-blank answer cannot be empty")]
    EmptyAnswer,
}

//
// ─── OPTIONS ───────────────────────────────────────────────────────────────────
//

/// One selectable choice of a multiple choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: String,
    pub text: String,
}

impl AnswerOption {
    #[must_use]
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Question type together with its correct answer.
///
/// The shape of the correct answer depends on the type, so it lives inside
/// the variant instead of next to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum QuestionKind {
    MultipleChoice {
        options: Vec<AnswerOption>,
        correct: String,
    },
    TrueFalse {
        correct: bool,
    },
    FillInBlank {
        correct: String,
    },
}

impl QuestionKind {
    /// Stable storage label of the question type.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice { .. } => "multipleChoice",
            QuestionKind::TrueFalse { .. } => "trueFalse",
            QuestionKind::FillInBlank { .. } => "fillInBlank",
        }
    }
}

/// Immutable question record supplied by the question bank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    text: String,
    kind: QuestionKind,
    explanation: String,
}

impl Question {
    /// Build a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the text is blank, a multiple choice question
    /// has no options or duplicated option ids, its correct answer names no
    /// option, or a fill-in-blank answer is blank.
    pub fn new(
        id: QuestionId,
        text: impl Into<String>,
        kind: QuestionKind,
        explanation: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QuestionError::EmptyText);
        }

        match &kind {
            QuestionKind::MultipleChoice { options, correct } => {
                if options.is_empty() {
                    return Err(QuestionError::NoOptions);
                }
                let mut seen = HashSet::with_capacity(options.len());
                for option in options {
                    if !seen.insert(option.id.as_str()) {
                        return Err(QuestionError::DuplicateOption(option.id.clone()));
                    }
                }
                if !seen.contains(correct.as_str()) {
                    return Err(QuestionError::UnknownCorrectOption(correct.clone()));
                }
            }
            QuestionKind::FillInBlank { correct } if correct.is_empty() => {
                return Err(QuestionError::EmptyAnswer);
            }
            QuestionKind::TrueFalse { .. } | QuestionKind::FillInBlank { .. } => {}
        }

        Ok(Self {
            id,
            text,
            kind,
            explanation: explanation.into(),
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn kind(&self) -> &QuestionKind {
        &self.kind
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    /// Options for multiple choice questions, empty otherwise.
    #[must_use]
    pub fn options(&self) -> &[AnswerOption] {
        match &self.kind {
            QuestionKind::MultipleChoice { options, .. } => options,
            _ => &[],
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Vec<AnswerOption> {
        vec![AnswerOption::new("a", "Paris"), AnswerOption::new("b", "Rome")]
    }

    #[test]
    fn multiple_choice_requires_known_correct_option() {
        let err = Question::new(
            QuestionId::new(1),
            "Capital of France?",
            QuestionKind::MultipleChoice {
                options: options(),
                correct: "z".into(),
            },
            "",
        )
        .unwrap_err();
        assert_eq!(err, QuestionError::UnknownCorrectOption("z".into()));
    }

    #[test]
    fn duplicate_option_ids_are_rejected() {
        let mut opts = options();
        opts.push(AnswerOption::new("a", "Madrid"));
        let err = Question::new(
            QuestionId::new(1),
            "Capital of France?",
            QuestionKind::MultipleChoice {
                options: opts,
                correct: "a".into(),
            },
            "",
        )
        .unwrap_err();
        assert_eq!(err, QuestionError::DuplicateOption("a".into()));
    }

    #[test]
    fn blank_text_is_rejected() {
        let err = Question::new(
            QuestionId::new(2),
            "   ",
            QuestionKind::TrueFalse { correct: true },
            "",
        )
        .unwrap_err();
        assert_eq!(err, QuestionError::EmptyText);
    }

    #[test]
    fn options_are_empty_for_non_choice_questions() {
        let q = Question::new(
            QuestionId::new(3),
            "Ice is ___",
            QuestionKind::FillInBlank {
                correct: "cold".into(),
            },
            "Frozen water is cold.",
        )
        .unwrap();
        assert!(q.options().is_empty());
        assert_eq!(q.kind().label(), "fillInBlank");
    }
}
