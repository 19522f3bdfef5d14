//! Answer correctness and percentage scoring.
//!
//! Scoring is a pure function of the question list and the answer sheet, so
//! the same inputs always produce the same [`ScoreResult`].

use crate::model::{AnswerSheet, Question, QuestionKind, ScoreResult};

/// Whether `answer` is correct for `question`.
///
/// Matching is exact and case-sensitive for every type; true/false answers
/// must be the literal strings `"true"` or `"false"`.
#[must_use]
pub fn is_correct(question: &Question, answer: &str) -> bool {
    match question.kind() {
        QuestionKind::TrueFalse { correct } => answer == bool_label(*correct),
        QuestionKind::MultipleChoice { correct, .. } | QuestionKind::FillInBlank { correct } => {
            answer == correct
        }
    }
}

/// Score an answer sheet. Unanswered questions are never correct.
#[must_use]
pub fn score(questions: &[Question], answers: &AnswerSheet) -> ScoreResult {
    let per_question: Vec<bool> = questions
        .iter()
        .enumerate()
        .map(|(index, question)| {
            answers
                .get(index)
                .is_some_and(|answer| is_correct(question, answer))
        })
        .collect();

    let correct = per_question.iter().filter(|ok| **ok).count();
    let total = per_question.len();

    ScoreResult {
        correct_count: u32::try_from(correct).unwrap_or(u32::MAX),
        total_questions: u32::try_from(total).unwrap_or(u32::MAX),
        score_percent: percent(correct, total),
        per_question,
    }
}

/// `round(correct / total * 100)`, rounding halves up; 0 for an empty exam.
#[must_use]
pub fn percent(correct: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let scaled = (correct.saturating_mul(200) + total) / total.saturating_mul(2);
    u32::try_from(scaled).unwrap_or(u32::MAX)
}

fn bool_label(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnswerOption, QuestionId};

    fn mc(id: u64, correct: &str) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("Question {id}"),
            QuestionKind::MultipleChoice {
                options: vec![
                    AnswerOption::new("a", "A"),
                    AnswerOption::new("b", "B"),
                    AnswerOption::new("c", "C"),
                ],
                correct: correct.into(),
            },
            "",
        )
        .unwrap()
    }

    fn tf(id: u64, correct: bool) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("Statement {id}"),
            QuestionKind::TrueFalse { correct },
            "",
        )
        .unwrap()
    }

    fn blank(id: u64, correct: &str) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("Fill {id}"),
            QuestionKind::FillInBlank {
                correct: correct.into(),
            },
            "",
        )
        .unwrap()
    }

    #[test]
    fn three_correct_one_wrong_one_unanswered_scores_sixty() {
        let questions = vec![mc(1, "a"), mc(2, "b"), mc(3, "c"), tf(4, true), mc(5, "a")];
        let answers: AnswerSheet = [
            (0, "a".to_string()),
            (1, "b".to_string()),
            (2, "c".to_string()),
            (3, "false".to_string()),
        ]
        .into_iter()
        .collect();

        let result = score(&questions, &answers);

        assert_eq!(result.correct_count, 3);
        assert_eq!(result.total_questions, 5);
        assert_eq!(result.score_percent, 60);
        assert_eq!(result.per_question, vec![true, true, true, false, false]);
    }

    #[test]
    fn fill_in_blank_is_case_sensitive() {
        let questions = vec![blank(1, "cold")];
        let mut answers = AnswerSheet::new();
        answers.record(0, "Cold");

        let result = score(&questions, &answers);
        assert_eq!(result.correct_count, 0);
        assert_eq!(result.score_percent, 0);
    }

    #[test]
    fn fill_in_blank_does_not_trim() {
        assert!(!is_correct(&blank(1, "cold"), " cold"));
        assert!(is_correct(&blank(1, "cold"), "cold"));
    }

    #[test]
    fn true_false_matches_boolean_labels() {
        assert!(is_correct(&tf(1, false), "false"));
        assert!(!is_correct(&tf(1, false), "False"));
        assert!(!is_correct(&tf(1, true), "yes"));
    }

    #[test]
    fn empty_exam_scores_zero() {
        let result = score(&[], &AnswerSheet::new());
        assert_eq!(result.score_percent, 0);
        assert_eq!(result.total_questions, 0);
        assert!(result.per_question.is_empty());
    }

    #[test]
    fn percent_rounds_halves_up() {
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(1, 8), 13);
        assert_eq!(percent(7, 7), 100);
    }

    #[test]
    fn scoring_is_deterministic() {
        let questions = vec![mc(1, "a"), tf(2, true)];
        let mut answers = AnswerSheet::new();
        answers.record(0, "a");
        answers.record(1, "true");
        assert_eq!(score(&questions, &answers), score(&questions, &answers));
    }
}
