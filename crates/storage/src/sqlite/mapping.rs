use exam_core::model::{
    AnswerSheet, AttemptInfo, ExamResult, Question, QuestionId, QuestionKind, ScoreResult,
    SubjectId,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::Row;
use uuid::Uuid;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn id_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn subject_id_from_i64(v: i64) -> Result<SubjectId, StorageError> {
    Ok(SubjectId::new(i64_to_u64("subject_id", v)?))
}

pub(crate) fn question_id_from_i64(v: i64) -> Result<QuestionId, StorageError> {
    Ok(QuestionId::new(i64_to_u64("question_id", v)?))
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(ser)
}

pub(crate) fn from_json<T: DeserializeOwned>(field: &'static str, raw: &str) -> Result<T, StorageError> {
    serde_json::from_str(raw)
        .map_err(|e| StorageError::Serialization(format!("invalid {field}: {e}")))
}

/// Rebuilds a question; the stored record goes through the same validation as new input.
pub(crate) fn map_question_row(row: &sqlx::sqlite::SqliteRow) -> Result<Question, StorageError> {
    let id = question_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;
    let text: String = row.try_get("text").map_err(ser)?;
    let kind_raw: String = row.try_get("kind").map_err(ser)?;
    let kind: QuestionKind = from_json("kind", &kind_raw)?;
    let explanation: String = row.try_get("explanation").map_err(ser)?;

    Question::new(id, text, kind, explanation).map_err(ser)
}

pub(crate) fn map_result_row(row: &sqlx::sqlite::SqliteRow) -> Result<ExamResult, StorageError> {
    let attempt_raw: String = row.try_get("attempt_id").map_err(ser)?;
    let attempt_id = Uuid::parse_str(&attempt_raw).map_err(ser)?;
    let per_question_raw: String = row.try_get("per_question").map_err(ser)?;
    let answers_raw: String = row.try_get("answers").map_err(ser)?;

    let info = AttemptInfo {
        attempt_id,
        subject_id: subject_id_from_i64(row.try_get::<i64, _>("subject_id").map_err(ser)?)?,
        exam_name: row.try_get("exam_name").map_err(ser)?,
        started_at: row.try_get("started_at").map_err(ser)?,
        completed_at: row.try_get("completed_at").map_err(ser)?,
        time_taken_secs: u32_from_i64(
            "time_taken_secs",
            row.try_get::<i64, _>("time_taken_secs").map_err(ser)?,
        )?,
        integrity_violation_count: u32_from_i64(
            "integrity_violation_count",
            row.try_get::<i64, _>("integrity_violation_count")
                .map_err(ser)?,
        )?,
    };
    let score = ScoreResult {
        correct_count: u32_from_i64(
            "correct_count",
            row.try_get::<i64, _>("correct_count").map_err(ser)?,
        )?,
        total_questions: u32_from_i64(
            "total_questions",
            row.try_get::<i64, _>("total_questions").map_err(ser)?,
        )?,
        score_percent: u32_from_i64("score", row.try_get::<i64, _>("score").map_err(ser)?)?,
        per_question: from_json("per_question", &per_question_raw)?,
    };
    let answers: AnswerSheet = from_json("answers", &answers_raw)?;

    ExamResult::from_persisted(info, score, answers).map_err(ser)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_sheet_json_uses_index_keys() {
        let mut sheet = AnswerSheet::new();
        sheet.record(0, "a");
        sheet.record(3, "true");
        let json = to_json(&sheet).unwrap();
        assert_eq!(json, r#"{"0":"a","3":"true"}"#);
        let back: AnswerSheet = from_json("answers", &json).unwrap();
        assert_eq!(back, sheet);
    }

    #[test]
    fn question_kind_json_is_tagged() {
        let kind = QuestionKind::TrueFalse { correct: false };
        assert_eq!(to_json(&kind).unwrap(), r#"{"type":"trueFalse","correct":false}"#);
    }

    #[test]
    fn negative_ids_are_rejected() {
        assert!(subject_id_from_i64(-1).is_err());
    }
}
