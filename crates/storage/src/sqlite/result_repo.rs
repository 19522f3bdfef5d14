use exam_core::model::{ExamResult, SubjectId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{id_to_i64, map_result_row, ser, to_json};
use crate::repository::{ResultRepository, ResultRow, StorageError};

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

#[async_trait::async_trait]
impl ResultRepository for SqliteRepository {
    async fn append_result(&self, result: &ExamResult) -> Result<i64, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO exam_results (
                    attempt_id, subject_id, exam_name, score, correct_count,
                    total_questions, per_question, time_taken_secs, answers,
                    integrity_violation_count, started_at, completed_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            ",
        )
        .bind(result.attempt_id().to_string())
        .bind(id_to_i64("subject_id", result.subject_id().value())?)
        .bind(result.exam_name())
        .bind(i64::from(result.score()))
        .bind(i64::from(result.correct_count()))
        .bind(i64::from(result.total_questions()))
        .bind(to_json(&result.per_question())?)
        .bind(i64::from(result.time_taken_secs()))
        .bind(to_json(result.answers())?)
        .bind(i64::from(result.integrity_violation_count()))
        .bind(result.started_at())
        .bind(result.completed_at())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StorageError::Conflict
            } else {
                StorageError::Connection(e.to_string())
            }
        })?;

        Ok(res.last_insert_rowid())
    }

    async fn get_result(&self, id: i64) -> Result<ExamResult, StorageError> {
        let row = sqlx::query(
            r"
                SELECT
                    attempt_id, subject_id, exam_name, score, correct_count,
                    total_questions, per_question, time_taken_secs, answers,
                    integrity_violation_count, started_at, completed_at
                FROM exam_results
                WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?
        .ok_or(StorageError::NotFound)?;

        map_result_row(&row)
    }

    async fn list_results(
        &self,
        subject_id: SubjectId,
        limit: u32,
    ) -> Result<Vec<ResultRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    id, attempt_id, subject_id, exam_name, score, correct_count,
                    total_questions, per_question, time_taken_secs, answers,
                    integrity_violation_count, started_at, completed_at
                FROM exam_results
                WHERE subject_id = ?1
                ORDER BY completed_at DESC, id DESC
                LIMIT ?2
            ",
        )
        .bind(id_to_i64("subject_id", subject_id.value())?)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: i64 = row.try_get("id").map_err(ser)?;
            out.push(ResultRow::new(id, map_result_row(row)?));
        }
        Ok(out)
    }
}
