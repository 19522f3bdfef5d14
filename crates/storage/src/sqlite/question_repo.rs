use exam_core::model::{Exam, ExamMeta, ExamSection, SubjectId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{
    from_json, id_to_i64, map_question_row, ser, subject_id_from_i64, to_json, u32_from_i64,
};
use crate::repository::{ExamListing, QuestionBank, StorageError};

#[async_trait::async_trait]
impl QuestionBank for SqliteRepository {
    async fn upsert_exam(&self, exam: &Exam) -> Result<(), StorageError> {
        let subject_id = id_to_i64("subject_id", exam.subject_id().value())?;
        let meta = exam.meta();
        let sections = to_json(&meta.sections)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        sqlx::query(
            r"
            INSERT INTO exams (subject_id, name, duration_minutes, sections)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(subject_id) DO UPDATE SET
                name = excluded.name,
                duration_minutes = excluded.duration_minutes,
                sections = excluded.sections
            ",
        )
        .bind(subject_id)
        .bind(meta.name.as_str())
        .bind(meta.duration_minutes.map(i64::from))
        .bind(sections)
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        // Question order is significant, so the whole list is replaced.
        sqlx::query("DELETE FROM questions WHERE subject_id = ?1")
            .bind(subject_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        for (position, question) in exam.questions().iter().enumerate() {
            let position = i64::try_from(position)
                .map_err(|_| StorageError::Serialization("position overflow".into()))?;
            sqlx::query(
                r"
                INSERT INTO questions (subject_id, position, id, text, kind, explanation)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ",
            )
            .bind(subject_id)
            .bind(position)
            .bind(id_to_i64("question_id", question.id().value())?)
            .bind(question.text())
            .bind(to_json(question.kind())?)
            .bind(question.explanation())
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }

    async fn get_exam(&self, subject_id: SubjectId) -> Result<Option<Exam>, StorageError> {
        let subject = id_to_i64("subject_id", subject_id.value())?;

        let Some(row) = sqlx::query(
            r"
            SELECT name, duration_minutes, sections
            FROM exams
            WHERE subject_id = ?1
            ",
        )
        .bind(subject)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?
        else {
            return Ok(None);
        };

        let name: String = row.try_get("name").map_err(ser)?;
        let duration_minutes = row
            .try_get::<Option<i64>, _>("duration_minutes")
            .map_err(ser)?
            .map(|v| u32_from_i64("duration_minutes", v))
            .transpose()?;
        let sections_raw: String = row.try_get("sections").map_err(ser)?;
        let sections: Vec<ExamSection> = from_json("sections", &sections_raw)?;

        let rows = sqlx::query(
            r"
            SELECT id, text, kind, explanation
            FROM questions
            WHERE subject_id = ?1
            ORDER BY position ASC
            ",
        )
        .bind(subject)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut questions = Vec::with_capacity(rows.len());
        for row in &rows {
            questions.push(map_question_row(row)?);
        }

        let meta = ExamMeta::new(name, duration_minutes).with_sections(sections);
        Ok(Some(Exam::new(subject_id, meta, questions)))
    }

    async fn list_exams(&self, limit: u32) -> Result<Vec<ExamListing>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT e.subject_id, e.name, e.duration_minutes, COUNT(q.id) AS question_count
            FROM exams e
            LEFT JOIN questions q ON q.subject_id = e.subject_id
            GROUP BY e.subject_id
            ORDER BY e.subject_id ASC
            LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let count: i64 = row.try_get("question_count").map_err(ser)?;
            out.push(ExamListing {
                subject_id: subject_id_from_i64(row.try_get::<i64, _>("subject_id").map_err(ser)?)?,
                name: row.try_get("name").map_err(ser)?,
                question_count: usize::try_from(count).map_err(ser)?,
                duration_minutes: row
                    .try_get::<Option<i64>, _>("duration_minutes")
                    .map_err(ser)?
                    .map(|v| u32_from_i64("duration_minutes", v))
                    .transpose()?,
            });
        }
        Ok(out)
    }
}
