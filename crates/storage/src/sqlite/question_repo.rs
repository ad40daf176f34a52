use quiz_core::model::{Question, QuestionDraft, QuestionId, UserId};

use super::SqliteRepository;
use super::mapping::{conn, count_u64, id_i64, map_question_row, map_rows, question_id_from_i64};
use crate::repository::{QuestionRepository, StorageError};

#[async_trait::async_trait]
impl QuestionRepository for SqliteRepository {
    async fn create_question(&self, draft: &QuestionDraft) -> Result<Question, StorageError> {
        let [a, b, c, d] = &draft.options;
        let res = sqlx::query(
            r"
            INSERT INTO questions (prompt, option_a, option_b, option_c, option_d, answer)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(&draft.text)
        .bind(a)
        .bind(b)
        .bind(c)
        .bind(d)
        .bind(&draft.answer)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        let id = question_id_from_i64(res.last_insert_rowid())?;
        tracing::debug!(question_id = %id, "question inserted");
        self.get_question(id).await?.ok_or(StorageError::NotFound)
    }

    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, prompt, option_a, option_b, option_c, option_d, answer
            FROM questions WHERE id = ?1
            ",
        )
        .bind(id_i64("question_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_question_row).transpose()
    }

    async fn update_question(
        &self,
        id: QuestionId,
        draft: &QuestionDraft,
    ) -> Result<Option<Question>, StorageError> {
        let [a, b, c, d] = &draft.options;
        let res = sqlx::query(
            r"
            UPDATE questions
            SET prompt = ?1, option_a = ?2, option_b = ?3, option_c = ?4, option_d = ?5, answer = ?6
            WHERE id = ?7
            ",
        )
        .bind(&draft.text)
        .bind(a)
        .bind(b)
        .bind(c)
        .bind(d)
        .bind(&draft.answer)
        .bind(id_i64("question_id", id.value())?)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            tracing::debug!(question_id = %id, "update skipped: question not found");
            return Ok(None);
        }
        self.get_question(id).await
    }

    async fn delete_question(&self, id: QuestionId) -> Result<bool, StorageError> {
        let res = sqlx::query("DELETE FROM questions WHERE id = ?1")
            .bind(id_i64("question_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(res.rows_affected() > 0)
    }

    async fn list_questions(&self) -> Result<Vec<Question>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, prompt, option_a, option_b, option_c, option_d, answer
            FROM questions
            ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        map_rows(&rows, map_question_row)
    }

    async fn list_unanswered(&self, user_id: UserId) -> Result<Vec<Question>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, prompt, option_a, option_b, option_c, option_d, answer
            FROM questions
            WHERE id NOT IN (
                SELECT question_id FROM responses WHERE user_id = ?1
            )
            ORDER BY id ASC
            ",
        )
        .bind(id_i64("user_id", user_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        map_rows(&rows, map_question_row)
    }

    async fn count_questions(&self) -> Result<u64, StorageError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM questions")
            .fetch_one(&self.pool)
            .await
            .map_err(conn)?;
        count_u64(count)
    }

    async fn clear_questions(&self) -> Result<u64, StorageError> {
        let res = sqlx::query("DELETE FROM questions")
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        tracing::info!(removed = res.rows_affected(), "cleared questions");
        Ok(res.rows_affected())
    }
}
