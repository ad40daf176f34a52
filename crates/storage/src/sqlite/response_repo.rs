use quiz_core::model::{NewResponse, QuestionId, Response, UserId};

use super::SqliteRepository;
use super::mapping::{
    conn, count_u64, id_i64, map_response_row, map_rows, response_id_from_i64, write_err,
};
use crate::repository::{ResponseRepository, StorageError};

#[async_trait::async_trait]
impl ResponseRepository for SqliteRepository {
    async fn append_response(&self, response: NewResponse) -> Result<Response, StorageError> {
        let question_id = id_i64("question_id", response.question_id.value())?;
        let user_id = id_i64("user_id", response.user_id.value())?;

        let res = sqlx::query(
            r"
            INSERT INTO responses (question_id, user_id, is_correct, chosen_answer, answered_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(question_id)
        .bind(user_id)
        .bind(i64::from(response.is_correct))
        .bind(response.chosen_answer.as_deref())
        .bind(response.answered_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            write_err(e, || {
                format!(
                    "response for question {} by user {}",
                    response.question_id, response.user_id
                )
            })
        })?;

        let id = response_id_from_i64(res.last_insert_rowid())?;
        tracing::debug!(
            response_id = %id,
            question_id = %response.question_id,
            user_id = %response.user_id,
            is_correct = response.is_correct,
            "response recorded"
        );
        Ok(Response::from_new(id, response))
    }

    async fn has_response(
        &self,
        question_id: QuestionId,
        user_id: UserId,
    ) -> Result<bool, StorageError> {
        let row = sqlx::query(
            "SELECT 1 FROM responses WHERE question_id = ?1 AND user_id = ?2 LIMIT 1",
        )
        .bind(id_i64("question_id", question_id.value())?)
        .bind(id_i64("user_id", user_id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;
        Ok(row.is_some())
    }

    async fn responses_for_user(&self, user_id: UserId) -> Result<Vec<Response>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, question_id, user_id, is_correct, chosen_answer, answered_at
            FROM responses
            WHERE user_id = ?1
            ORDER BY id ASC
            ",
        )
        .bind(id_i64("user_id", user_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        map_rows(&rows, map_response_row)
    }

    async fn count_answered_questions(&self, user_id: UserId) -> Result<u64, StorageError> {
        let (count,): (i64,) = sqlx::query_as(
            r"
            SELECT COUNT(DISTINCT r.question_id)
            FROM responses r
            JOIN questions q ON q.id = r.question_id
            WHERE r.user_id = ?1
            ",
        )
        .bind(id_i64("user_id", user_id.value())?)
        .fetch_one(&self.pool)
        .await
        .map_err(conn)?;
        count_u64(count)
    }

    async fn clear_responses(&self) -> Result<u64, StorageError> {
        let res = sqlx::query("DELETE FROM responses")
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        tracing::info!(removed = res.rows_affected(), "cleared responses");
        Ok(res.rows_affected())
    }
}
