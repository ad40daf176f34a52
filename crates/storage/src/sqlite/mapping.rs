use quiz_core::model::{
    Question, QuestionDraft, QuestionId, Response, ResponseId, Role, User, UserId, UserProfile,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Maps a failed statement, turning unique-constraint violations into
/// `DuplicateEntry` described by `what`.
pub(crate) fn write_err(e: sqlx::Error, what: impl FnOnce() -> String) -> StorageError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StorageError::DuplicateEntry(what())
        }
        _ => StorageError::Connection(e.to_string()),
    }
}

pub(crate) fn conn(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn count_u64(v: i64) -> Result<u64, StorageError> {
    i64_to_u64("count", v)
}

pub(crate) fn user_id_from_i64(v: i64) -> Result<UserId, StorageError> {
    Ok(UserId::new(i64_to_u64("user_id", v)?))
}

pub(crate) fn question_id_from_i64(v: i64) -> Result<QuestionId, StorageError> {
    Ok(QuestionId::new(i64_to_u64("question_id", v)?))
}

pub(crate) fn response_id_from_i64(v: i64) -> Result<ResponseId, StorageError> {
    Ok(ResponseId::new(i64_to_u64("response_id", v)?))
}

pub(crate) fn map_user_row(row: &SqliteRow) -> Result<User, StorageError> {
    let role: String = row.try_get("role").map_err(ser)?;
    let role: Role = role.parse().map_err(ser)?;

    Ok(User::from_persisted(
        user_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        role,
        UserProfile {
            name: row.try_get("name").map_err(ser)?,
            phone: row.try_get("phone").map_err(ser)?,
            password: row.try_get("password").map_err(ser)?,
            image: row.try_get("image").map_err(ser)?,
        },
    ))
}

pub(crate) fn map_question_row(row: &SqliteRow) -> Result<Question, StorageError> {
    Ok(Question::from_persisted(
        question_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        QuestionDraft {
            text: row.try_get("prompt").map_err(ser)?,
            options: [
                row.try_get("option_a").map_err(ser)?,
                row.try_get("option_b").map_err(ser)?,
                row.try_get("option_c").map_err(ser)?,
                row.try_get("option_d").map_err(ser)?,
            ],
            answer: row.try_get("answer").map_err(ser)?,
        },
    ))
}

/// Correctness is stored as 0/1; anything else is treated as corrupt.
pub(crate) fn flag_from_i64(value: i64) -> Result<bool, StorageError> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(StorageError::Serialization(format!(
            "invalid is_correct: {other}"
        ))),
    }
}

pub(crate) fn map_response_row(row: &SqliteRow) -> Result<Response, StorageError> {
    Ok(Response {
        id: response_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        question_id: question_id_from_i64(row.try_get::<i64, _>("question_id").map_err(ser)?)?,
        user_id: user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?)?,
        is_correct: flag_from_i64(row.try_get::<i64, _>("is_correct").map_err(ser)?)?,
        chosen_answer: row.try_get("chosen_answer").map_err(ser)?,
        answered_at: row.try_get("answered_at").map_err(ser)?,
    })
}

pub(crate) fn map_rows<T>(
    rows: &[SqliteRow],
    f: impl Fn(&SqliteRow) -> Result<T, StorageError>,
) -> Result<Vec<T>, StorageError> {
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        out.push(f(row)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_accepts_only_zero_and_one() {
        assert!(!flag_from_i64(0).unwrap());
        assert!(flag_from_i64(1).unwrap());
        assert!(matches!(
            flag_from_i64(2),
            Err(StorageError::Serialization(_))
        ));
    }

    #[test]
    fn negative_ids_are_rejected() {
        assert!(user_id_from_i64(-1).is_err());
        assert_eq!(question_id_from_i64(5).unwrap(), QuestionId::new(5));
    }
}
