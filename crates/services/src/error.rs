//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{QuestionId, UserId};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `UserService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UserServiceError {
    #[error("a user with phone {0} already exists")]
    DuplicatePhone(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `QuestionService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuestionServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the quiz engine and quiz sessions.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error("question {question_id} was already answered by user {user_id}")]
    AlreadyAnswered {
        question_id: QuestionId,
        user_id: UserId,
    },
    #[error("no option selected")]
    NoSelection,
    #[error("quiz already completed")]
    Completed,
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ReportService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReportError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `AuthService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    #[error("a user with phone {0} already exists")]
    DuplicatePhone(String),
    #[error("session cache encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<UserServiceError> for AuthError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::DuplicatePhone(phone) => AuthError::DuplicatePhone(phone),
            UserServiceError::Storage(e) => AuthError::Storage(e),
        }
    }
}

/// Errors emitted while opening and seeding the store.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InitError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
