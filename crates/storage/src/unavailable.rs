//! Backend used when the store could not be opened.
//!
//! Every operation fails with `StorageError::Unavailable`, so the process can
//! keep running in a degraded state and surface the failure per call.

use std::sync::Arc;

use async_trait::async_trait;
use quiz_core::model::{
    NewResponse, Question, QuestionDraft, QuestionId, Response, User, UserId, UserProfile,
};

use crate::repository::{
    QuestionRepository, ResponseRepository, SessionCacheRepository, Storage, StorageError,
    UserRepository,
};

#[derive(Clone)]
pub struct UnavailableRepository {
    reason: Arc<str>,
}

impl UnavailableRepository {
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: Arc::from(reason.into()),
        }
    }

    fn fail<T>(&self) -> Result<T, StorageError> {
        Err(StorageError::Unavailable(self.reason.to_string()))
    }
}

#[async_trait]
impl UserRepository for UnavailableRepository {
    async fn create_user(&self, _profile: &UserProfile) -> Result<User, StorageError> {
        self.fail()
    }

    async fn insert_admin(&self, _profile: &UserProfile) -> Result<User, StorageError> {
        self.fail()
    }

    async fn has_admin(&self) -> Result<bool, StorageError> {
        self.fail()
    }

    async fn get_user(&self, _id: UserId) -> Result<Option<User>, StorageError> {
        self.fail()
    }

    async fn get_user_by_credentials(
        &self,
        _phone: &str,
        _password: &str,
    ) -> Result<Option<User>, StorageError> {
        self.fail()
    }

    async fn list_regular_users(&self) -> Result<Vec<User>, StorageError> {
        self.fail()
    }

    async fn list_users_with_responses(&self) -> Result<Vec<User>, StorageError> {
        self.fail()
    }

    async fn update_user(
        &self,
        _id: UserId,
        _profile: &UserProfile,
    ) -> Result<Option<User>, StorageError> {
        self.fail()
    }

    async fn delete_user(&self, _id: UserId) -> Result<bool, StorageError> {
        self.fail()
    }
}

#[async_trait]
impl QuestionRepository for UnavailableRepository {
    async fn create_question(&self, _draft: &QuestionDraft) -> Result<Question, StorageError> {
        self.fail()
    }

    async fn get_question(&self, _id: QuestionId) -> Result<Option<Question>, StorageError> {
        self.fail()
    }

    async fn update_question(
        &self,
        _id: QuestionId,
        _draft: &QuestionDraft,
    ) -> Result<Option<Question>, StorageError> {
        self.fail()
    }

    async fn delete_question(&self, _id: QuestionId) -> Result<bool, StorageError> {
        self.fail()
    }

    async fn list_questions(&self) -> Result<Vec<Question>, StorageError> {
        self.fail()
    }

    async fn list_unanswered(&self, _user_id: UserId) -> Result<Vec<Question>, StorageError> {
        self.fail()
    }

    async fn count_questions(&self) -> Result<u64, StorageError> {
        self.fail()
    }

    async fn clear_questions(&self) -> Result<u64, StorageError> {
        self.fail()
    }
}

#[async_trait]
impl ResponseRepository for UnavailableRepository {
    async fn append_response(&self, _response: NewResponse) -> Result<Response, StorageError> {
        self.fail()
    }

    async fn has_response(
        &self,
        _question_id: QuestionId,
        _user_id: UserId,
    ) -> Result<bool, StorageError> {
        self.fail()
    }

    async fn responses_for_user(&self, _user_id: UserId) -> Result<Vec<Response>, StorageError> {
        self.fail()
    }

    async fn count_answered_questions(&self, _user_id: UserId) -> Result<u64, StorageError> {
        self.fail()
    }

    async fn clear_responses(&self) -> Result<u64, StorageError> {
        self.fail()
    }
}

#[async_trait]
impl SessionCacheRepository for UnavailableRepository {
    async fn get_value(&self, _key: &str) -> Result<Option<String>, StorageError> {
        self.fail()
    }

    async fn put_value(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        self.fail()
    }

    async fn remove_value(&self, _key: &str) -> Result<bool, StorageError> {
        self.fail()
    }
}

impl Storage {
    /// A `Storage` whose every operation reports the store as unavailable.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::from_backend(UnavailableRepository::new(reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_repository_reports_unavailable() {
        let storage = Storage::unavailable("disk gone");

        let err = storage.users.has_admin().await.unwrap_err();
        assert!(matches!(err, StorageError::Unavailable(ref r) if r == "disk gone"));
        assert!(storage.questions.list_questions().await.is_err());
        assert!(
            storage
                .responses
                .count_answered_questions(UserId::new(1))
                .await
                .is_err()
        );
        assert!(storage.session_cache.get_value("user").await.is_err());
    }
}
