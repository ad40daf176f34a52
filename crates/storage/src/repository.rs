use async_trait::async_trait;
use quiz_core::model::{
    NewResponse, Question, QuestionDraft, QuestionId, Response, ResponseId, Role, User, UserId,
    UserProfile,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a regular user and return the stored row.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::DuplicateEntry` if the phone is already taken.
    async fn create_user(&self, profile: &UserProfile) -> Result<User, StorageError>;

    /// Insert an administrator. Only used when seeding the store.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::DuplicateEntry` if the phone is already taken.
    async fn insert_admin(&self, profile: &UserProfile) -> Result<User, StorageError>;

    /// Whether at least one administrator exists.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be queried.
    async fn has_admin(&self) -> Result<bool, StorageError>;

    /// Fetch a user by ID. Absence is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be queried.
    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError>;

    /// Exact phone + password match.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be queried.
    async fn get_user_by_credentials(
        &self,
        phone: &str,
        password: &str,
    ) -> Result<Option<User>, StorageError>;

    /// All regular users ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be queried.
    async fn list_regular_users(&self) -> Result<Vec<User>, StorageError>;

    /// Users with at least one recorded response, ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be queried.
    async fn list_users_with_responses(&self) -> Result<Vec<User>, StorageError>;

    /// Overwrite every mutable field. Returns `None` when the ID is absent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::DuplicateEntry` if the new phone belongs to another user.
    async fn update_user(
        &self,
        id: UserId,
        profile: &UserProfile,
    ) -> Result<Option<User>, StorageError>;

    /// Delete a user, leaving their responses in place. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be written.
    async fn delete_user(&self, id: UserId) -> Result<bool, StorageError>;
}

/// Repository contract for questions.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Insert a question and return the stored row.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the question cannot be stored.
    async fn create_question(&self, draft: &QuestionDraft) -> Result<Question, StorageError>;

    /// Fetch a question by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be queried.
    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, StorageError>;

    /// Overwrite text, options and answer. Returns `None` when the ID is absent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be written.
    async fn update_question(
        &self,
        id: QuestionId,
        draft: &QuestionDraft,
    ) -> Result<Option<Question>, StorageError>;

    /// Delete a question, orphaning its responses. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be written.
    async fn delete_question(&self, id: QuestionId) -> Result<bool, StorageError>;

    /// All questions in creation (ascending ID) order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be queried.
    async fn list_questions(&self) -> Result<Vec<Question>, StorageError>;

    /// Questions without a response from `user_id`, in listing order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be queried.
    async fn list_unanswered(&self, user_id: UserId) -> Result<Vec<Question>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be queried.
    async fn count_questions(&self) -> Result<u64, StorageError>;

    /// Delete every question. Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be written.
    async fn clear_questions(&self) -> Result<u64, StorageError>;
}

/// Repository contract for answer events.
#[async_trait]
pub trait ResponseRepository: Send + Sync {
    /// Append a response.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::DuplicateEntry` if the user already answered the question.
    async fn append_response(&self, response: NewResponse) -> Result<Response, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be queried.
    async fn has_response(
        &self,
        question_id: QuestionId,
        user_id: UserId,
    ) -> Result<bool, StorageError>;

    /// Responses recorded by a user, ordered by ID. Includes orphans.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be queried.
    async fn responses_for_user(&self, user_id: UserId) -> Result<Vec<Response>, StorageError>;

    /// Distinct existing questions answered by a user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be queried.
    async fn count_answered_questions(&self, user_id: UserId) -> Result<u64, StorageError>;

    /// Delete every response. Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be written.
    async fn clear_responses(&self) -> Result<u64, StorageError>;
}

/// Small key/value store backing the signed-in session cache.
#[async_trait]
pub trait SessionCacheRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be queried.
    async fn get_value(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Insert or replace a value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be written.
    async fn put_value(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Returns whether a value was removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be written.
    async fn remove_value(&self, key: &str) -> Result<bool, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// Mirrors the `SQLite` backend: phone numbers and (question, user) response
/// pairs are unique and IDs are never reused.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    users: Arc<Mutex<BTreeMap<UserId, User>>>,
    questions: Arc<Mutex<BTreeMap<QuestionId, Question>>>,
    responses: Arc<Mutex<BTreeMap<ResponseId, Response>>>,
    session_cache: Arc<Mutex<HashMap<String, String>>>,
    next_user: Arc<AtomicU64>,
    next_question: Arc<AtomicU64>,
    next_response: Arc<AtomicU64>,
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn next_id(seq: &AtomicU64) -> u64 {
    seq.fetch_add(1, Ordering::Relaxed) + 1
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn insert_user(&self, role: Role, profile: &UserProfile) -> Result<User, StorageError> {
        let mut guard = self.users.lock().map_err(poisoned)?;
        if guard.values().any(|u| u.phone() == profile.phone) {
            return Err(StorageError::DuplicateEntry(format!(
                "phone {}",
                profile.phone
            )));
        }
        let id = UserId::new(next_id(&self.next_user));
        let user = User::from_persisted(id, role, profile.clone());
        guard.insert(id, user.clone());
        Ok(user)
    }

    fn answered_question_ids(&self, user_id: UserId) -> Result<BTreeSet<QuestionId>, StorageError> {
        let guard = self.responses.lock().map_err(poisoned)?;
        Ok(guard
            .values()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.question_id)
            .collect())
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn create_user(&self, profile: &UserProfile) -> Result<User, StorageError> {
        self.insert_user(Role::Regular, profile)
    }

    async fn insert_admin(&self, profile: &UserProfile) -> Result<User, StorageError> {
        self.insert_user(Role::Admin, profile)
    }

    async fn has_admin(&self) -> Result<bool, StorageError> {
        let guard = self.users.lock().map_err(poisoned)?;
        Ok(guard.values().any(|u| u.role().is_admin()))
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        let guard = self.users.lock().map_err(poisoned)?;
        Ok(guard.get(&id).cloned())
    }

    async fn get_user_by_credentials(
        &self,
        phone: &str,
        password: &str,
    ) -> Result<Option<User>, StorageError> {
        let guard = self.users.lock().map_err(poisoned)?;
        Ok(guard
            .values()
            .find(|u| u.matches_credentials(phone, password))
            .cloned())
    }

    async fn list_regular_users(&self) -> Result<Vec<User>, StorageError> {
        let guard = self.users.lock().map_err(poisoned)?;
        Ok(guard
            .values()
            .filter(|u| u.role() == Role::Regular)
            .cloned()
            .collect())
    }

    async fn list_users_with_responses(&self) -> Result<Vec<User>, StorageError> {
        let responders: BTreeSet<UserId> = {
            let guard = self.responses.lock().map_err(poisoned)?;
            guard.values().map(|r| r.user_id).collect()
        };
        let guard = self.users.lock().map_err(poisoned)?;
        Ok(guard
            .values()
            .filter(|u| responders.contains(&u.id()))
            .cloned()
            .collect())
    }

    async fn update_user(
        &self,
        id: UserId,
        profile: &UserProfile,
    ) -> Result<Option<User>, StorageError> {
        let mut guard = self.users.lock().map_err(poisoned)?;
        let Some(role) = guard.get(&id).map(User::role) else {
            return Ok(None);
        };
        if guard
            .values()
            .any(|u| u.id() != id && u.phone() == profile.phone)
        {
            return Err(StorageError::DuplicateEntry(format!(
                "phone {}",
                profile.phone
            )));
        }
        let updated = User::from_persisted(id, role, profile.clone());
        guard.insert(id, updated.clone());
        Ok(Some(updated))
    }

    async fn delete_user(&self, id: UserId) -> Result<bool, StorageError> {
        let mut guard = self.users.lock().map_err(poisoned)?;
        Ok(guard.remove(&id).is_some())
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn create_question(&self, draft: &QuestionDraft) -> Result<Question, StorageError> {
        let mut guard = self.questions.lock().map_err(poisoned)?;
        let id = QuestionId::new(next_id(&self.next_question));
        let question = Question::from_persisted(id, draft.clone());
        guard.insert(id, question.clone());
        Ok(question)
    }

    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, StorageError> {
        let guard = self.questions.lock().map_err(poisoned)?;
        Ok(guard.get(&id).cloned())
    }

    async fn update_question(
        &self,
        id: QuestionId,
        draft: &QuestionDraft,
    ) -> Result<Option<Question>, StorageError> {
        let mut guard = self.questions.lock().map_err(poisoned)?;
        match guard.get_mut(&id) {
            Some(slot) => {
                *slot = Question::from_persisted(id, draft.clone());
                Ok(Some(slot.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_question(&self, id: QuestionId) -> Result<bool, StorageError> {
        let mut guard = self.questions.lock().map_err(poisoned)?;
        Ok(guard.remove(&id).is_some())
    }

    async fn list_questions(&self) -> Result<Vec<Question>, StorageError> {
        let guard = self.questions.lock().map_err(poisoned)?;
        Ok(guard.values().cloned().collect())
    }

    async fn list_unanswered(&self, user_id: UserId) -> Result<Vec<Question>, StorageError> {
        let answered = self.answered_question_ids(user_id)?;
        let guard = self.questions.lock().map_err(poisoned)?;
        Ok(guard
            .values()
            .filter(|q| !answered.contains(&q.id()))
            .cloned()
            .collect())
    }

    async fn count_questions(&self) -> Result<u64, StorageError> {
        let guard = self.questions.lock().map_err(poisoned)?;
        Ok(guard.len() as u64)
    }

    async fn clear_questions(&self) -> Result<u64, StorageError> {
        let mut guard = self.questions.lock().map_err(poisoned)?;
        let removed = guard.len() as u64;
        guard.clear();
        Ok(removed)
    }
}

#[async_trait]
impl ResponseRepository for InMemoryRepository {
    async fn append_response(&self, response: NewResponse) -> Result<Response, StorageError> {
        let mut guard = self.responses.lock().map_err(poisoned)?;
        if guard
            .values()
            .any(|r| r.question_id == response.question_id && r.user_id == response.user_id)
        {
            return Err(StorageError::DuplicateEntry(format!(
                "response for question {} by user {}",
                response.question_id, response.user_id
            )));
        }
        let id = ResponseId::new(next_id(&self.next_response));
        let stored = Response::from_new(id, response);
        guard.insert(id, stored.clone());
        Ok(stored)
    }

    async fn has_response(
        &self,
        question_id: QuestionId,
        user_id: UserId,
    ) -> Result<bool, StorageError> {
        let guard = self.responses.lock().map_err(poisoned)?;
        Ok(guard
            .values()
            .any(|r| r.question_id == question_id && r.user_id == user_id))
    }

    async fn responses_for_user(&self, user_id: UserId) -> Result<Vec<Response>, StorageError> {
        let guard = self.responses.lock().map_err(poisoned)?;
        Ok(guard
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn count_answered_questions(&self, user_id: UserId) -> Result<u64, StorageError> {
        let answered = self.answered_question_ids(user_id)?;
        let guard = self.questions.lock().map_err(poisoned)?;
        Ok(answered.iter().filter(|id| guard.contains_key(id)).count() as u64)
    }

    async fn clear_responses(&self) -> Result<u64, StorageError> {
        let mut guard = self.responses.lock().map_err(poisoned)?;
        let removed = guard.len() as u64;
        guard.clear();
        Ok(removed)
    }
}

#[async_trait]
impl SessionCacheRepository for InMemoryRepository {
    async fn get_value(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self.session_cache.lock().map_err(poisoned)?;
        Ok(guard.get(key).cloned())
    }

    async fn put_value(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self.session_cache.lock().map_err(poisoned)?;
        guard.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove_value(&self, key: &str) -> Result<bool, StorageError> {
        let mut guard = self.session_cache.lock().map_err(poisoned)?;
        Ok(guard.remove(key).is_some())
    }
}

/// The store context shared by every service.
///
/// Built once at startup and cloned into services; all repositories of one
/// `Storage` share the same backend.
#[derive(Clone)]
pub struct Storage {
    pub users: Arc<dyn UserRepository>,
    pub questions: Arc<dyn QuestionRepository>,
    pub responses: Arc<dyn ResponseRepository>,
    pub session_cache: Arc<dyn SessionCacheRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_backend(InMemoryRepository::new())
    }

    /// Wrap a single backend that implements every repository trait.
    #[must_use]
    pub fn from_backend<R>(repo: R) -> Self
    where
        R: UserRepository
            + QuestionRepository
            + ResponseRepository
            + SessionCacheRepository
            + Clone
            + 'static,
    {
        let users: Arc<dyn UserRepository> = Arc::new(repo.clone());
        let questions: Arc<dyn QuestionRepository> = Arc::new(repo.clone());
        let responses: Arc<dyn ResponseRepository> = Arc::new(repo.clone());
        let session_cache: Arc<dyn SessionCacheRepository> = Arc::new(repo);
        Self {
            users,
            questions,
            responses,
            session_cache,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::time::fixed_now;

    fn profile(phone: &str) -> UserProfile {
        UserProfile::new("Sam", phone, "pw", None)
    }

    fn draft(text: &str, answer: &str) -> QuestionDraft {
        QuestionDraft::new(text, ["A", "B", "C", "D"], answer)
    }

    #[tokio::test]
    async fn duplicate_phone_is_rejected() {
        let repo = InMemoryRepository::new();
        repo.create_user(&profile("111")).await.unwrap();

        let err = repo.create_user(&profile("111")).await.unwrap_err();
        assert!(matches!(err, StorageError::DuplicateEntry(_)));
        assert_eq!(repo.list_regular_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_rejects_phone_owned_by_someone_else() {
        let repo = InMemoryRepository::new();
        let a = repo.create_user(&profile("111")).await.unwrap();
        repo.create_user(&profile("222")).await.unwrap();

        let err = repo.update_user(a.id(), &profile("222")).await.unwrap_err();
        assert!(matches!(err, StorageError::DuplicateEntry(_)));

        // keeping your own phone is fine
        let same = repo.update_user(a.id(), &profile("111")).await.unwrap();
        assert!(same.is_some());
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let repo = InMemoryRepository::new();
        let first = repo.create_question(&draft("Q1", "A")).await.unwrap();
        assert!(repo.delete_question(first.id()).await.unwrap());

        let second = repo.create_question(&draft("Q2", "A")).await.unwrap();
        assert!(second.id() > first.id());
    }

    #[tokio::test]
    async fn answered_count_ignores_orphans() {
        let repo = InMemoryRepository::new();
        let user = UserId::new(1);
        let q1 = repo.create_question(&draft("Q1", "A")).await.unwrap();
        let q2 = repo.create_question(&draft("Q2", "B")).await.unwrap();

        for q in [q1.id(), q2.id()] {
            repo.append_response(NewResponse::flag_only(q, user, true, fixed_now()))
                .await
                .unwrap();
        }
        repo.delete_question(q2.id()).await.unwrap();

        assert_eq!(repo.count_answered_questions(user).await.unwrap(), 1);
        assert_eq!(repo.responses_for_user(user).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn session_cache_round_trips() {
        let repo = InMemoryRepository::new();
        assert_eq!(repo.get_value("user").await.unwrap(), None);

        repo.put_value("user", "{}").await.unwrap();
        repo.put_value("user", "{\"id\":1}").await.unwrap();
        assert_eq!(
            repo.get_value("user").await.unwrap().as_deref(),
            Some("{\"id\":1}")
        );

        assert!(repo.remove_value("user").await.unwrap());
        assert!(!repo.remove_value("user").await.unwrap());
    }
}
