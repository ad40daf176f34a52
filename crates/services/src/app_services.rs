use std::sync::Arc;

use quiz_core::model::UserProfile;
use storage::repository::{Storage, StorageError, UserRepository};

use crate::Clock;
use crate::auth_service::AuthService;
use crate::error::InitError;
use crate::question_service::QuestionService;
use crate::quiz::QuizEngine;
use crate::report_service::ReportService;
use crate::user_service::UserService;

pub const SEED_ADMIN_NAME: &str = "Administrator";
pub const SEED_ADMIN_PHONE: &str = "1234567890";
pub const SEED_ADMIN_PASSWORD: &str = "123456";

/// Open (creating if needed) the `SQLite` store, apply migrations and seed the admin.
///
/// Safe to call on every launch.
///
/// # Errors
///
/// Returns `InitError::Sqlite` if the store cannot be opened or migrated.
/// Returns `InitError::Storage` if the admin check or seed fails.
pub async fn initialize_store(db_url: &str) -> Result<Storage, InitError> {
    let storage = Storage::sqlite(db_url).await?;
    ensure_admin(storage.users.as_ref()).await?;
    Ok(storage)
}

/// Insert the seed administrator unless an admin already exists.
///
/// Returns whether a row was inserted. Check and insert are separate
/// statements; only one process is expected to initialize a store.
///
/// If the seed phone already belongs to a regular user (the admin was deleted
/// and the phone re-registered), nothing is inserted and the store stays usable
/// without an admin.
///
/// # Errors
///
/// Returns `StorageError` if repository access fails.
pub async fn ensure_admin(users: &dyn UserRepository) -> Result<bool, StorageError> {
    if users.has_admin().await? {
        return Ok(false);
    }
    let profile = UserProfile::new(SEED_ADMIN_NAME, SEED_ADMIN_PHONE, SEED_ADMIN_PASSWORD, None);
    match users.insert_admin(&profile).await {
        Ok(admin) => {
            tracing::info!(user_id = %admin.id(), "seeded administrator");
            Ok(true)
        }
        Err(StorageError::DuplicateEntry(what)) => {
            tracing::warn!(%what, "seed administrator phone is taken, skipping seed");
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

/// Assembles app-facing services over one shared `Storage`.
#[derive(Clone)]
pub struct AppServices {
    storage: Storage,
    users: Arc<UserService>,
    questions: Arc<QuestionService>,
    quiz: Arc<QuizEngine>,
    reports: Arc<ReportService>,
    auth: Arc<AuthService>,
}

impl AppServices {
    #[must_use]
    pub fn new(storage: Storage, clock: Clock) -> Self {
        let users = Arc::new(UserService::new(Arc::clone(&storage.users)));
        let questions = Arc::new(QuestionService::new(Arc::clone(&storage.questions)));
        let quiz = Arc::new(QuizEngine::new(
            clock,
            Arc::clone(&storage.questions),
            Arc::clone(&storage.responses),
        ));
        let reports = Arc::new(ReportService::new(
            Arc::clone(&storage.users),
            Arc::clone(&storage.questions),
            Arc::clone(&storage.responses),
        ));
        let auth = Arc::new(AuthService::new(
            Arc::clone(&storage.users),
            Arc::clone(&storage.session_cache),
        ));

        Self {
            storage,
            users,
            questions,
            quiz,
            reports,
            auth,
        }
    }

    /// Build services backed by an initialized `SQLite` store.
    ///
    /// # Errors
    ///
    /// Returns `InitError` if the store cannot be opened, migrated or seeded.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, InitError> {
        let storage = initialize_store(db_url).await?;
        Ok(Self::new(storage, clock))
    }

    /// Services whose every operation fails with `StorageError::Unavailable`.
    #[must_use]
    pub fn degraded(reason: impl Into<String>, clock: Clock) -> Self {
        Self::new(Storage::unavailable(reason), clock)
    }

    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    #[must_use]
    pub fn users(&self) -> Arc<UserService> {
        Arc::clone(&self.users)
    }

    #[must_use]
    pub fn questions(&self) -> Arc<QuestionService> {
        Arc::clone(&self.questions)
    }

    #[must_use]
    pub fn quiz(&self) -> Arc<QuizEngine> {
        Arc::clone(&self.quiz)
    }

    #[must_use]
    pub fn reports(&self) -> Arc<ReportService> {
        Arc::clone(&self.reports)
    }

    #[must_use]
    pub fn auth(&self) -> Arc<AuthService> {
        Arc::clone(&self.auth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use quiz_core::model::Role;
    use quiz_core::time::fixed_clock;

    #[tokio::test]
    async fn admin_is_seeded_once() {
        let storage = Storage::in_memory();
        assert!(ensure_admin(storage.users.as_ref()).await.unwrap());
        assert!(!ensure_admin(storage.users.as_ref()).await.unwrap());

        let admin = storage
            .users
            .get_user_by_credentials(SEED_ADMIN_PHONE, SEED_ADMIN_PASSWORD)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(admin.role(), Role::Admin);
        assert_eq!(admin.name(), SEED_ADMIN_NAME);
        assert!(storage.users.list_regular_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn degraded_services_report_unavailable() {
        let services = AppServices::degraded("no disk", fixed_clock());
        let err = services.questions().list_questions().await.unwrap_err();
        assert!(matches!(
            err,
            crate::error::QuestionServiceError::Storage(StorageError::Unavailable(_))
        ));
    }
}
