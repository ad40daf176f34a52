use std::sync::Arc;

use quiz_core::model::{User, UserId, UserProfile};
use storage::repository::{StorageError, UserRepository};

use crate::error::UserServiceError;

/// Account management for admins and profile edits for users.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
}

fn duplicate_phone(err: StorageError, phone: &str) -> UserServiceError {
    match err {
        StorageError::DuplicateEntry(_) => UserServiceError::DuplicatePhone(phone.to_owned()),
        other => UserServiceError::Storage(other),
    }
}

impl UserService {
    #[must_use]
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Register a regular user.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::DuplicatePhone` if the phone is taken.
    /// Returns `UserServiceError::Storage` if persistence fails.
    pub async fn create_user(&self, profile: UserProfile) -> Result<User, UserServiceError> {
        let user = self
            .users
            .create_user(&profile)
            .await
            .map_err(|e| duplicate_phone(e, &profile.phone))?;
        tracing::info!(user_id = %user.id(), "user registered");
        Ok(user)
    }

    /// Exact credential lookup. `Ok(None)` means no match.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::Storage` if repository access fails.
    pub async fn get_user_by_credentials(
        &self,
        phone: &str,
        password: &str,
    ) -> Result<Option<User>, UserServiceError> {
        Ok(self.users.get_user_by_credentials(phone, password).await?)
    }

    /// # Errors
    ///
    /// Returns `UserServiceError::Storage` if repository access fails.
    pub async fn get_user(&self, id: UserId) -> Result<Option<User>, UserServiceError> {
        Ok(self.users.get_user(id).await?)
    }

    /// # Errors
    ///
    /// Returns `UserServiceError::Storage` if repository access fails.
    pub async fn list_regular_users(&self) -> Result<Vec<User>, UserServiceError> {
        Ok(self.users.list_regular_users().await?)
    }

    /// Overwrite a user's profile.
    ///
    /// Returns `Ok(None)` when no user has this ID; nothing is written.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::DuplicatePhone` if another user owns the new phone.
    /// Returns `UserServiceError::Storage` if persistence fails.
    pub async fn update_user(
        &self,
        id: UserId,
        profile: UserProfile,
    ) -> Result<Option<User>, UserServiceError> {
        self.users
            .update_user(id, &profile)
            .await
            .map_err(|e| duplicate_phone(e, &profile.phone))
    }

    /// Delete a user. Their responses stay in the store.
    ///
    /// Returns whether a user was removed.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::Storage` if persistence fails.
    pub async fn delete_user(&self, id: UserId) -> Result<bool, UserServiceError> {
        let removed = self.users.delete_user(id).await?;
        if removed {
            tracing::info!(user_id = %id, "user deleted");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use storage::repository::InMemoryRepository;

    fn service() -> UserService {
        UserService::new(Arc::new(InMemoryRepository::new()))
    }

    #[tokio::test]
    async fn second_user_with_same_phone_fails() {
        let service = service();
        service
            .create_user(UserProfile::new("Ana", "555", "a", None))
            .await
            .unwrap();

        let err = service
            .create_user(UserProfile::new("Ben", "555", "b", None))
            .await
            .unwrap_err();
        assert!(matches!(err, UserServiceError::DuplicatePhone(ref p) if p == "555"));
    }

    #[tokio::test]
    async fn update_overwrites_every_field() {
        let service = service();
        let user = service
            .create_user(UserProfile::new("Ana", "555", "a", Some("ana.png".into())))
            .await
            .unwrap();

        let updated = service
            .update_user(user.id(), UserProfile::new("Anna", "556", "b", None))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.name(), "Anna");
        assert_eq!(updated.phone(), "556");
        assert_eq!(updated.image(), None);
        assert!(
            service
                .get_user_by_credentials("556", "b")
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn absent_ids_are_silent_no_ops() {
        let service = service();
        let missing = service
            .update_user(UserId::new(99), UserProfile::new("X", "1", "x", None))
            .await
            .unwrap();
        assert!(missing.is_none());
        assert!(!service.delete_user(UserId::new(99)).await.unwrap());
    }
}
