use std::sync::Arc;

use serde::{Deserialize, Serialize};

use quiz_core::model::{Role, User, UserId, UserProfile};
use storage::repository::{SessionCacheRepository, UserRepository};

use crate::error::AuthError;
use crate::user_service::UserService;

/// Session cache key holding the signed-in identity.
pub const SESSION_KEY: &str = "user";

/// The identity kept in the session cache. Never carries the password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedInUser {
    pub id: UserId,
    pub name: String,
    pub role: Role,
    pub phone: String,
    pub image: Option<String>,
}

impl SignedInUser {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl From<&User> for SignedInUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id(),
            name: user.name().to_owned(),
            role: user.role(),
            phone: user.phone().to_owned(),
            image: user.image().map(str::to_owned),
        }
    }
}

/// Sign-in, sign-out and profile refresh over the session cache.
#[derive(Clone)]
pub struct AuthService {
    users: UserService,
    cache: Arc<dyn SessionCacheRepository>,
}

impl AuthService {
    #[must_use]
    pub fn new(users: Arc<dyn UserRepository>, cache: Arc<dyn SessionCacheRepository>) -> Self {
        Self {
            users: UserService::new(users),
            cache,
        }
    }

    /// Check credentials and remember the user on success.
    ///
    /// Returns `Ok(None)` when no user matches; the cache is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if lookup or cache writes fail.
    pub async fn login(
        &self,
        phone: &str,
        password: &str,
    ) -> Result<Option<SignedInUser>, AuthError> {
        let Some(user) = self.users.get_user_by_credentials(phone, password).await? else {
            tracing::debug!("sign-in rejected");
            return Ok(None);
        };
        let signed_in = SignedInUser::from(&user);
        self.remember(&signed_in).await?;
        tracing::info!(user_id = %signed_in.id, role = %signed_in.role, "signed in");
        Ok(Some(signed_in))
    }

    /// The remembered identity, if any.
    ///
    /// An entry that cannot be decoded is treated as signed out.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the cache cannot be read.
    pub async fn restore(&self) -> Result<Option<SignedInUser>, AuthError> {
        let Some(raw) = self.cache.get_value(SESSION_KEY).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(err) => {
                tracing::warn!(error = %err, "ignoring unreadable session entry");
                Ok(None)
            }
        }
    }

    /// Forget the signed-in identity. Returns whether one was remembered.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the cache cannot be written.
    pub async fn logout(&self) -> Result<bool, AuthError> {
        Ok(self.cache.remove_value(SESSION_KEY).await?)
    }

    /// Overwrite the user's profile and refresh the remembered identity.
    ///
    /// Returns `Ok(None)` when no user has this ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::DuplicatePhone` if another user owns the new phone.
    /// Returns `AuthError` if persistence fails.
    pub async fn update_profile(
        &self,
        id: UserId,
        profile: UserProfile,
    ) -> Result<Option<SignedInUser>, AuthError> {
        let Some(user) = self.users.update_user(id, profile).await? else {
            return Ok(None);
        };
        let signed_in = SignedInUser::from(&user);
        self.remember(&signed_in).await?;
        Ok(Some(signed_in))
    }

    async fn remember(&self, user: &SignedInUser) -> Result<(), AuthError> {
        let raw = serde_json::to_string(user)?;
        self.cache.put_value(SESSION_KEY, &raw).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use storage::repository::InMemoryRepository;

    async fn setup() -> (Arc<InMemoryRepository>, AuthService, User) {
        let repo = Arc::new(InMemoryRepository::new());
        let user = repo
            .create_user(&UserProfile::new("Ana", "555", "pw", Some("ana.png".into())))
            .await
            .unwrap();
        let auth = AuthService::new(repo.clone(), repo.clone());
        (repo, auth, user)
    }

    #[tokio::test]
    async fn login_persists_identity_without_password() {
        let (repo, auth, user) = setup().await;

        let signed_in = auth.login("555", "pw").await.unwrap().unwrap();
        assert_eq!(signed_in.id, user.id());
        assert_eq!(signed_in.role, Role::Regular);

        let raw = repo.get_value(SESSION_KEY).await.unwrap().unwrap();
        assert!(!raw.contains("pw"));
        assert_eq!(auth.restore().await.unwrap(), Some(signed_in));
    }

    #[tokio::test]
    async fn wrong_password_leaves_cache_empty() {
        let (_repo, auth, _user) = setup().await;
        assert!(auth.login("555", "nope").await.unwrap().is_none());
        assert!(auth.restore().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn logout_clears_identity() {
        let (_repo, auth, _user) = setup().await;
        auth.login("555", "pw").await.unwrap();
        assert!(auth.logout().await.unwrap());
        assert!(auth.restore().await.unwrap().is_none());
        assert!(!auth.logout().await.unwrap());
    }

    #[tokio::test]
    async fn unreadable_entry_is_signed_out() {
        let (repo, auth, _user) = setup().await;
        repo.put_value(SESSION_KEY, "{not json").await.unwrap();
        assert!(auth.restore().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn profile_update_refreshes_cache() {
        let (_repo, auth, user) = setup().await;
        auth.login("555", "pw").await.unwrap();

        let updated = auth
            .update_profile(user.id(), UserProfile::new("Anna", "556", "pw2", None))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Anna");

        let restored = auth.restore().await.unwrap().unwrap();
        assert_eq!(restored.phone, "556");
        assert_eq!(restored.image, None);
    }
}
