use quiz_core::model::{Role, User, UserId, UserProfile};

use super::SqliteRepository;
use super::mapping::{conn, id_i64, map_rows, map_user_row, user_id_from_i64, write_err};
use crate::repository::{StorageError, UserRepository};

impl SqliteRepository {
    async fn insert_user(&self, role: Role, profile: &UserProfile) -> Result<User, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO users (name, role, phone, password, image)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(&profile.name)
        .bind(role.as_str())
        .bind(&profile.phone)
        .bind(&profile.password)
        .bind(profile.image.as_deref())
        .execute(&self.pool)
        .await
        .map_err(|e| write_err(e, || format!("phone {}", profile.phone)))?;

        let id = user_id_from_i64(res.last_insert_rowid())?;
        tracing::debug!(user_id = %id, role = %role, "user inserted");

        // Second round trip: the insert and the re-select are not atomic.
        self.fetch_user(id).await?.ok_or(StorageError::NotFound)
    }

    async fn fetch_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, name, role, phone, password, image
            FROM users WHERE id = ?1
            ",
        )
        .bind(id_i64("user_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_user_row).transpose()
    }
}

#[async_trait::async_trait]
impl UserRepository for SqliteRepository {
    async fn create_user(&self, profile: &UserProfile) -> Result<User, StorageError> {
        self.insert_user(Role::Regular, profile).await
    }

    async fn insert_admin(&self, profile: &UserProfile) -> Result<User, StorageError> {
        self.insert_user(Role::Admin, profile).await
    }

    async fn has_admin(&self) -> Result<bool, StorageError> {
        let row = sqlx::query("SELECT 1 FROM users WHERE role = ?1 LIMIT 1")
            .bind(Role::Admin.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;
        Ok(row.is_some())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        self.fetch_user(id).await
    }

    async fn get_user_by_credentials(
        &self,
        phone: &str,
        password: &str,
    ) -> Result<Option<User>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, name, role, phone, password, image
            FROM users
            WHERE phone = ?1 AND password = ?2
            LIMIT 1
            ",
        )
        .bind(phone)
        .bind(password)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_user_row).transpose()
    }

    async fn list_regular_users(&self) -> Result<Vec<User>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, name, role, phone, password, image
            FROM users
            WHERE role = ?1
            ORDER BY id ASC
            ",
        )
        .bind(Role::Regular.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        map_rows(&rows, map_user_row)
    }

    async fn list_users_with_responses(&self) -> Result<Vec<User>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT u.id, u.name, u.role, u.phone, u.password, u.image
            FROM users u
            WHERE EXISTS (SELECT 1 FROM responses r WHERE r.user_id = u.id)
            ORDER BY u.id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        map_rows(&rows, map_user_row)
    }

    async fn update_user(
        &self,
        id: UserId,
        profile: &UserProfile,
    ) -> Result<Option<User>, StorageError> {
        let res = sqlx::query(
            r"
            UPDATE users
            SET name = ?1, phone = ?2, password = ?3, image = ?4
            WHERE id = ?5
            ",
        )
        .bind(&profile.name)
        .bind(&profile.phone)
        .bind(&profile.password)
        .bind(profile.image.as_deref())
        .bind(id_i64("user_id", id.value())?)
        .execute(&self.pool)
        .await
        .map_err(|e| write_err(e, || format!("phone {}", profile.phone)))?;

        if res.rows_affected() == 0 {
            tracing::debug!(user_id = %id, "update skipped: user not found");
            return Ok(None);
        }
        self.fetch_user(id).await
    }

    async fn delete_user(&self, id: UserId) -> Result<bool, StorageError> {
        let res = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id_i64("user_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(res.rows_affected() > 0)
    }
}
