use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::UserId;

//
// ─── ROLE ──────────────────────────────────────────────────────────────────────
//

/// Access level of an account, resolved once at sign-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Manages users and questions.
    Admin,
    /// Answers questions and reviews their own report.
    Regular,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Regular => "regular",
        }
    }

    #[must_use]
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid role: {0}")]
pub struct ParseRoleError(String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "regular" => Ok(Role::Regular),
            other => Err(ParseRoleError(other.to_owned())),
        }
    }
}

//
// ─── PROFILE ───────────────────────────────────────────────────────────────────
//

/// Mutable fields of a user account.
///
/// Used for both registration and profile edits; an edit overwrites every
/// field, including clearing the image when `image` is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub name: String,
    pub phone: String,
    pub password: String,
    pub image: Option<String>,
}

impl UserProfile {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        phone: impl Into<String>,
        password: impl Into<String>,
        image: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            password: password.into(),
            image,
        }
    }
}

//
// ─── USER ──────────────────────────────────────────────────────────────────────
//

/// A stored account.
///
/// The password is an opaque string compared verbatim at sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    name: String,
    role: Role,
    phone: String,
    password: String,
    image: Option<String>,
}

impl User {
    /// Rehydrate a user from storage.
    #[must_use]
    pub fn from_persisted(id: UserId, role: Role, profile: UserProfile) -> Self {
        Self {
            id,
            name: profile.name,
            role,
            phone: profile.phone,
            password: profile.password,
            image: profile.image,
        }
    }

    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn phone(&self) -> &str {
        &self.phone
    }

    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    #[must_use]
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    /// Exact, case-sensitive credential comparison.
    #[must_use]
    pub fn matches_credentials(&self, phone: &str, password: &str) -> bool {
        self.phone == phone && self.password == password
    }

    /// Returns the mutable fields as a profile.
    #[must_use]
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            name: self.name.clone(),
            phone: self.phone.clone(),
            password: self.password.clone(),
            image: self.image.clone(),
        }
    }
}
