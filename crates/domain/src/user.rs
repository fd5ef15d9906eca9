use common::EntityId;
use serde::{Deserialize, Serialize};
use storage::Version;

use crate::error::{DomainError, required_name};

/// What a user is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum UserRole {
    /// Manages projects, states and users.
    Admin,
    /// Works on tasks.
    #[default]
    Mate,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "Admin",
            UserRole::Mate => "Mate",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A tracker user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    id: EntityId,
    #[serde(default)]
    version: Version,
    username: String,
    role: UserRole,
}

impl_entity!(User, "users");

impl User {
    pub fn new(username: &str, role: UserRole) -> Result<Self, DomainError> {
        Ok(Self {
            id: EntityId::new(),
            version: Version::initial(),
            username: required_name("username", username)?,
            role,
        })
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn role(&self) -> UserRole {
        self.role
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}
