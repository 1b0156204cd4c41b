//! # Actor Context
//!
//! The identity and role of whoever requests a mutation. It is passed
//! explicitly into every mutating operation; nothing reads a current user
//! from ambient state.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::{AuthError, AuthResult};

/// Governance roles, in increasing order of privilege
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// May propose structures and theorems
    Novice,
    /// May also vote
    Citizen,
    /// May also moderate, override statuses and delete
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Novice => "novice",
            Role::Citizen => "citizen",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "novice" => Ok(Role::Novice),
            "citizen" => Ok(Role::Citizen),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// Who is asking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorContext {
    pub user_id: String,
    pub role: Role,
}

impl ActorContext {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    pub fn novice(user_id: impl Into<String>) -> Self {
        Self::new(user_id, Role::Novice)
    }

    pub fn citizen(user_id: impl Into<String>) -> Self {
        Self::new(user_id, Role::Citizen)
    }

    pub fn admin(user_id: impl Into<String>) -> Self {
        Self::new(user_id, Role::Admin)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Require at least `role`
    pub fn require_role(&self, role: Role) -> AuthResult<()> {
        if self.user_id.trim().is_empty() {
            return Err(AuthError::AuthenticationRequired);
        }
        if self.role < role {
            return Err(AuthError::Unauthorized);
        }
        Ok(())
    }

    /// Require admin
    pub fn require_admin(&self) -> AuthResult<()> {
        self.require_role(Role::Admin)
    }

    /// Require that the actor is `author_id` or an admin
    pub fn require_author_or_admin(&self, author_id: &str) -> AuthResult<()> {
        self.require_role(Role::Novice)?;
        if self.is_admin() || self.user_id == author_id {
            Ok(())
        } else {
            Err(AuthError::Unauthorized)
        }
    }

    /// Require that the actor is acting on their own behalf
    pub fn require_self(&self, user_id: &str) -> AuthResult<()> {
        if self.user_id != user_id {
            return Err(AuthError::Unauthorized);
        }
        Ok(())
    }
}
