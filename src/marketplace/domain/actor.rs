//! Roles and the authenticated actor performing an action.

use super::{ParseEnumError, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Account role. Fixed at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Posts projects and accepts deliverables.
    Client,
    /// Bids on projects and delivers work.
    Contractor,
}

impl Role {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Contractor => "contractor",
        }
    }

    /// Returns the role on the other side of a project.
    #[must_use]
    pub const fn counterpart(self) -> Self {
        match self {
            Self::Client => Self::Contractor,
            Self::Contractor => Self::Client,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Role {
    type Error = ParseEnumError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "client" => Ok(Self::Client),
            "contractor" => Ok(Self::Contractor),
            _ => Err(ParseEnumError::new("role", value)),
        }
    }
}

/// Authenticated identity passed explicitly into every marketplace operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    user_id: UserId,
    role: Role,
}

impl Actor {
    /// Creates an actor from a resolved identity.
    #[must_use]
    pub const fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Returns the acting user's identifier.
    #[must_use]
    pub const fn user_id(self) -> UserId {
        self.user_id
    }

    /// Returns the acting user's role.
    #[must_use]
    pub const fn role(self) -> Role {
        self.role
    }

    /// Returns `true` when the actor holds the client role.
    #[must_use]
    pub const fn is_client(self) -> bool {
        matches!(self.role, Role::Client)
    }

    /// Returns `true` when the actor holds the contractor role.
    #[must_use]
    pub const fn is_contractor(self) -> bool {
        matches!(self.role, Role::Contractor)
    }
}
