//! Registered marketplace users.

use super::{MarketplaceDomainError, Role, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Validated, trimmed login name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    const MAX_LENGTH: usize = 64;

    /// Creates a validated username.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceDomainError::EmptyUsername`] for blank input or
    /// [`MarketplaceDomainError::UsernameTooLong`] past 64 characters.
    pub fn new(value: impl Into<String>) -> Result<Self, MarketplaceDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(MarketplaceDomainError::EmptyUsername);
        }
        if trimmed.chars().count() > Self::MAX_LENGTH {
            return Err(MarketplaceDomainError::UsernameTooLong {
                value: trimmed.to_owned(),
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the username as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque credential hash produced by the external password hasher.
///
/// The marketplace never inspects the value; `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialHash(String);

impl CredentialHash {
    /// Wraps a hash string.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceDomainError::EmptyCredentialHash`] for blank input.
    pub fn new(value: impl Into<String>) -> Result<Self, MarketplaceDomainError> {
        let raw = value.into();
        if raw.trim().is_empty() {
            return Err(MarketplaceDomainError::EmptyCredentialHash);
        }
        Ok(Self(raw))
    }

    /// Returns the stored hash.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CredentialHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CredentialHash(..)")
    }
}

/// Registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    username: Username,
    role: Role,
    credential_hash: CredentialHash,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedUserData {
    /// Persisted identifier.
    pub id: UserId,
    /// Persisted username.
    pub username: Username,
    /// Persisted role.
    pub role: Role,
    /// Persisted credential hash.
    pub credential_hash: CredentialHash,
    /// Persisted registration timestamp.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Registers a new account.
    #[must_use]
    pub fn register(
        username: Username,
        role: Role,
        credential_hash: CredentialHash,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: UserId::new(),
            username,
            role,
            credential_hash,
            created_at: clock.utc(),
        }
    }

    /// Reconstructs a user from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedUserData) -> Self {
        Self {
            id: data.id,
            username: data.username,
            role: data.role,
            credential_hash: data.credential_hash,
            created_at: data.created_at,
        }
    }

    /// Returns the user identifier.
    #[must_use]
    pub const fn id(&self) -> UserId {
        self.id
    }

    /// Returns the username.
    #[must_use]
    pub const fn username(&self) -> &Username {
        &self.username
    }

    /// Returns the account role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Returns the stored credential hash.
    #[must_use]
    pub const fn credential_hash(&self) -> &CredentialHash {
        &self.credential_hash
    }

    /// Returns the registration timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
