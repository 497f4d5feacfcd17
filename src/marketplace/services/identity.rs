//! Account registration, login and session claims.

use super::{MarketplaceError, MarketplaceResult};
use crate::marketplace::{
    domain::{Actor, CredentialHash, Role, User, UserId, Username},
    ports::{CredentialVerifier, ROLE_KEY, SessionStore, USER_ID_KEY, UserRepository},
};
use mockable::Clock;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Request payload for registering an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterUserRequest {
    /// Requested login name.
    pub username: String,
    /// Fixed account role.
    pub role: Role,
    /// Hash produced by the external password hasher.
    pub credential_hash: String,
}

impl RegisterUserRequest {
    /// Creates a registration request.
    #[must_use]
    pub fn new(username: impl Into<String>, role: Role, credential_hash: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            role,
            credential_hash: credential_hash.into(),
        }
    }
}

/// Derives the typed actor from the per-request session.
///
/// # Errors
///
/// Returns [`MarketplaceError::Unauthenticated`] when either key is missing
/// or malformed.
pub fn actor_from_session(session: &impl SessionStore) -> MarketplaceResult<Actor> {
    let user_id = session
        .get(USER_ID_KEY)
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .map(UserId::from_uuid)
        .ok_or(MarketplaceError::Unauthenticated)?;
    let role = session
        .get(ROLE_KEY)
        .and_then(|raw| Role::try_from(raw).ok())
        .ok_or(MarketplaceError::Unauthenticated)?;
    Ok(Actor::new(user_id, role))
}

/// Logs the session out by clearing every key.
pub fn logout(session: &mut impl SessionStore) {
    session.clear();
}

/// Registers accounts and binds them to sessions.
#[derive(Clone)]
pub struct IdentityService<R, V, C>
where
    R: UserRepository,
    V: CredentialVerifier,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    verifier: Arc<V>,
    clock: Arc<C>,
}

impl<R, V, C> IdentityService<R, V, C>
where
    R: UserRepository,
    V: CredentialVerifier,
    C: Clock + Send + Sync,
{
    /// Creates a new identity service.
    #[must_use]
    pub const fn new(repository: Arc<R>, verifier: Arc<V>, clock: Arc<C>) -> Self {
        Self {
            repository,
            verifier,
            clock,
        }
    }

    /// Registers a new account.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Validation`] for a malformed username or
    /// hash and [`MarketplaceError::AlreadyExists`] for a taken username.
    #[instrument(skip_all, fields(username = %request.username, role = %request.role))]
    pub async fn register(&self, request: RegisterUserRequest) -> MarketplaceResult<User> {
        let username = Username::new(request.username)?;
        let credential_hash = CredentialHash::new(request.credential_hash)?;
        let user = User::register(username, request.role, credential_hash, &*self.clock);
        self.repository.store_user(&user).await?;
        info!(user_id = %user.id(), "user registered");
        Ok(user)
    }

    /// Checks a username, password and role against the stored account.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::InvalidCredentials`] for an unknown
    /// username, a wrong password or a role that differs from the account's.
    #[instrument(skip(self, password), fields(username = %username, role = %role))]
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
        role: Role,
    ) -> MarketplaceResult<User> {
        let Ok(name) = Username::new(username) else {
            return Err(MarketplaceError::InvalidCredentials);
        };
        let user = self
            .repository
            .find_user_by_username(&name)
            .await?
            .ok_or(MarketplaceError::InvalidCredentials)?;
        if user.role() != role || !self.verifier.verify(password, user.credential_hash()) {
            warn!("authentication refused");
            return Err(MarketplaceError::InvalidCredentials);
        }
        Ok(user)
    }

    /// Authenticates and writes the identity into `session`.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Self::authenticate`]; the session is left
    /// untouched on failure.
    pub async fn login(
        &self,
        session: &mut impl SessionStore,
        username: &str,
        password: &str,
        role: Role,
    ) -> MarketplaceResult<Actor> {
        let user = self.authenticate(username, password, role).await?;
        session.clear();
        session.insert(USER_ID_KEY, user.id().to_string());
        session.insert(ROLE_KEY, user.role().as_str().to_owned());
        info!(user_id = %user.id(), role = %user.role(), "user logged in");
        Ok(Actor::new(user.id(), user.role()))
    }

    /// Returns the account behind `actor`.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Unauthenticated`] when the account no
    /// longer exists or its role differs from the session's.
    pub async fn current_user(&self, actor: Actor) -> MarketplaceResult<User> {
        self.repository
            .find_user(actor.user_id())
            .await?
            .filter(|user| user.role() == actor.role())
            .ok_or(MarketplaceError::Unauthenticated)
    }
}
