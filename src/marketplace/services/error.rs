//! Routing-facing failure taxonomy for marketplace services.
//!
//! Every service returns [`MarketplaceError`]. The routing layer maps
//! [`MarketplaceError::kind`] to a status code and renders either
//! [`MarketplaceError::user_message`] or [`MarketplaceError::response_body`].

use crate::marketplace::{
    domain::{
        InvalidProjectTransition, LifecycleViolation, MarketplaceDomainError,
        ProposalAlreadyDecided, StoredName,
    },
    ports::{BlobStoreError, RepositoryError},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Result type for marketplace service operations.
pub type MarketplaceResult<T> = Result<T, MarketplaceError>;

/// Stable failure category exposed to the routing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No valid session identity.
    Unauthenticated,
    /// The actor lacks the role or ownership for the action.
    Forbidden,
    /// A referenced entity does not exist under its parent.
    NotFound,
    /// The entity's lifecycle state does not permit the action.
    InvalidState,
    /// The bid deadline has passed.
    DeadlinePassed,
    /// The bid deadline has not been reached.
    DeadlineNotReached,
    /// The rating window has elapsed.
    DeadlineExpired,
    /// A uniqueness invariant would be violated.
    AlreadyExists,
    /// The rater already rated this counterpart on this project.
    AlreadyRated,
    /// The rating target is not a counterpart on the project.
    InvalidTarget,
    /// Malformed input.
    ValidationError,
    /// Unexpected storage failure.
    StorageFailure,
}

impl ErrorKind {
    /// Returns the stable code used in response bodies.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::InvalidState => "invalid_state",
            Self::DeadlinePassed => "deadline_passed",
            Self::DeadlineNotReached => "deadline_not_reached",
            Self::DeadlineExpired => "deadline_expired",
            Self::AlreadyExists => "already_exists",
            Self::AlreadyRated => "already_rated",
            Self::InvalidTarget => "invalid_target",
            Self::ValidationError => "validation_error",
            Self::StorageFailure => "storage_failure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored content no longer matches the digest recorded at upload.
#[derive(Debug, Clone, Error)]
#[error("stored file {stored_name} failed its integrity check")]
pub struct ContentIntegrityError {
    /// Name of the corrupted blob.
    pub stored_name: StoredName,
}

/// Failure returned by marketplace services.
#[derive(Debug, Clone, Error)]
pub enum MarketplaceError {
    /// The session carries no usable identity.
    #[error("sign in to continue")]
    Unauthenticated,

    /// Username, password or role did not match a registered account.
    #[error("invalid username, password or role")]
    InvalidCredentials,

    /// The actor lacks the role or relationship the action requires.
    #[error("{0}")]
    Forbidden(String),

    /// The referenced entity does not exist.
    #[error("{entity} not found")]
    NotFound {
        /// Kind of entity looked up.
        entity: &'static str,
        /// Identifier that was not found.
        id: Uuid,
    },

    /// The action is not permitted in the current lifecycle state.
    #[error("{0}")]
    InvalidState(String),

    /// Proposals are no longer accepted.
    #[error("the bid deadline passed at {deadline}")]
    DeadlinePassed {
        /// Stored bid deadline.
        deadline: DateTime<Utc>,
    },

    /// Selection opens once bidding closes.
    #[error("a contractor can be selected from {deadline}")]
    DeadlineNotReached {
        /// Stored bid deadline.
        deadline: DateTime<Utc>,
    },

    /// Ratings are no longer accepted.
    #[error("the rating window closed at {closes_at}")]
    DeadlineExpired {
        /// End of the rating window.
        closes_at: DateTime<Utc>,
    },

    /// A uniqueness invariant would be violated.
    #[error("{0}")]
    AlreadyExists(String),

    /// The counterpart was already rated on this project.
    #[error("you have already rated this user for this project")]
    AlreadyRated,

    /// The rating target is not the actor's counterpart.
    #[error("{0}")]
    InvalidTarget(String),

    /// Input failed validation.
    #[error(transparent)]
    Validation(#[from] MarketplaceDomainError),

    /// Storage failed unexpectedly.
    #[error("storage failure: {0}")]
    StorageFailure(Arc<dyn std::error::Error + Send + Sync>),
}

impl MarketplaceError {
    /// Builds a [`MarketplaceError::NotFound`] for `entity`.
    #[must_use]
    pub const fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }

    /// Wraps an unexpected storage error.
    #[must_use]
    pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::StorageFailure(Arc::new(err))
    }

    /// Returns the stable failure category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthenticated | Self::InvalidCredentials => ErrorKind::Unauthenticated,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::DeadlinePassed { .. } => ErrorKind::DeadlinePassed,
            Self::DeadlineNotReached { .. } => ErrorKind::DeadlineNotReached,
            Self::DeadlineExpired { .. } => ErrorKind::DeadlineExpired,
            Self::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Self::AlreadyRated => ErrorKind::AlreadyRated,
            Self::InvalidTarget(_) => ErrorKind::InvalidTarget,
            Self::Validation(_) => ErrorKind::ValidationError,
            Self::StorageFailure(_) => ErrorKind::StorageFailure,
        }
    }

    /// Returns a message safe to show to the user. Storage failures never
    /// leak their cause.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::StorageFailure(_) => "internal error".to_owned(),
            other => other.to_string(),
        }
    }

    /// Returns the JSON failure body rendered by API routes.
    #[must_use]
    pub fn response_body(&self) -> serde_json::Value {
        serde_json::json!({
            "success": false,
            "kind": self.kind(),
            "detail": self.user_message(),
        })
    }
}

impl From<LifecycleViolation> for MarketplaceError {
    fn from(violation: LifecycleViolation) -> Self {
        match violation {
            LifecycleViolation::WrongRole { .. } | LifecycleViolation::NotAParty { .. } => {
                Self::Forbidden(violation.to_string())
            }
            LifecycleViolation::StatusNotPermitted { .. } => {
                Self::InvalidState(violation.to_string())
            }
            LifecycleViolation::DeadlinePassed { deadline } => Self::DeadlinePassed { deadline },
            LifecycleViolation::DeadlineNotReached { deadline } => {
                Self::DeadlineNotReached { deadline }
            }
            LifecycleViolation::RatingWindowClosed { closes_at } => {
                Self::DeadlineExpired { closes_at }
            }
        }
    }
}

impl From<RepositoryError> for MarketplaceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepositoryError::StaleProject { .. }
            | RepositoryError::StaleProposal { .. }
            | RepositoryError::IssueResolved(_) => Self::InvalidState(err.to_string()),
            RepositoryError::AttachmentVersionConflict { .. }
            | RepositoryError::DuplicateAcceptedProposal(_)
            | RepositoryError::DuplicateUsername(_) => Self::AlreadyExists(err.to_string()),
            RepositoryError::DuplicateRating { .. } => Self::AlreadyRated,
            RepositoryError::Persistence(source) => Self::StorageFailure(source),
        }
    }
}

impl From<BlobStoreError> for MarketplaceError {
    fn from(err: BlobStoreError) -> Self {
        Self::storage(err)
    }
}

impl From<InvalidProjectTransition> for MarketplaceError {
    fn from(err: InvalidProjectTransition) -> Self {
        Self::InvalidState(err.to_string())
    }
}

impl From<ProposalAlreadyDecided> for MarketplaceError {
    fn from(err: ProposalAlreadyDecided) -> Self {
        Self::InvalidState(err.to_string())
    }
}

impl From<ContentIntegrityError> for MarketplaceError {
    fn from(err: ContentIntegrityError) -> Self {
        Self::storage(err)
    }
}
