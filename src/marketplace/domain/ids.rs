//! Identifier newtypes for marketplace entities.
//!
//! Each entity gets its own UUID wrapper so that a proposal identifier can
//! never be passed where a project identifier is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the wrapped UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl AsRef<Uuid> for $name {
            fn as_ref(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_identifier!(
    /// Unique identifier for a registered user.
    UserId
);

uuid_identifier!(
    /// Unique identifier for a posted project.
    ProjectId
);

uuid_identifier!(
    /// Unique identifier for a contractor proposal.
    ProposalId
);

uuid_identifier!(
    /// Unique identifier for a stored file version.
    AttachmentId
);

uuid_identifier!(
    /// Unique identifier for a project issue.
    IssueId
);

uuid_identifier!(
    /// Unique identifier for an issue comment.
    CommentId
);

uuid_identifier!(
    /// Unique identifier for a post-closure rating.
    RatingId
);
