//! Domain model for the project marketplace.
//!
//! Aggregates (projects, proposals, attachments, issues, ratings) carry their
//! own invariants, and the [`LifecycleEngine`] holds the single transition
//! table that gates every role-sensitive action. Nothing here performs I/O.

mod actor;
mod attachment;
mod error;
mod ids;
mod issue;
mod lifecycle;
mod project;
mod proposal;
mod rating;
mod user;

pub use actor::{Actor, Role};
pub use attachment::{
    Attachment, AttachmentData, AttachmentKind, ContentDigest, FileVersion, StoredName,
    UploadPolicy, UploadedFile, VersionPartition,
};
pub use error::{MarketplaceDomainError, ParseEnumError};
pub use ids::{AttachmentId, CommentId, IssueId, ProjectId, ProposalId, RatingId, UserId};
pub use issue::{Issue, IssueComment, IssueStatus, PersistedCommentData, PersistedIssueData};
pub use lifecycle::{
    ActionRule, Decision, DeadlineRule, LifecycleEngine, LifecycleViolation, Party,
    ProjectAction, UploadRoute,
};
pub use project::{
    Amount, InvalidProjectTransition, PersistedProjectData, Project, ProjectDetails,
    ProjectStatus, ProjectTitle,
};
pub use proposal::{
    PersistedProposalData, Proposal, ProposalAlreadyDecided, ProposalStatus, ProposalTerms,
};
pub use rating::{
    PersistedRatingData, Rating, RatingParties, RatingScores, RatingSummary, Score,
};
pub use user::{CredentialHash, PersistedUserData, User, Username};
