//! Repository ports for marketplace persistence.
//!
//! Every method that applies a lifecycle decision is conditional on the
//! status the decision was evaluated against. Implementations must perform
//! all writes of one call atomically and report a status mismatch as
//! [`RepositoryError::StaleProject`] without writing anything.

use crate::marketplace::domain::{
    Attachment, AttachmentId, FileVersion, Issue, IssueComment, IssueId, Project, ProjectId,
    ProjectStatus, Proposal, ProposalId, ProposalStatus, Rating, Role, User, UserId, Username,
    VersionPartition,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Result type for marketplace repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Account persistence.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Stores a newly registered user.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::DuplicateUsername`] when the username is
    /// taken.
    async fn store_user(&self, user: &User) -> RepositoryResult<()>;

    /// Finds a user by identifier.
    async fn find_user(&self, id: UserId) -> RepositoryResult<Option<User>>;

    /// Finds a user by username.
    async fn find_user_by_username(&self, username: &Username) -> RepositoryResult<Option<User>>;
}

/// Project persistence.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Stores a newly posted project.
    async fn store_project(&self, project: &Project) -> RepositoryResult<()>;

    /// Finds a project by identifier.
    async fn find_project(&self, id: ProjectId) -> RepositoryResult<Option<Project>>;

    /// Replaces a project's row if its stored status still equals `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] for an unknown project or
    /// [`RepositoryError::StaleProject`] on a status mismatch.
    async fn update_project(&self, project: &Project, expected: ProjectStatus)
    -> RepositoryResult<()>;

    /// Deletes a project together with its proposals, attachment rows,
    /// issues, comments and ratings. Stored blobs are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] for an unknown project or
    /// [`RepositoryError::StaleProject`] on a status mismatch.
    async fn delete_project(&self, id: ProjectId, expected: ProjectStatus) -> RepositoryResult<()>;

    /// Returns projects owned by `client_id`, newest first.
    async fn list_projects_for_client(&self, client_id: UserId) -> RepositoryResult<Vec<Project>>;

    /// Returns `open` projects whose bid deadline is unset or after `now`,
    /// newest first.
    async fn list_projects_open_for_bidding(
        &self,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Vec<Project>>;

    /// Closes a project and resolves every open issue on it in one
    /// transaction. Issues are stamped with the project's `closed_at`.
    /// Returns the number of issues resolved.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::StaleProject`] on a status mismatch.
    async fn finalize_project(
        &self,
        project: &Project,
        expected: ProjectStatus,
    ) -> RepositoryResult<usize>;
}

/// Writes that select a contractor for a project.
#[derive(Debug, Clone, Copy)]
pub struct ContractorSelection<'a> {
    /// Project in its post-selection state.
    pub project: &'a Project,
    /// Status the selection was evaluated against.
    pub expected: ProjectStatus,
    /// Accepted proposal in its post-selection state.
    pub accepted: &'a Proposal,
}

/// Proposal persistence.
#[async_trait]
pub trait ProposalRepository: Send + Sync {
    /// Stores a new proposal if the project is still in `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::StaleProject`] on a status mismatch.
    async fn store_proposal(
        &self,
        proposal: &Proposal,
        expected: ProjectStatus,
    ) -> RepositoryResult<()>;

    /// Finds a proposal by identifier.
    async fn find_proposal(&self, id: ProposalId) -> RepositoryResult<Option<Proposal>>;

    /// Returns proposals on a project, oldest first.
    async fn list_proposals_for_project(
        &self,
        project_id: ProjectId,
    ) -> RepositoryResult<Vec<Proposal>>;

    /// Returns proposals submitted by a contractor, newest first.
    async fn list_proposals_for_contractor(
        &self,
        contractor_id: UserId,
    ) -> RepositoryResult<Vec<Proposal>>;

    /// Returns `true` when the contractor has a pending proposal on the
    /// project.
    async fn has_pending_proposal(
        &self,
        project_id: ProjectId,
        contractor_id: UserId,
    ) -> RepositoryResult<bool>;

    /// Replaces a proposal's row if its stored status still equals
    /// `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::StaleProposal`] on a status mismatch.
    async fn update_proposal(
        &self,
        proposal: &Proposal,
        expected: ProposalStatus,
    ) -> RepositoryResult<()>;

    /// Applies a selection atomically: updates the project, accepts the
    /// chosen proposal, and rejects every other pending proposal on the
    /// project. Returns the number of proposals rejected.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::StaleProject`],
    /// [`RepositoryError::StaleProposal`] or
    /// [`RepositoryError::DuplicateAcceptedProposal`] when a concurrent
    /// decision won.
    async fn record_selection(&self, selection: ContractorSelection<'_>) -> RepositoryResult<usize>;
}

/// Writes committed together with an attachment row.
#[derive(Debug, Clone, Copy)]
pub enum UploadCompanion<'a> {
    /// The attachment row alone.
    None,
    /// A project status change triggered by the upload.
    ProjectTransition {
        /// Project in its post-upload state.
        project: &'a Project,
        /// Status the upload was evaluated against.
        expected: ProjectStatus,
    },
    /// A proposal that references the uploaded document.
    Proposal {
        /// New proposal.
        proposal: &'a Proposal,
        /// Project status the submission was evaluated against.
        expected: ProjectStatus,
    },
}

/// Versioned file metadata persistence.
#[async_trait]
pub trait AttachmentRepository: Send + Sync {
    /// Returns the highest version recorded in a partition.
    async fn latest_attachment_version(
        &self,
        partition: VersionPartition,
    ) -> RepositoryResult<Option<FileVersion>>;

    /// Inserts an attachment row and its companion writes atomically.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::AttachmentVersionConflict`] when the
    /// version is already taken in its partition, or
    /// [`RepositoryError::StaleProject`] when the companion's expected
    /// status no longer holds.
    async fn record_upload(
        &self,
        attachment: &Attachment,
        companion: UploadCompanion<'_>,
    ) -> RepositoryResult<()>;

    /// Finds an attachment by identifier.
    async fn find_attachment(&self, id: AttachmentId) -> RepositoryResult<Option<Attachment>>;

    /// Returns every attachment on a project ordered by upload time, then
    /// version.
    async fn list_attachments_for_project(
        &self,
        project_id: ProjectId,
    ) -> RepositoryResult<Vec<Attachment>>;

    /// Returns every version in a partition in ascending order.
    async fn list_attachment_versions(
        &self,
        partition: VersionPartition,
    ) -> RepositoryResult<Vec<Attachment>>;
}

/// Issue and comment persistence.
#[async_trait]
pub trait IssueRepository: Send + Sync {
    /// Stores a new issue with an optional opening comment.
    async fn store_issue(
        &self,
        issue: &Issue,
        opening_comment: Option<&IssueComment>,
    ) -> RepositoryResult<()>;

    /// Finds an issue by identifier.
    async fn find_issue(&self, id: IssueId) -> RepositoryResult<Option<Issue>>;

    /// Persists a resolution.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] for an unknown issue.
    async fn update_issue(&self, issue: &Issue) -> RepositoryResult<()>;

    /// Returns issues on a project, oldest first.
    async fn list_issues_for_project(&self, project_id: ProjectId) -> RepositoryResult<Vec<Issue>>;

    /// Stores a comment if its issue is still open.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::IssueResolved`] when the issue was resolved
    /// concurrently.
    async fn store_comment(&self, comment: &IssueComment) -> RepositoryResult<()>;

    /// Returns comments on an issue ordered by creation time ascending.
    async fn list_comments(&self, issue_id: IssueId) -> RepositoryResult<Vec<IssueComment>>;

    /// Resolves every open issue on a project, stamping `resolved_at`.
    /// Returns the number of issues resolved.
    async fn resolve_open_issues(
        &self,
        project_id: ProjectId,
        resolved_at: DateTime<Utc>,
    ) -> RepositoryResult<usize>;
}

/// Rating persistence.
#[async_trait]
pub trait RatingRepository: Send + Sync {
    /// Stores a rating.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::DuplicateRating`] when the
    /// `(project, rater, target)` triple already has a rating.
    async fn store_rating(&self, rating: &Rating) -> RepositoryResult<()>;

    /// Finds the rating for a `(project, rater, target)` triple.
    async fn find_rating(
        &self,
        project_id: ProjectId,
        rater_id: UserId,
        target_id: UserId,
    ) -> RepositoryResult<Option<Rating>>;

    /// Returns ratings received by `target_id` in `target_role`, oldest first.
    async fn list_ratings_for_target(
        &self,
        target_id: UserId,
        target_role: Role,
    ) -> RepositoryResult<Vec<Rating>>;
}

/// Every repository port, as implemented by each adapter.
pub trait MarketplaceRepository:
    UserRepository
    + ProjectRepository
    + ProposalRepository
    + AttachmentRepository
    + IssueRepository
    + RatingRepository
{
}

impl<T> MarketplaceRepository for T where
    T: UserRepository
        + ProjectRepository
        + ProposalRepository
        + AttachmentRepository
        + IssueRepository
        + RatingRepository
{
}

/// Errors returned by repository implementations.
#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    /// The referenced row does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity looked up.
        entity: &'static str,
        /// Identifier that was not found.
        id: Uuid,
    },

    /// The project's stored status no longer matches the expected one.
    #[error("project {project_id} is no longer {expected}")]
    StaleProject {
        /// Project whose write was refused.
        project_id: ProjectId,
        /// Status the write was conditional on.
        expected: ProjectStatus,
    },

    /// The proposal's stored status no longer matches the expected one.
    #[error("proposal {proposal_id} is no longer {expected}")]
    StaleProposal {
        /// Proposal whose write was refused.
        proposal_id: ProposalId,
        /// Status the write was conditional on.
        expected: ProposalStatus,
    },

    /// The issue was resolved before a comment could be stored.
    #[error("issue {0} is resolved")]
    IssueResolved(IssueId),

    /// The file version is already taken in its partition.
    #[error("version {version} already exists for project {project_id}")]
    AttachmentVersionConflict {
        /// Project of the contested partition.
        project_id: ProjectId,
        /// Contested version.
        version: FileVersion,
    },

    /// The `(project, rater, target)` triple already has a rating.
    #[error("user {rater_id} already rated user {target_id} on project {project_id}")]
    DuplicateRating {
        /// Rated project.
        project_id: ProjectId,
        /// Rater.
        rater_id: UserId,
        /// Rated user.
        target_id: UserId,
    },

    /// The project already has an accepted proposal.
    #[error("project {0} already has an accepted proposal")]
    DuplicateAcceptedProposal(ProjectId),

    /// The username is already registered.
    #[error("username already registered: {0}")]
    DuplicateUsername(String),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl RepositoryError {
    /// Wraps a persistence error.
    #[must_use]
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Builds a [`RepositoryError::NotFound`] for `entity`.
    #[must_use]
    pub const fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }
}
