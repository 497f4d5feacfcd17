//! Diesel row models and their conversions to marketplace aggregates.

use super::schema::{attachments, issue_comments, issues, projects, proposals, ratings, users};
use crate::marketplace::{
    domain::{
        Amount, Attachment, AttachmentData, AttachmentId, AttachmentKind, CommentId,
        ContentDigest, CredentialHash, FileVersion, Issue, IssueComment, IssueId, IssueStatus,
        PersistedCommentData, PersistedIssueData, PersistedProjectData, PersistedProposalData,
        PersistedRatingData, PersistedUserData, Project, ProjectId, ProjectStatus, ProjectTitle,
        Proposal, ProposalId, ProposalStatus, Rating, RatingId, RatingParties, RatingScores, Role,
        StoredName, User, UserId, Username,
    },
    ports::{RepositoryError, RepositoryResult},
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

/// Stored account row.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    /// Account identifier.
    pub id: Uuid,
    /// Login name.
    pub username: String,
    /// Account role.
    pub role: String,
    /// Credential hash.
    pub credential_hash: String,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    /// Builds a row from the aggregate.
    #[must_use]
    pub fn from_domain(user: &User) -> Self {
        Self {
            id: user.id().into_inner(),
            username: user.username().as_str().to_owned(),
            role: user.role().as_str().to_owned(),
            credential_hash: user.credential_hash().as_str().to_owned(),
            created_at: user.created_at(),
        }
    }

    /// Reconstructs the aggregate.
    pub fn into_domain(self) -> RepositoryResult<User> {
        Ok(User::from_persisted(PersistedUserData {
            id: UserId::from_uuid(self.id),
            username: Username::new(self.username).map_err(RepositoryError::persistence)?,
            role: parse_role(&self.role)?,
            credential_hash: CredentialHash::new(self.credential_hash)
                .map_err(RepositoryError::persistence)?,
            created_at: self.created_at,
        }))
    }
}

/// Stored project row.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = projects)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProjectRow {
    /// Project identifier.
    pub id: Uuid,
    /// Owning client.
    pub client_id: Uuid,
    /// Selected contractor.
    pub contractor_id: Option<Uuid>,
    /// Accepted proposal.
    pub accepted_proposal_id: Option<Uuid>,
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Budget.
    pub budget: i64,
    /// Lifecycle status.
    pub status: String,
    /// Proposal deadline.
    pub bid_deadline: Option<DateTime<Utc>>,
    /// Closure timestamp.
    pub closed_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Mutable project columns.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = projects)]
#[diesel(treat_none_as_null = true)]
pub struct ProjectChangeset {
    /// Selected contractor.
    pub contractor_id: Option<Uuid>,
    /// Accepted proposal.
    pub accepted_proposal_id: Option<Uuid>,
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Budget.
    pub budget: i64,
    /// Lifecycle status.
    pub status: String,
    /// Proposal deadline.
    pub bid_deadline: Option<DateTime<Utc>>,
    /// Closure timestamp.
    pub closed_at: Option<DateTime<Utc>>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl ProjectRow {
    /// Builds a row from the aggregate.
    #[must_use]
    pub fn from_domain(project: &Project) -> Self {
        Self {
            id: project.id().into_inner(),
            client_id: project.client_id().into_inner(),
            contractor_id: project.contractor_id().map(UserId::into_inner),
            accepted_proposal_id: project.accepted_proposal_id().map(ProposalId::into_inner),
            title: project.title().as_str().to_owned(),
            description: project.description().to_owned(),
            budget: project.budget().value(),
            status: project.status().as_str().to_owned(),
            bid_deadline: project.bid_deadline(),
            closed_at: project.closed_at(),
            created_at: project.created_at(),
            updated_at: project.updated_at(),
        }
    }

    /// Reconstructs the aggregate.
    pub fn into_domain(self) -> RepositoryResult<Project> {
        Ok(Project::from_persisted(PersistedProjectData {
            id: ProjectId::from_uuid(self.id),
            client_id: UserId::from_uuid(self.client_id),
            contractor_id: self.contractor_id.map(UserId::from_uuid),
            accepted_proposal_id: self.accepted_proposal_id.map(ProposalId::from_uuid),
            title: ProjectTitle::new(self.title).map_err(RepositoryError::persistence)?,
            description: self.description,
            budget: Amount::new(self.budget).map_err(RepositoryError::persistence)?,
            status: ProjectStatus::try_from(self.status.as_str())
                .map_err(RepositoryError::persistence)?,
            bid_deadline: self.bid_deadline,
            closed_at: self.closed_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }))
    }
}

impl ProjectChangeset {
    /// Captures the mutable columns of the aggregate.
    #[must_use]
    pub fn from_domain(project: &Project) -> Self {
        let ProjectRow {
            contractor_id,
            accepted_proposal_id,
            title,
            description,
            budget,
            status,
            bid_deadline,
            closed_at,
            updated_at,
            ..
        } = ProjectRow::from_domain(project);
        Self {
            contractor_id,
            accepted_proposal_id,
            title,
            description,
            budget,
            status,
            bid_deadline,
            closed_at,
            updated_at,
        }
    }
}

/// Stored proposal row.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = proposals)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProposalRow {
    /// Proposal identifier.
    pub id: Uuid,
    /// Target project.
    pub project_id: Uuid,
    /// Submitting contractor.
    pub contractor_id: Uuid,
    /// Cover message.
    pub message: String,
    /// Quoted price.
    pub price: i64,
    /// Stored document name.
    pub document: Option<String>,
    /// Decision state.
    pub status: String,
    /// Submission timestamp.
    pub created_at: DateTime<Utc>,
    /// Last decision timestamp.
    pub updated_at: DateTime<Utc>,
}

impl ProposalRow {
    /// Builds a row from the aggregate.
    #[must_use]
    pub fn from_domain(proposal: &Proposal) -> Self {
        Self {
            id: proposal.id().into_inner(),
            project_id: proposal.project_id().into_inner(),
            contractor_id: proposal.contractor_id().into_inner(),
            message: proposal.message().to_owned(),
            price: proposal.price().value(),
            document: proposal.document().map(|name| name.as_str().to_owned()),
            status: proposal.status().as_str().to_owned(),
            created_at: proposal.created_at(),
            updated_at: proposal.updated_at(),
        }
    }

    /// Reconstructs the aggregate.
    pub fn into_domain(self) -> RepositoryResult<Proposal> {
        Ok(Proposal::from_persisted(PersistedProposalData {
            id: ProposalId::from_uuid(self.id),
            project_id: ProjectId::from_uuid(self.project_id),
            contractor_id: UserId::from_uuid(self.contractor_id),
            message: self.message,
            price: Amount::new(self.price).map_err(RepositoryError::persistence)?,
            document: self
                .document
                .map(StoredName::parse)
                .transpose()
                .map_err(RepositoryError::persistence)?,
            status: parse_proposal_status(&self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }))
    }
}

/// Stored attachment row.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = attachments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AttachmentRow {
    /// Attachment identifier.
    pub id: Uuid,
    /// Owning project.
    pub project_id: Uuid,
    /// Uploading user.
    pub uploader_id: Uuid,
    /// Uploading user's role.
    pub uploader_role: String,
    /// Partition kind.
    pub kind: String,
    /// Version within the partition.
    pub version: i32,
    /// Client-supplied name.
    pub original_name: String,
    /// Name under the upload root.
    pub stored_name: String,
    /// SHA-256 hex digest.
    pub digest: String,
    /// Stored size in bytes.
    pub size_bytes: i64,
    /// Upload timestamp.
    pub uploaded_at: DateTime<Utc>,
}

impl AttachmentRow {
    /// Builds a row from the aggregate.
    pub fn from_domain(attachment: &Attachment) -> RepositoryResult<Self> {
        Ok(Self {
            id: attachment.id().into_inner(),
            project_id: attachment.project_id().into_inner(),
            uploader_id: attachment.uploader_id().into_inner(),
            uploader_role: attachment.uploader_role().as_str().to_owned(),
            kind: attachment.kind().as_str().to_owned(),
            version: version_column(attachment.version())?,
            original_name: attachment.original_name().to_owned(),
            stored_name: attachment.stored_name().as_str().to_owned(),
            digest: attachment.digest().as_str().to_owned(),
            size_bytes: i64::try_from(attachment.size_bytes())
                .map_err(RepositoryError::persistence)?,
            uploaded_at: attachment.uploaded_at(),
        })
    }

    /// Reconstructs the aggregate.
    pub fn into_domain(self) -> RepositoryResult<Attachment> {
        Ok(Attachment::new(AttachmentData {
            id: AttachmentId::from_uuid(self.id),
            project_id: ProjectId::from_uuid(self.project_id),
            uploader_id: UserId::from_uuid(self.uploader_id),
            uploader_role: parse_role(&self.uploader_role)?,
            kind: parse_kind(&self.kind)?,
            version: FileVersion::new(i64::from(self.version))
                .map_err(RepositoryError::persistence)?,
            original_name: self.original_name,
            stored_name: StoredName::parse(self.stored_name)
                .map_err(RepositoryError::persistence)?,
            digest: ContentDigest::parse(self.digest).map_err(RepositoryError::persistence)?,
            size_bytes: u64::try_from(self.size_bytes).map_err(RepositoryError::persistence)?,
            uploaded_at: self.uploaded_at,
        }))
    }
}

/// Stored issue row.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = issues)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct IssueRow {
    /// Issue identifier.
    pub id: Uuid,
    /// Owning project.
    pub project_id: Uuid,
    /// Opener.
    pub opener_id: Uuid,
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Resolution state.
    pub status: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Resolution timestamp.
    pub resolved_at: Option<DateTime<Utc>>,
}

impl IssueRow {
    /// Builds a row from the aggregate.
    #[must_use]
    pub fn from_domain(issue: &Issue) -> Self {
        Self {
            id: issue.id().into_inner(),
            project_id: issue.project_id().into_inner(),
            opener_id: issue.opener_id().into_inner(),
            title: issue.title().to_owned(),
            description: issue.description().to_owned(),
            status: issue.status().as_str().to_owned(),
            created_at: issue.created_at(),
            resolved_at: issue.resolved_at(),
        }
    }

    /// Reconstructs the aggregate.
    pub fn into_domain(self) -> RepositoryResult<Issue> {
        Ok(Issue::from_persisted(PersistedIssueData {
            id: IssueId::from_uuid(self.id),
            project_id: ProjectId::from_uuid(self.project_id),
            opener_id: UserId::from_uuid(self.opener_id),
            title: self.title,
            description: self.description,
            status: IssueStatus::try_from(self.status.as_str())
                .map_err(RepositoryError::persistence)?,
            created_at: self.created_at,
            resolved_at: self.resolved_at,
        }))
    }
}

/// Stored comment row.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = issue_comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CommentRow {
    /// Comment identifier.
    pub id: Uuid,
    /// Parent issue.
    pub issue_id: Uuid,
    /// Author.
    pub author_id: Uuid,
    /// Body.
    pub content: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl CommentRow {
    /// Builds a row from the aggregate.
    #[must_use]
    pub fn from_domain(comment: &IssueComment) -> Self {
        Self {
            id: comment.id().into_inner(),
            issue_id: comment.issue_id().into_inner(),
            author_id: comment.author_id().into_inner(),
            content: comment.content().to_owned(),
            created_at: comment.created_at(),
        }
    }

    /// Reconstructs the aggregate.
    #[must_use]
    pub fn into_domain(self) -> IssueComment {
        IssueComment::from_persisted(PersistedCommentData {
            id: CommentId::from_uuid(self.id),
            issue_id: IssueId::from_uuid(self.issue_id),
            author_id: UserId::from_uuid(self.author_id),
            content: self.content,
            created_at: self.created_at,
        })
    }
}

/// Stored rating row.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = ratings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RatingRow {
    /// Rating identifier.
    pub id: Uuid,
    /// Rated project.
    pub project_id: Uuid,
    /// Rater.
    pub rater_id: Uuid,
    /// Rater's role.
    pub rater_role: String,
    /// Rated user.
    pub target_id: Uuid,
    /// Rated user's role.
    pub target_role: String,
    /// Quality score.
    pub quality: i16,
    /// Communication score.
    pub communication: i16,
    /// Timeliness score.
    pub timeliness: i16,
    /// Optional comment.
    pub comment: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl RatingRow {
    /// Builds a row from the aggregate.
    #[must_use]
    pub fn from_domain(rating: &Rating) -> Self {
        let scores = rating.scores();
        Self {
            id: rating.id().into_inner(),
            project_id: rating.project_id().into_inner(),
            rater_id: rating.rater_id().into_inner(),
            rater_role: rating.rater_role().as_str().to_owned(),
            target_id: rating.target_id().into_inner(),
            target_role: rating.target_role().as_str().to_owned(),
            quality: i16::from(scores.quality.value()),
            communication: i16::from(scores.communication.value()),
            timeliness: i16::from(scores.timeliness.value()),
            comment: rating.comment().map(str::to_owned),
            created_at: rating.created_at(),
        }
    }

    /// Reconstructs the aggregate.
    pub fn into_domain(self) -> RepositoryResult<Rating> {
        Ok(Rating::from_persisted(PersistedRatingData {
            id: RatingId::from_uuid(self.id),
            parties: RatingParties {
                project_id: ProjectId::from_uuid(self.project_id),
                rater_id: UserId::from_uuid(self.rater_id),
                rater_role: parse_role(&self.rater_role)?,
                target_id: UserId::from_uuid(self.target_id),
                target_role: parse_role(&self.target_role)?,
            },
            scores: RatingScores::new(
                i64::from(self.quality),
                i64::from(self.communication),
                i64::from(self.timeliness),
            )
            .map_err(RepositoryError::persistence)?,
            comment: self.comment,
            created_at: self.created_at,
        }))
    }
}

/// Converts a version to its column value.
fn version_column(version: FileVersion) -> RepositoryResult<i32> {
    i32::try_from(version.value()).map_err(RepositoryError::persistence)
}

fn parse_role(value: &str) -> RepositoryResult<Role> {
    Role::try_from(value).map_err(RepositoryError::persistence)
}

fn parse_kind(value: &str) -> RepositoryResult<AttachmentKind> {
    AttachmentKind::try_from(value).map_err(RepositoryError::persistence)
}

fn parse_proposal_status(value: &str) -> RepositoryResult<ProposalStatus> {
    ProposalStatus::try_from(value).map_err(RepositoryError::persistence)
}
