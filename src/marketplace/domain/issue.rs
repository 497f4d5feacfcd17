//! Project-scoped issues and their comment threads.

use super::{CommentId, IssueId, MarketplaceDomainError, ParseEnumError, ProjectId, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Issue resolution state. `Resolved` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    /// Under discussion.
    Open,
    /// Closed by the client.
    Resolved,
}

impl IssueStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Resolved => "resolved",
        }
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for IssueStatus {
    type Error = ParseEnumError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "resolved" => Ok(Self::Resolved),
            _ => Err(ParseEnumError::new("issue status", value)),
        }
    }
}

/// Client-raised discussion thread about a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    id: IssueId,
    project_id: ProjectId,
    opener_id: UserId,
    title: String,
    description: String,
    status: IssueStatus,
    created_at: DateTime<Utc>,
    resolved_at: Option<DateTime<Utc>>,
}

/// Parameter object for reconstructing a persisted issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedIssueData {
    /// Persisted identifier.
    pub id: IssueId,
    /// Owning project.
    pub project_id: ProjectId,
    /// User who opened the issue.
    pub opener_id: UserId,
    /// Issue title.
    pub title: String,
    /// Issue description.
    pub description: String,
    /// Resolution state.
    pub status: IssueStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Resolution timestamp, if resolved.
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Issue {
    /// Opens a new issue.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceDomainError::EmptyIssueTitle`] for a blank title.
    pub fn open(
        project_id: ProjectId,
        opener_id: UserId,
        title: impl Into<String>,
        description: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<Self, MarketplaceDomainError> {
        let raw_title = title.into();
        let trimmed = raw_title.trim();
        if trimmed.is_empty() {
            return Err(MarketplaceDomainError::EmptyIssueTitle);
        }
        Ok(Self {
            id: IssueId::new(),
            project_id,
            opener_id,
            title: trimmed.to_owned(),
            description: description.into(),
            status: IssueStatus::Open,
            created_at: clock.utc(),
            resolved_at: None,
        })
    }

    /// Reconstructs an issue from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedIssueData) -> Self {
        Self {
            id: data.id,
            project_id: data.project_id,
            opener_id: data.opener_id,
            title: data.title,
            description: data.description,
            status: data.status,
            created_at: data.created_at,
            resolved_at: data.resolved_at,
        }
    }

    /// Returns the issue identifier.
    #[must_use]
    pub const fn id(&self) -> IssueId {
        self.id
    }

    /// Returns the owning project.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the user who opened the issue.
    #[must_use]
    pub const fn opener_id(&self) -> UserId {
        self.opener_id
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the resolution state.
    #[must_use]
    pub const fn status(&self) -> IssueStatus {
        self.status
    }

    /// Returns `true` once the issue is resolved.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(self.status, IssueStatus::Resolved)
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the resolution timestamp, if resolved.
    #[must_use]
    pub const fn resolved_at(&self) -> Option<DateTime<Utc>> {
        self.resolved_at
    }

    /// Marks the issue resolved. Returns `false` when it already was, leaving
    /// the original resolution timestamp untouched.
    pub fn resolve(&mut self, clock: &impl Clock) -> bool {
        self.resolve_at(clock.utc())
    }

    /// Marks the issue resolved at `at`. Returns `false` when it already was.
    pub const fn resolve_at(&mut self, at: DateTime<Utc>) -> bool {
        if self.is_resolved() {
            return false;
        }
        self.status = IssueStatus::Resolved;
        self.resolved_at = Some(at);
        true
    }
}

/// Comment on an issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueComment {
    id: CommentId,
    issue_id: IssueId,
    author_id: UserId,
    content: String,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedCommentData {
    /// Persisted identifier.
    pub id: CommentId,
    /// Parent issue.
    pub issue_id: IssueId,
    /// Comment author.
    pub author_id: UserId,
    /// Comment body.
    pub content: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl IssueComment {
    /// Writes a new comment.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceDomainError::EmptyCommentContent`] for blank
    /// content.
    pub fn write(
        issue_id: IssueId,
        author_id: UserId,
        content: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<Self, MarketplaceDomainError> {
        let body = content.into();
        if body.trim().is_empty() {
            return Err(MarketplaceDomainError::EmptyCommentContent);
        }
        Ok(Self {
            id: CommentId::new(),
            issue_id,
            author_id,
            content: body,
            created_at: clock.utc(),
        })
    }

    /// Reconstructs a comment from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedCommentData) -> Self {
        Self {
            id: data.id,
            issue_id: data.issue_id,
            author_id: data.author_id,
            content: data.content,
            created_at: data.created_at,
        }
    }

    /// Returns the comment identifier.
    #[must_use]
    pub const fn id(&self) -> CommentId {
        self.id
    }

    /// Returns the parent issue.
    #[must_use]
    pub const fn issue_id(&self) -> IssueId {
        self.issue_id
    }

    /// Returns the author.
    #[must_use]
    pub const fn author_id(&self) -> UserId {
        self.author_id
    }

    /// Returns the comment body.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
