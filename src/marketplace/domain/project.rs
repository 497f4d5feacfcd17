//! Project aggregate root and its lifecycle states.

use super::{MarketplaceDomainError, ParseEnumError, ProjectId, ProposalId, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Project lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Accepting proposals.
    Open,
    /// A contractor has been selected and is working.
    InProgress,
    /// A deliverable awaits the client's decision.
    Reviewing,
    /// The client asked for changes to the last deliverable.
    InRevision,
    /// The client accepted the work.
    Closed,
}

impl ProjectStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Open,
        Self::InProgress,
        Self::Reviewing,
        Self::InRevision,
        Self::Closed,
    ];

    /// Statuses in which issues may be opened.
    pub const ACTIVE: &'static [Self] = &[Self::InProgress, Self::Reviewing, Self::InRevision];

    /// Statuses in which the owner may edit project details.
    pub const EDITABLE: &'static [Self] = &[Self::Open, Self::InProgress, Self::InRevision];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Reviewing => "reviewing",
            Self::InRevision => "in_revision",
            Self::Closed => "closed",
        }
    }

    /// Returns whether the status edge `self -> target` exists.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Open, Self::InProgress)
                | (Self::InProgress | Self::InRevision, Self::Reviewing)
                | (Self::Reviewing, Self::InRevision | Self::Closed)
        )
    }

    /// Returns whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Returns whether work is under way on the project.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::InProgress | Self::Reviewing | Self::InRevision)
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProjectStatus {
    type Error = ParseEnumError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "in_progress" => Ok(Self::InProgress),
            "reviewing" => Ok(Self::Reviewing),
            "in_revision" => Ok(Self::InRevision),
            "closed" => Ok(Self::Closed),
            _ => Err(ParseEnumError::new("project status", value)),
        }
    }
}

/// A status change the aggregate refused because the edge does not exist.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("project {project_id} cannot move from {from} to {to}")]
pub struct InvalidProjectTransition {
    /// Project that refused the change.
    pub project_id: ProjectId,
    /// Current status.
    pub from: ProjectStatus,
    /// Requested status.
    pub to: ProjectStatus,
}

/// Validated project title.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectTitle(String);

impl ProjectTitle {
    const MAX_LENGTH: usize = 200;

    /// Creates a validated, trimmed title.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceDomainError::EmptyProjectTitle`] for blank input
    /// or [`MarketplaceDomainError::ProjectTitleTooLong`] past 200 characters.
    pub fn new(value: impl Into<String>) -> Result<Self, MarketplaceDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(MarketplaceDomainError::EmptyProjectTitle);
        }
        if trimmed.chars().count() > Self::MAX_LENGTH {
            return Err(MarketplaceDomainError::ProjectTitleTooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the title as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Non-negative monetary amount in whole currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    /// Creates a validated amount.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceDomainError::NegativeAmount`] for negative input.
    pub const fn new(value: i64) -> Result<Self, MarketplaceDomainError> {
        if value < 0 {
            return Err(MarketplaceDomainError::NegativeAmount(value));
        }
        Ok(Self(value))
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

/// Editable project details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDetails {
    /// Project title.
    pub title: ProjectTitle,
    /// Free-text description.
    pub description: String,
    /// Offered budget.
    pub budget: Amount,
}

/// Project aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    id: ProjectId,
    client_id: UserId,
    contractor_id: Option<UserId>,
    accepted_proposal_id: Option<ProposalId>,
    title: ProjectTitle,
    description: String,
    budget: Amount,
    status: ProjectStatus,
    bid_deadline: Option<DateTime<Utc>>,
    closed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedProjectData {
    /// Persisted identifier.
    pub id: ProjectId,
    /// Owning client.
    pub client_id: UserId,
    /// Selected contractor, if any.
    pub contractor_id: Option<UserId>,
    /// Accepted proposal, if any.
    pub accepted_proposal_id: Option<ProposalId>,
    /// Persisted title.
    pub title: ProjectTitle,
    /// Persisted description.
    pub description: String,
    /// Persisted budget.
    pub budget: Amount,
    /// Persisted status.
    pub status: ProjectStatus,
    /// Proposal deadline, if any.
    pub bid_deadline: Option<DateTime<Utc>>,
    /// Closure timestamp, if closed.
    pub closed_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest change timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Posts a new project owned by `client_id`. New projects start `open`.
    #[must_use]
    pub fn post(
        client_id: UserId,
        details: ProjectDetails,
        bid_deadline: Option<DateTime<Utc>>,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            id: ProjectId::new(),
            client_id,
            contractor_id: None,
            accepted_proposal_id: None,
            title: details.title,
            description: details.description,
            budget: details.budget,
            status: ProjectStatus::Open,
            bid_deadline,
            closed_at: None,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a project from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedProjectData) -> Self {
        Self {
            id: data.id,
            client_id: data.client_id,
            contractor_id: data.contractor_id,
            accepted_proposal_id: data.accepted_proposal_id,
            title: data.title,
            description: data.description,
            budget: data.budget,
            status: data.status,
            bid_deadline: data.bid_deadline,
            closed_at: data.closed_at,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the project identifier.
    #[must_use]
    pub const fn id(&self) -> ProjectId {
        self.id
    }

    /// Returns the owning client.
    #[must_use]
    pub const fn client_id(&self) -> UserId {
        self.client_id
    }

    /// Returns the selected contractor, if any.
    #[must_use]
    pub const fn contractor_id(&self) -> Option<UserId> {
        self.contractor_id
    }

    /// Returns the accepted proposal, if any.
    #[must_use]
    pub const fn accepted_proposal_id(&self) -> Option<ProposalId> {
        self.accepted_proposal_id
    }

    /// Returns the title.
    #[must_use]
    pub const fn title(&self) -> &ProjectTitle {
        &self.title
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the budget.
    #[must_use]
    pub const fn budget(&self) -> Amount {
        self.budget
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> ProjectStatus {
        self.status
    }

    /// Returns the proposal deadline, if any.
    #[must_use]
    pub const fn bid_deadline(&self) -> Option<DateTime<Utc>> {
        self.bid_deadline
    }

    /// Returns the closure timestamp, if closed.
    #[must_use]
    pub const fn closed_at(&self) -> Option<DateTime<Utc>> {
        self.closed_at
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest change timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns `true` when `user_id` owns the project.
    #[must_use]
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.client_id == user_id
    }

    /// Returns `true` when `user_id` is the selected contractor.
    #[must_use]
    pub fn is_assigned_to(&self, user_id: UserId) -> bool {
        self.contractor_id == Some(user_id)
    }

    /// Replaces the editable details. Status is unchanged.
    pub fn apply_details(&mut self, details: ProjectDetails, clock: &impl Clock) {
        self.title = details.title;
        self.description = details.description;
        self.budget = details.budget;
        self.touch(clock);
    }

    /// Records the selected contractor and moves the project to `in_progress`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidProjectTransition`] unless the project is `open`.
    pub fn assign_contractor(
        &mut self,
        proposal_id: ProposalId,
        contractor_id: UserId,
        clock: &impl Clock,
    ) -> Result<(), InvalidProjectTransition> {
        self.transition_to(ProjectStatus::InProgress)?;
        self.contractor_id = Some(contractor_id);
        self.accepted_proposal_id = Some(proposal_id);
        self.touch(clock);
        Ok(())
    }

    /// Moves the project to `reviewing` after a deliverable upload.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidProjectTransition`] unless the project is
    /// `in_progress` or `in_revision`.
    pub fn submit_deliverable(&mut self, clock: &impl Clock) -> Result<(), InvalidProjectTransition> {
        self.transition_to(ProjectStatus::Reviewing)?;
        self.touch(clock);
        Ok(())
    }

    /// Sends the reviewed deliverable back for changes.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidProjectTransition`] unless the project is `reviewing`.
    pub fn request_revision(&mut self, clock: &impl Clock) -> Result<(), InvalidProjectTransition> {
        self.transition_to(ProjectStatus::InRevision)?;
        self.touch(clock);
        Ok(())
    }

    /// Accepts the reviewed deliverable and closes the project.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidProjectTransition`] unless the project is `reviewing`.
    pub fn close(&mut self, clock: &impl Clock) -> Result<(), InvalidProjectTransition> {
        self.transition_to(ProjectStatus::Closed)?;
        let timestamp = clock.utc();
        self.closed_at = Some(timestamp);
        self.updated_at = timestamp;
        Ok(())
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }

    fn transition_to(&mut self, target: ProjectStatus) -> Result<(), InvalidProjectTransition> {
        if !self.status.can_transition_to(target) {
            return Err(InvalidProjectTransition {
                project_id: self.id,
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        Ok(())
    }
}
