//! Single transition table and guard evaluation for project actions.
//!
//! Every role-gated action on a project is described by one [`ActionRule`].
//! [`LifecycleEngine::evaluate`] checks an authenticated [`Actor`] against
//! that rule in a fixed order (role, party, status, deadline) and returns the
//! resulting [`Decision`] without mutating anything. Services apply the
//! decision through the aggregate and persist it atomically.

use super::{Actor, AttachmentKind, Project, ProjectId, ProjectStatus, Role};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Action requested against a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectAction {
    /// Contractor bids on an open project.
    SubmitProposal,
    /// Owner picks the winning proposal.
    SelectContractor,
    /// Owner declines a single proposal.
    RejectProposal,
    /// Owner changes title, description or budget.
    EditProject,
    /// Owner removes the project.
    DeleteProject,
    /// Owner shares a general reference file.
    UploadGeneralFile,
    /// Bidding contractor adds a supplementary proposal document.
    UploadProposalFile,
    /// Assigned contractor submits work for review.
    UploadDeliverable,
    /// Owner accepts the reviewed deliverable.
    AcceptDeliverable,
    /// Owner sends the reviewed deliverable back.
    RequestRevision,
    /// Owner raises an issue.
    OpenIssue,
    /// Owner resolves an issue.
    ResolveIssue,
    /// A participant comments on an issue.
    CommentOnIssue,
    /// A participant rates the other side after closure.
    RateCounterpart,
}

impl ProjectAction {
    /// Returns a stable identifier used in logs and error details.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SubmitProposal => "submit_proposal",
            Self::SelectContractor => "select_contractor",
            Self::RejectProposal => "reject_proposal",
            Self::EditProject => "edit_project",
            Self::DeleteProject => "delete_project",
            Self::UploadGeneralFile => "upload_general_file",
            Self::UploadProposalFile => "upload_proposal_file",
            Self::UploadDeliverable => "upload_deliverable",
            Self::AcceptDeliverable => "accept_deliverable",
            Self::RequestRevision => "request_revision",
            Self::OpenIssue => "open_issue",
            Self::ResolveIssue => "resolve_issue",
            Self::CommentOnIssue => "comment_on_issue",
            Self::RateCounterpart => "rate_counterpart",
        }
    }

    /// Returns the rule governing this action.
    #[must_use]
    pub const fn rule(self) -> ActionRule {
        use DeadlineRule as D;
        use Party as P;
        use ProjectStatus as S;

        const OPEN: &[ProjectStatus] = &[ProjectStatus::Open];
        const REVIEWING: &[ProjectStatus] = &[ProjectStatus::Reviewing];
        const CLOSED: &[ProjectStatus] = &[ProjectStatus::Closed];
        const WORKING: &[ProjectStatus] = &[ProjectStatus::InProgress, ProjectStatus::InRevision];
        const NOT_CLOSED: &[ProjectStatus] = &[
            ProjectStatus::Open,
            ProjectStatus::InProgress,
            ProjectStatus::Reviewing,
            ProjectStatus::InRevision,
        ];
        const ANY: &[ProjectStatus] = &ProjectStatus::ALL;
        const CLIENT: Option<Role> = Some(Role::Client);
        const CONTRACTOR: Option<Role> = Some(Role::Contractor);

        let (role, party, statuses, deadline, target) = match self {
            Self::SubmitProposal => (CONTRACTOR, P::AnyContractor, OPEN, D::BeforeBidDeadline, None),
            Self::SelectContractor => (CLIENT, P::Owner, OPEN, D::AfterBidDeadline, Some(S::InProgress)),
            Self::RejectProposal | Self::DeleteProject => (CLIENT, P::Owner, OPEN, D::None, None),
            Self::EditProject => (CLIENT, P::Owner, S::EDITABLE, D::None, None),
            Self::UploadGeneralFile => (CLIENT, P::Owner, NOT_CLOSED, D::None, None),
            Self::UploadProposalFile => (CONTRACTOR, P::AnyContractor, OPEN, D::BeforeBidDeadline, None),
            Self::UploadDeliverable => {
                (CONTRACTOR, P::AssignedContractor, WORKING, D::None, Some(S::Reviewing))
            }
            Self::AcceptDeliverable => (CLIENT, P::Owner, REVIEWING, D::None, Some(S::Closed)),
            Self::RequestRevision => (CLIENT, P::Owner, REVIEWING, D::None, Some(S::InRevision)),
            Self::OpenIssue => (CLIENT, P::Owner, S::ACTIVE, D::None, None),
            Self::ResolveIssue => (CLIENT, P::Owner, ANY, D::None, None),
            Self::CommentOnIssue => (None, P::Participant, ANY, D::None, None),
            Self::RateCounterpart => (None, P::Participant, CLOSED, D::WithinRatingWindow, None),
        };
        ActionRule {
            role,
            party,
            statuses,
            deadline,
            target,
        }
    }
}

impl fmt::Display for ProjectAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relationship the actor must have with the project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Party {
    /// The owning client.
    Owner,
    /// The contractor selected for the project.
    AssignedContractor,
    /// Any contractor other than the owner.
    AnyContractor,
    /// The owner or the assigned contractor.
    Participant,
}

impl Party {
    /// Returns a stable identifier used in error details.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::AssignedContractor => "assigned contractor",
            Self::AnyContractor => "contractor",
            Self::Participant => "participant",
        }
    }

    fn admits(self, actor: Actor, project: &Project) -> bool {
        let user_id = actor.user_id();
        match self {
            Self::Owner => project.is_owned_by(user_id),
            Self::AssignedContractor => project.is_assigned_to(user_id),
            Self::AnyContractor => actor.is_contractor() && !project.is_owned_by(user_id),
            Self::Participant => project.is_owned_by(user_id) || project.is_assigned_to(user_id),
        }
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Temporal guard attached to an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineRule {
    /// No temporal constraint.
    None,
    /// Strictly before the bid deadline, when one is set.
    BeforeBidDeadline,
    /// At or after the bid deadline, when one is set.
    AfterBidDeadline,
    /// No later than `closed_at` plus the rating window.
    WithinRatingWindow,
}

/// Row of the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionRule {
    /// Required role; `None` admits either role.
    pub role: Option<Role>,
    /// Required relationship with the project.
    pub party: Party,
    /// Statuses in which the action is permitted.
    pub statuses: &'static [ProjectStatus],
    /// Temporal guard.
    pub deadline: DeadlineRule,
    /// Status the project moves to, if the action transitions it.
    pub target: Option<ProjectStatus>,
}

/// Outcome of a successful evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// Evaluated action.
    pub action: ProjectAction,
    /// Project the decision applies to.
    pub project_id: ProjectId,
    /// Status at evaluation time; writes are conditional on it.
    pub from: ProjectStatus,
    /// Status to move to, if any.
    pub to: Option<ProjectStatus>,
}

/// Guard that refused an action.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum LifecycleViolation {
    /// The actor's role cannot perform the action.
    #[error("{role} accounts cannot {action}")]
    WrongRole {
        /// Refused action.
        action: ProjectAction,
        /// Actor's role.
        role: Role,
    },

    /// The actor lacks the required relationship with the project.
    #[error("only the project {party} can {action}")]
    NotAParty {
        /// Refused action.
        action: ProjectAction,
        /// Required relationship.
        party: Party,
    },

    /// The project's status does not permit the action.
    #[error("cannot {action} while the project is {status}")]
    StatusNotPermitted {
        /// Refused action.
        action: ProjectAction,
        /// Current status.
        status: ProjectStatus,
    },

    /// The bid deadline has already passed.
    #[error("the bid deadline passed at {deadline}")]
    DeadlinePassed {
        /// Stored bid deadline.
        deadline: DateTime<Utc>,
    },

    /// The bid deadline has not been reached yet.
    #[error("selection opens at the bid deadline {deadline}")]
    DeadlineNotReached {
        /// Stored bid deadline.
        deadline: DateTime<Utc>,
    },

    /// The rating window after closure has elapsed.
    #[error("the rating window closed at {closes_at}")]
    RatingWindowClosed {
        /// End of the rating window.
        closes_at: DateTime<Utc>,
    },
}

/// Route an upload takes, derived from who uploads and the project state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadRoute {
    /// Version partition the file lands in.
    pub kind: AttachmentKind,
    /// Lifecycle decision backing the upload.
    pub decision: Decision,
}

/// Evaluates project actions against the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleEngine {
    rating_window: Duration,
}

impl LifecycleEngine {
    /// Default rating window after closure.
    pub const DEFAULT_RATING_WINDOW_DAYS: u32 = 14;

    /// Creates an engine with the given rating window.
    #[must_use]
    pub const fn new(rating_window: Duration) -> Self {
        Self { rating_window }
    }

    /// Returns the rating window.
    #[must_use]
    pub const fn rating_window(&self) -> Duration {
        self.rating_window
    }

    /// Checks whether `actor` may perform `action` on `project` at `now`.
    ///
    /// # Errors
    ///
    /// Returns the first failed guard, checked in the order role, party,
    /// status, deadline.
    pub fn evaluate(
        &self,
        action: ProjectAction,
        actor: Actor,
        project: &Project,
        now: DateTime<Utc>,
    ) -> Result<Decision, LifecycleViolation> {
        let rule = action.rule();
        if rule.role.is_some_and(|role| role != actor.role()) {
            return Err(LifecycleViolation::WrongRole {
                action,
                role: actor.role(),
            });
        }
        if !rule.party.admits(actor, project) {
            return Err(LifecycleViolation::NotAParty {
                action,
                party: rule.party,
            });
        }
        let status = project.status();
        if !rule.statuses.contains(&status) {
            return Err(LifecycleViolation::StatusNotPermitted { action, status });
        }
        self.check_deadline(rule.deadline, project, now)?;
        Ok(Decision {
            action,
            project_id: project.id(),
            from: status,
            to: rule.target,
        })
    }

    /// Returns `true` when [`Self::evaluate`] would succeed.
    #[must_use]
    pub fn permits(
        &self,
        action: ProjectAction,
        actor: Actor,
        project: &Project,
        now: DateTime<Utc>,
    ) -> bool {
        self.evaluate(action, actor, project, now).is_ok()
    }

    /// Resolves where an upload by `actor` goes.
    ///
    /// The owner uploads general files, the assigned contractor uploads
    /// deliverables, and a contractor holding a pending proposal uploads
    /// proposal files. Anyone else is evaluated as a deliverable upload so
    /// the refusal names the assigned contractor.
    ///
    /// # Errors
    ///
    /// Returns the violation raised by the selected action's rule.
    pub fn upload_route(
        &self,
        actor: Actor,
        project: &Project,
        holds_pending_proposal: bool,
        now: DateTime<Utc>,
    ) -> Result<UploadRoute, LifecycleViolation> {
        let user_id = actor.user_id();
        let (action, kind) = if project.is_owned_by(user_id) {
            (ProjectAction::UploadGeneralFile, AttachmentKind::General)
        } else if project.is_assigned_to(user_id) || !holds_pending_proposal {
            (ProjectAction::UploadDeliverable, AttachmentKind::Closure)
        } else {
            (ProjectAction::UploadProposalFile, AttachmentKind::Proposal)
        };
        let decision = self.evaluate(action, actor, project, now)?;
        Ok(UploadRoute { kind, decision })
    }

    fn check_deadline(
        &self,
        rule: DeadlineRule,
        project: &Project,
        now: DateTime<Utc>,
    ) -> Result<(), LifecycleViolation> {
        match (rule, project.bid_deadline()) {
            (DeadlineRule::BeforeBidDeadline, Some(deadline)) if now >= deadline => {
                Err(LifecycleViolation::DeadlinePassed { deadline })
            }
            (DeadlineRule::AfterBidDeadline, Some(deadline)) if now < deadline => {
                Err(LifecycleViolation::DeadlineNotReached { deadline })
            }
            (DeadlineRule::WithinRatingWindow, _) => {
                let closed_at = project.closed_at().unwrap_or_else(|| project.updated_at());
                match closed_at.checked_add_signed(self.rating_window) {
                    Some(closes_at) if now > closes_at => {
                        Err(LifecycleViolation::RatingWindowClosed { closes_at })
                    }
                    _ => Ok(()),
                }
            }
            _ => Ok(()),
        }
    }
}

impl Default for LifecycleEngine {
    fn default() -> Self {
        Self::new(Duration::days(i64::from(Self::DEFAULT_RATING_WINDOW_DAYS)))
    }
}
