//! Project posting, selection and review.

use super::{MarketplaceError, MarketplaceResult, load_project};
use crate::marketplace::{
    domain::{
        Actor, Amount, Attachment, AttachmentKind, Decision, Issue, LifecycleEngine, Project,
        ProjectAction, ProjectDetails, ProjectId, ProjectTitle, Proposal, ProposalId,
        ProposalStatus,
    },
    ports::{ContractorSelection, MarketplaceRepository},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument};

/// Request payload for posting a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDraft {
    /// Project title.
    pub title: String,
    /// Free-text description.
    pub description: String,
    /// Offered budget.
    pub budget: i64,
    /// Proposal deadline.
    pub bid_deadline: Option<DateTime<Utc>>,
}

impl ProjectDraft {
    /// Creates a draft without a bid deadline.
    #[must_use]
    pub fn new(title: impl Into<String>, description: impl Into<String>, budget: i64) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            budget,
            bid_deadline: None,
        }
    }

    /// Sets the bid deadline.
    #[must_use]
    pub const fn with_bid_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.bid_deadline = Some(deadline);
        self
    }

    fn details(&self) -> MarketplaceResult<ProjectDetails> {
        project_details(&self.title, &self.description, self.budget)
    }
}

/// Request payload for editing a project. The bid deadline is fixed when
/// the project is posted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectEdit {
    /// Project title.
    pub title: String,
    /// Free-text description.
    pub description: String,
    /// Offered budget.
    pub budget: i64,
}

impl ProjectEdit {
    /// Creates an edit payload.
    #[must_use]
    pub fn new(title: impl Into<String>, description: impl Into<String>, budget: i64) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            budget,
        }
    }

    fn details(&self) -> MarketplaceResult<ProjectDetails> {
        project_details(&self.title, &self.description, self.budget)
    }
}

fn project_details(title: &str, description: &str, budget: i64) -> MarketplaceResult<ProjectDetails> {
    Ok(ProjectDetails {
        title: ProjectTitle::new(title)?,
        description: description.to_owned(),
        budget: Amount::new(budget)?,
    })
}

/// Outcome of selecting a contractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractorSelected {
    /// Project now `in_progress`.
    pub project: Project,
    /// Accepted proposal.
    pub accepted: Proposal,
    /// Number of competing proposals rejected alongside.
    pub rejected_count: usize,
}

/// Project offered to a contractor for bidding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenProjectListing {
    /// Open project.
    pub project: Project,
    /// Whether the contractor already submitted a proposal.
    pub already_bid: bool,
}

/// Project page as seen by one actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectView {
    /// Project.
    pub project: Project,
    /// Proposals visible to the actor.
    pub proposals: Vec<Proposal>,
    /// Files visible to the actor.
    pub attachments: Vec<Attachment>,
    /// Issues, shown to participants only.
    pub issues: Vec<Issue>,
    /// Whether the actor may upload a file now.
    pub can_upload: bool,
}

/// Drives a project from posting to closure.
#[derive(Clone)]
pub struct ProjectService<R, C>
where
    R: MarketplaceRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    engine: LifecycleEngine,
}

impl<R, C> ProjectService<R, C>
where
    R: MarketplaceRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new project service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>, engine: LifecycleEngine) -> Self {
        Self {
            repository,
            clock,
            engine,
        }
    }

    /// Posts a new `open` project owned by the actor.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Forbidden`] for contractors and
    /// [`MarketplaceError::Validation`] for malformed details.
    #[instrument(skip_all, fields(user_id = %actor.user_id()))]
    pub async fn create_project(&self, actor: Actor, draft: ProjectDraft) -> MarketplaceResult<Project> {
        if !actor.is_client() {
            return Err(MarketplaceError::Forbidden(
                "only clients can post projects".to_owned(),
            ));
        }
        let project = Project::post(actor.user_id(), draft.details()?, draft.bid_deadline, &*self.clock);
        self.repository.store_project(&project).await?;
        info!(project_id = %project.id(), "project posted");
        Ok(project)
    }

    /// Replaces a project's title, description and budget. The bid deadline
    /// is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Forbidden`] unless the actor owns the
    /// project and [`MarketplaceError::InvalidState`] outside the editable
    /// statuses.
    #[instrument(skip_all, fields(project_id = %project_id, user_id = %actor.user_id()))]
    pub async fn edit_project(
        &self,
        actor: Actor,
        project_id: ProjectId,
        edit: ProjectEdit,
    ) -> MarketplaceResult<Project> {
        let mut project = load_project(&*self.repository, project_id).await?;
        let decision = self.evaluate(ProjectAction::EditProject, actor, &project)?;
        project.apply_details(edit.details()?, &*self.clock);
        self.repository.update_project(&project, decision.from).await?;
        Ok(project)
    }

    /// Deletes an open project with its proposals, file rows, issues and
    /// ratings. Stored content is kept.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Forbidden`] unless the actor owns the
    /// project and [`MarketplaceError::InvalidState`] once work started.
    #[instrument(skip_all, fields(project_id = %project_id, user_id = %actor.user_id()))]
    pub async fn delete_project(&self, actor: Actor, project_id: ProjectId) -> MarketplaceResult<()> {
        let project = load_project(&*self.repository, project_id).await?;
        let decision = self.evaluate(ProjectAction::DeleteProject, actor, &project)?;
        self.repository.delete_project(project_id, decision.from).await?;
        info!("project deleted");
        Ok(())
    }

    /// Accepts one proposal, assigns its contractor and rejects every other
    /// pending proposal in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Forbidden`] unless the actor owns the
    /// project, [`MarketplaceError::DeadlineNotReached`] before the bid
    /// deadline, [`MarketplaceError::NotFound`] when the proposal is not on
    /// this project and [`MarketplaceError::InvalidState`] when it was
    /// already decided.
    #[instrument(
        skip_all,
        fields(project_id = %project_id, proposal_id = %proposal_id, user_id = %actor.user_id())
    )]
    pub async fn select_contractor(
        &self,
        actor: Actor,
        project_id: ProjectId,
        proposal_id: ProposalId,
    ) -> MarketplaceResult<ContractorSelected> {
        let mut project = load_project(&*self.repository, project_id).await?;
        let decision = self.evaluate(ProjectAction::SelectContractor, actor, &project)?;
        let mut accepted = self.load_proposal(project_id, proposal_id).await?;
        accepted.accept(&*self.clock)?;
        project.assign_contractor(accepted.id(), accepted.contractor_id(), &*self.clock)?;
        let rejected_count = self
            .repository
            .record_selection(ContractorSelection {
                project: &project,
                expected: decision.from,
                accepted: &accepted,
            })
            .await?;
        info!(
            contractor_id = %accepted.contractor_id(),
            rejected_count,
            "contractor selected"
        );
        Ok(ContractorSelected {
            project,
            accepted,
            rejected_count,
        })
    }

    /// Rejects a single pending proposal while bidding is open.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Forbidden`] unless the actor owns the
    /// project, [`MarketplaceError::NotFound`] when the proposal is not on
    /// this project and [`MarketplaceError::InvalidState`] when it was
    /// already decided.
    #[instrument(
        skip_all,
        fields(project_id = %project_id, proposal_id = %proposal_id, user_id = %actor.user_id())
    )]
    pub async fn reject_proposal(
        &self,
        actor: Actor,
        project_id: ProjectId,
        proposal_id: ProposalId,
    ) -> MarketplaceResult<Proposal> {
        let project = load_project(&*self.repository, project_id).await?;
        self.evaluate(ProjectAction::RejectProposal, actor, &project)?;
        let mut proposal = self.load_proposal(project_id, proposal_id).await?;
        proposal.reject(&*self.clock)?;
        self.repository
            .update_proposal(&proposal, ProposalStatus::Pending)
            .await?;
        info!("proposal rejected");
        Ok(proposal)
    }

    /// Accepts the reviewed deliverable: resolves every open issue and
    /// closes the project atomically.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Forbidden`] unless the actor owns the
    /// project and [`MarketplaceError::InvalidState`] unless it is
    /// `reviewing`.
    #[instrument(skip_all, fields(project_id = %project_id, user_id = %actor.user_id()))]
    pub async fn accept_deliverable(
        &self,
        actor: Actor,
        project_id: ProjectId,
    ) -> MarketplaceResult<Project> {
        let mut project = load_project(&*self.repository, project_id).await?;
        let decision = self.evaluate(ProjectAction::AcceptDeliverable, actor, &project)?;
        project.close(&*self.clock)?;
        let resolved_issues = self
            .repository
            .finalize_project(&project, decision.from)
            .await?;
        info!(resolved_issues, "project closed");
        Ok(project)
    }

    /// Sends the reviewed deliverable back to the contractor.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Forbidden`] unless the actor owns the
    /// project and [`MarketplaceError::InvalidState`] unless it is
    /// `reviewing`.
    #[instrument(skip_all, fields(project_id = %project_id, user_id = %actor.user_id()))]
    pub async fn request_revision(
        &self,
        actor: Actor,
        project_id: ProjectId,
    ) -> MarketplaceResult<Project> {
        let mut project = load_project(&*self.repository, project_id).await?;
        let decision = self.evaluate(ProjectAction::RequestRevision, actor, &project)?;
        project.request_revision(&*self.clock)?;
        self.repository.update_project(&project, decision.from).await?;
        info!("revision requested");
        Ok(project)
    }

    /// Lists the actor's own projects, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Forbidden`] for contractors.
    pub async fn list_my_projects(&self, actor: Actor) -> MarketplaceResult<Vec<Project>> {
        if !actor.is_client() {
            return Err(MarketplaceError::Forbidden(
                "only clients own projects".to_owned(),
            ));
        }
        Ok(self
            .repository
            .list_projects_for_client(actor.user_id())
            .await?)
    }

    /// Lists projects still accepting proposals, flagging those the
    /// contractor already bid on.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Forbidden`] for clients.
    pub async fn list_open_projects(&self, actor: Actor) -> MarketplaceResult<Vec<OpenProjectListing>> {
        if !actor.is_contractor() {
            return Err(MarketplaceError::Forbidden(
                "only contractors can browse open projects".to_owned(),
            ));
        }
        let projects = self
            .repository
            .list_projects_open_for_bidding(self.clock.utc())
            .await?;
        let bid_on: HashSet<ProjectId> = self
            .repository
            .list_proposals_for_contractor(actor.user_id())
            .await?
            .iter()
            .map(Proposal::project_id)
            .collect();
        Ok(projects
            .into_iter()
            .map(|project| OpenProjectListing {
                already_bid: bid_on.contains(&project.id()),
                project,
            })
            .collect())
    }

    /// Returns the project page as seen by the actor.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::NotFound`] for an unknown project.
    #[instrument(skip_all, fields(project_id = %project_id, user_id = %actor.user_id()))]
    pub async fn project_detail(
        &self,
        actor: Actor,
        project_id: ProjectId,
    ) -> MarketplaceResult<ProjectView> {
        let project = load_project(&*self.repository, project_id).await?;
        let user_id = actor.user_id();
        let is_participant = project.is_owned_by(user_id) || project.is_assigned_to(user_id);

        let proposals: Vec<Proposal> = self
            .repository
            .list_proposals_for_project(project_id)
            .await?
            .into_iter()
            .filter(|proposal| project.is_owned_by(user_id) || proposal.contractor_id() == user_id)
            .collect();
        let attachments: Vec<Attachment> = self
            .repository
            .list_attachments_for_project(project_id)
            .await?
            .into_iter()
            .filter(|attachment| {
                is_participant
                    || attachment.uploader_id() == user_id
                    || attachment.kind() == AttachmentKind::General
            })
            .collect();
        let issues = if is_participant {
            self.repository.list_issues_for_project(project_id).await?
        } else {
            Vec::new()
        };
        let holds_pending_proposal = proposals
            .iter()
            .any(|proposal| proposal.contractor_id() == user_id && proposal.is_pending());
        let can_upload = self
            .engine
            .upload_route(actor, &project, holds_pending_proposal, self.clock.utc())
            .is_ok();
        Ok(ProjectView {
            project,
            proposals,
            attachments,
            issues,
            can_upload,
        })
    }

    fn evaluate(
        &self,
        action: ProjectAction,
        actor: Actor,
        project: &Project,
    ) -> MarketplaceResult<Decision> {
        Ok(self.engine.evaluate(action, actor, project, self.clock.utc())?)
    }

    async fn load_proposal(
        &self,
        project_id: ProjectId,
        proposal_id: ProposalId,
    ) -> MarketplaceResult<Proposal> {
        self.repository
            .find_proposal(proposal_id)
            .await?
            .filter(|proposal| proposal.project_id() == project_id)
            .ok_or_else(|| MarketplaceError::not_found("proposal", proposal_id.into_inner()))
    }
}
