//! In-memory marketplace repository for tests and local runs.
//!
//! All collections live behind one lock so each call observes and applies a
//! consistent snapshot, mirroring the transactional adapter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::marketplace::{
    domain::{
        Attachment, AttachmentId, FileVersion, Issue, IssueComment, IssueId, Project, ProjectId,
        ProjectStatus, Proposal, ProposalId, ProposalStatus, Rating, Role, User, UserId, Username,
        VersionPartition,
    },
    ports::{
        AttachmentRepository, ContractorSelection, IssueRepository, ProjectRepository,
        ProposalRepository, RatingRepository, RepositoryError, RepositoryResult,
        UploadCompanion, UserRepository,
    },
};

/// Thread-safe in-memory marketplace repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMarketplaceRepository {
    state: Arc<RwLock<MarketplaceState>>,
}

#[derive(Debug, Default)]
struct MarketplaceState {
    users: Vec<User>,
    projects: Vec<Project>,
    proposals: Vec<Proposal>,
    attachments: Vec<Attachment>,
    issues: Vec<Issue>,
    comments: Vec<IssueComment>,
    ratings: Vec<Rating>,
}

impl MarketplaceState {
    fn project_mut(
        &mut self,
        id: ProjectId,
        expected: ProjectStatus,
    ) -> RepositoryResult<&mut Project> {
        let stored = self
            .projects
            .iter_mut()
            .find(|project| project.id() == id)
            .ok_or_else(|| RepositoryError::not_found("project", id.into_inner()))?;
        if stored.status() != expected {
            return Err(RepositoryError::StaleProject {
                project_id: id,
                expected,
            });
        }
        Ok(stored)
    }

    fn ensure_project_status(
        &mut self,
        id: ProjectId,
        expected: ProjectStatus,
    ) -> RepositoryResult<()> {
        self.project_mut(id, expected).map(|_| ())
    }

    fn resolve_open_issues(&mut self, project_id: ProjectId, at: DateTime<Utc>) -> usize {
        self.issues
            .iter_mut()
            .filter(|issue| issue.project_id() == project_id)
            .map(|issue| issue.resolve_at(at))
            .filter(|resolved| *resolved)
            .count()
    }
}

impl InMemoryMarketplaceRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RepositoryResult<RwLockReadGuard<'_, MarketplaceState>> {
        self.state
            .read()
            .map_err(|err| RepositoryError::persistence(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> RepositoryResult<RwLockWriteGuard<'_, MarketplaceState>> {
        self.state
            .write()
            .map_err(|err| RepositoryError::persistence(std::io::Error::other(err.to_string())))
    }
}

/// Returns items newest first; later insertions win ties.
fn newest_first<T: Clone>(
    items: &[T],
    keep: impl Fn(&T) -> bool,
    created_at: impl Fn(&T) -> DateTime<Utc>,
) -> Vec<T> {
    let mut selected: Vec<T> = items.iter().rev().filter(|item| keep(*item)).cloned().collect();
    selected.sort_by_key(|item| Reverse(created_at(item)));
    selected
}

/// Returns items oldest first; earlier insertions win ties.
fn oldest_first<T: Clone>(
    items: &[T],
    keep: impl Fn(&T) -> bool,
    created_at: impl Fn(&T) -> DateTime<Utc>,
) -> Vec<T> {
    let mut selected: Vec<T> = items.iter().filter(|item| keep(*item)).cloned().collect();
    selected.sort_by_key(created_at);
    selected
}

#[async_trait]
impl UserRepository for InMemoryMarketplaceRepository {
    async fn store_user(&self, user: &User) -> RepositoryResult<()> {
        let mut state = self.write()?;
        if state
            .users
            .iter()
            .any(|existing| existing.username() == user.username())
        {
            return Err(RepositoryError::DuplicateUsername(
                user.username().as_str().to_owned(),
            ));
        }
        state.users.push(user.clone());
        Ok(())
    }

    async fn find_user(&self, id: UserId) -> RepositoryResult<Option<User>> {
        let state = self.read()?;
        Ok(state.users.iter().find(|user| user.id() == id).cloned())
    }

    async fn find_user_by_username(&self, username: &Username) -> RepositoryResult<Option<User>> {
        let state = self.read()?;
        Ok(state
            .users
            .iter()
            .find(|user| user.username() == username)
            .cloned())
    }
}

#[async_trait]
impl ProjectRepository for InMemoryMarketplaceRepository {
    async fn store_project(&self, project: &Project) -> RepositoryResult<()> {
        let mut state = self.write()?;
        state.projects.push(project.clone());
        Ok(())
    }

    async fn find_project(&self, id: ProjectId) -> RepositoryResult<Option<Project>> {
        let state = self.read()?;
        Ok(state
            .projects
            .iter()
            .find(|project| project.id() == id)
            .cloned())
    }

    async fn update_project(
        &self,
        project: &Project,
        expected: ProjectStatus,
    ) -> RepositoryResult<()> {
        let mut state = self.write()?;
        *state.project_mut(project.id(), expected)? = project.clone();
        Ok(())
    }

    async fn delete_project(&self, id: ProjectId, expected: ProjectStatus) -> RepositoryResult<()> {
        let mut state = self.write()?;
        state.ensure_project_status(id, expected)?;
        let removed_issues: Vec<IssueId> = state
            .issues
            .iter()
            .filter(|issue| issue.project_id() == id)
            .map(Issue::id)
            .collect();
        state.projects.retain(|project| project.id() != id);
        state.proposals.retain(|proposal| proposal.project_id() != id);
        state
            .attachments
            .retain(|attachment| attachment.project_id() != id);
        state.issues.retain(|issue| issue.project_id() != id);
        state
            .comments
            .retain(|comment| !removed_issues.contains(&comment.issue_id()));
        state.ratings.retain(|rating| rating.project_id() != id);
        Ok(())
    }

    async fn list_projects_for_client(&self, client_id: UserId) -> RepositoryResult<Vec<Project>> {
        let state = self.read()?;
        Ok(newest_first(
            &state.projects,
            |project| project.is_owned_by(client_id),
            Project::created_at,
        ))
    }

    async fn list_projects_open_for_bidding(
        &self,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Vec<Project>> {
        let state = self.read()?;
        Ok(newest_first(
            &state.projects,
            |project| {
                project.status() == ProjectStatus::Open
                    && project.bid_deadline().is_none_or(|deadline| deadline > now)
            },
            Project::created_at,
        ))
    }

    async fn finalize_project(
        &self,
        project: &Project,
        expected: ProjectStatus,
    ) -> RepositoryResult<usize> {
        let mut state = self.write()?;
        state.ensure_project_status(project.id(), expected)?;
        let resolved_at = project.closed_at().unwrap_or_else(|| project.updated_at());
        let swept = state.resolve_open_issues(project.id(), resolved_at);
        *state.project_mut(project.id(), expected)? = project.clone();
        Ok(swept)
    }
}

#[async_trait]
impl ProposalRepository for InMemoryMarketplaceRepository {
    async fn store_proposal(
        &self,
        proposal: &Proposal,
        expected: ProjectStatus,
    ) -> RepositoryResult<()> {
        let mut state = self.write()?;
        state.ensure_project_status(proposal.project_id(), expected)?;
        state.proposals.push(proposal.clone());
        Ok(())
    }

    async fn find_proposal(&self, id: ProposalId) -> RepositoryResult<Option<Proposal>> {
        let state = self.read()?;
        Ok(state
            .proposals
            .iter()
            .find(|proposal| proposal.id() == id)
            .cloned())
    }

    async fn list_proposals_for_project(
        &self,
        project_id: ProjectId,
    ) -> RepositoryResult<Vec<Proposal>> {
        let state = self.read()?;
        Ok(oldest_first(
            &state.proposals,
            |proposal| proposal.project_id() == project_id,
            Proposal::created_at,
        ))
    }

    async fn list_proposals_for_contractor(
        &self,
        contractor_id: UserId,
    ) -> RepositoryResult<Vec<Proposal>> {
        let state = self.read()?;
        Ok(newest_first(
            &state.proposals,
            |proposal| proposal.contractor_id() == contractor_id,
            Proposal::created_at,
        ))
    }

    async fn has_pending_proposal(
        &self,
        project_id: ProjectId,
        contractor_id: UserId,
    ) -> RepositoryResult<bool> {
        let state = self.read()?;
        Ok(state.proposals.iter().any(|proposal| {
            proposal.project_id() == project_id
                && proposal.contractor_id() == contractor_id
                && proposal.is_pending()
        }))
    }

    async fn update_proposal(
        &self,
        proposal: &Proposal,
        expected: ProposalStatus,
    ) -> RepositoryResult<()> {
        let mut state = self.write()?;
        let stored = state
            .proposals
            .iter_mut()
            .find(|stored| stored.id() == proposal.id())
            .ok_or_else(|| RepositoryError::not_found("proposal", proposal.id().into_inner()))?;
        if stored.status() != expected {
            return Err(RepositoryError::StaleProposal {
                proposal_id: proposal.id(),
                expected,
            });
        }
        *stored = proposal.clone();
        Ok(())
    }

    async fn record_selection(&self, selection: ContractorSelection<'_>) -> RepositoryResult<usize> {
        let ContractorSelection {
            project,
            expected,
            accepted,
        } = selection;
        let mut state = self.write()?;
        state.ensure_project_status(project.id(), expected)?;
        if state.proposals.iter().any(|proposal| {
            proposal.project_id() == project.id() && proposal.status() == ProposalStatus::Accepted
        }) {
            return Err(RepositoryError::DuplicateAcceptedProposal(project.id()));
        }
        let Some(stored) = state
            .proposals
            .iter()
            .find(|proposal| proposal.id() == accepted.id())
        else {
            return Err(RepositoryError::not_found(
                "proposal",
                accepted.id().into_inner(),
            ));
        };
        if !stored.is_pending() {
            return Err(RepositoryError::StaleProposal {
                proposal_id: accepted.id(),
                expected: ProposalStatus::Pending,
            });
        }

        let decided_at = accepted.updated_at();
        let mut rejected = 0_usize;
        for proposal in &mut state.proposals {
            if proposal.id() == accepted.id() {
                *proposal = accepted.clone();
            } else if proposal.project_id() == project.id()
                && proposal.reject_at(decided_at).is_ok()
            {
                rejected = rejected.saturating_add(1);
            }
        }
        *state.project_mut(project.id(), expected)? = project.clone();
        Ok(rejected)
    }
}

#[async_trait]
impl AttachmentRepository for InMemoryMarketplaceRepository {
    async fn latest_attachment_version(
        &self,
        partition: VersionPartition,
    ) -> RepositoryResult<Option<FileVersion>> {
        let state = self.read()?;
        Ok(state
            .attachments
            .iter()
            .filter(|attachment| attachment.partition() == partition)
            .map(Attachment::version)
            .max())
    }

    async fn record_upload(
        &self,
        attachment: &Attachment,
        companion: UploadCompanion<'_>,
    ) -> RepositoryResult<()> {
        let mut state = self.write()?;
        let partition = attachment.partition();
        if state.attachments.iter().any(|existing| {
            existing.partition() == partition && existing.version() == attachment.version()
        }) {
            return Err(RepositoryError::AttachmentVersionConflict {
                project_id: attachment.project_id(),
                version: attachment.version(),
            });
        }
        match companion {
            UploadCompanion::None => {}
            UploadCompanion::ProjectTransition { project, expected } => {
                *state.project_mut(project.id(), expected)? = project.clone();
            }
            UploadCompanion::Proposal { proposal, expected } => {
                state.ensure_project_status(proposal.project_id(), expected)?;
                state.proposals.push(proposal.clone());
            }
        }
        state.attachments.push(attachment.clone());
        Ok(())
    }

    async fn find_attachment(&self, id: AttachmentId) -> RepositoryResult<Option<Attachment>> {
        let state = self.read()?;
        Ok(state
            .attachments
            .iter()
            .find(|attachment| attachment.id() == id)
            .cloned())
    }

    async fn list_attachments_for_project(
        &self,
        project_id: ProjectId,
    ) -> RepositoryResult<Vec<Attachment>> {
        let state = self.read()?;
        let mut attachments: Vec<Attachment> = state
            .attachments
            .iter()
            .filter(|attachment| attachment.project_id() == project_id)
            .cloned()
            .collect();
        attachments.sort_by_key(|attachment| (attachment.uploaded_at(), attachment.version()));
        Ok(attachments)
    }

    async fn list_attachment_versions(
        &self,
        partition: VersionPartition,
    ) -> RepositoryResult<Vec<Attachment>> {
        let state = self.read()?;
        let mut versions: Vec<Attachment> = state
            .attachments
            .iter()
            .filter(|attachment| attachment.partition() == partition)
            .cloned()
            .collect();
        versions.sort_by_key(Attachment::version);
        Ok(versions)
    }
}

#[async_trait]
impl IssueRepository for InMemoryMarketplaceRepository {
    async fn store_issue(
        &self,
        issue: &Issue,
        opening_comment: Option<&IssueComment>,
    ) -> RepositoryResult<()> {
        let mut state = self.write()?;
        state.issues.push(issue.clone());
        if let Some(comment) = opening_comment {
            state.comments.push(comment.clone());
        }
        Ok(())
    }

    async fn find_issue(&self, id: IssueId) -> RepositoryResult<Option<Issue>> {
        let state = self.read()?;
        Ok(state.issues.iter().find(|issue| issue.id() == id).cloned())
    }

    async fn update_issue(&self, issue: &Issue) -> RepositoryResult<()> {
        let mut state = self.write()?;
        let stored = state
            .issues
            .iter_mut()
            .find(|stored| stored.id() == issue.id())
            .ok_or_else(|| RepositoryError::not_found("issue", issue.id().into_inner()))?;
        *stored = issue.clone();
        Ok(())
    }

    async fn list_issues_for_project(&self, project_id: ProjectId) -> RepositoryResult<Vec<Issue>> {
        let state = self.read()?;
        Ok(oldest_first(
            &state.issues,
            |issue| issue.project_id() == project_id,
            Issue::created_at,
        ))
    }

    async fn store_comment(&self, comment: &IssueComment) -> RepositoryResult<()> {
        let mut state = self.write()?;
        let issue = state
            .issues
            .iter()
            .find(|issue| issue.id() == comment.issue_id())
            .ok_or_else(|| RepositoryError::not_found("issue", comment.issue_id().into_inner()))?;
        if issue.is_resolved() {
            return Err(RepositoryError::IssueResolved(issue.id()));
        }
        state.comments.push(comment.clone());
        Ok(())
    }

    async fn list_comments(&self, issue_id: IssueId) -> RepositoryResult<Vec<IssueComment>> {
        let state = self.read()?;
        Ok(oldest_first(
            &state.comments,
            |comment| comment.issue_id() == issue_id,
            IssueComment::created_at,
        ))
    }

    async fn resolve_open_issues(
        &self,
        project_id: ProjectId,
        resolved_at: DateTime<Utc>,
    ) -> RepositoryResult<usize> {
        let mut state = self.write()?;
        Ok(state.resolve_open_issues(project_id, resolved_at))
    }
}

#[async_trait]
impl RatingRepository for InMemoryMarketplaceRepository {
    async fn store_rating(&self, rating: &Rating) -> RepositoryResult<()> {
        let mut state = self.write()?;
        if state.ratings.iter().any(|existing| {
            existing.project_id() == rating.project_id()
                && existing.rater_id() == rating.rater_id()
                && existing.target_id() == rating.target_id()
        }) {
            return Err(RepositoryError::DuplicateRating {
                project_id: rating.project_id(),
                rater_id: rating.rater_id(),
                target_id: rating.target_id(),
            });
        }
        state.ratings.push(rating.clone());
        Ok(())
    }

    async fn find_rating(
        &self,
        project_id: ProjectId,
        rater_id: UserId,
        target_id: UserId,
    ) -> RepositoryResult<Option<Rating>> {
        let state = self.read()?;
        Ok(state
            .ratings
            .iter()
            .find(|rating| {
                rating.project_id() == project_id
                    && rating.rater_id() == rater_id
                    && rating.target_id() == target_id
            })
            .cloned())
    }

    async fn list_ratings_for_target(
        &self,
        target_id: UserId,
        target_role: Role,
    ) -> RepositoryResult<Vec<Rating>> {
        let state = self.read()?;
        Ok(oldest_first(
            &state.ratings,
            |rating| rating.target_id() == target_id && rating.target_role() == target_role,
            Rating::created_at,
        ))
    }
}
