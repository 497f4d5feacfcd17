//! Project-scoped issue threads.

use super::{MarketplaceError, MarketplaceResult, load_project};
use crate::marketplace::{
    domain::{
        Actor, Issue, IssueComment, IssueId, LifecycleEngine, Project, ProjectAction, ProjectId,
    },
    ports::MarketplaceRepository,
};
use mockable::Clock;
use std::sync::Arc;
use tracing::{info, instrument};

/// Opens, discusses and resolves issues on active projects.
#[derive(Clone)]
pub struct IssueService<R, C>
where
    R: MarketplaceRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    engine: LifecycleEngine,
}

impl<R, C> IssueService<R, C>
where
    R: MarketplaceRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new issue service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>, engine: LifecycleEngine) -> Self {
        Self {
            repository,
            clock,
            engine,
        }
    }

    /// Opens an issue. A non-blank description is also recorded as the
    /// first comment.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Forbidden`] unless the actor owns the
    /// project and [`MarketplaceError::InvalidState`] unless work is under
    /// way.
    #[instrument(skip_all, fields(project_id = %project_id, user_id = %actor.user_id()))]
    pub async fn open_issue(
        &self,
        actor: Actor,
        project_id: ProjectId,
        title: &str,
        description: &str,
    ) -> MarketplaceResult<Issue> {
        let project = load_project(&*self.repository, project_id).await?;
        self.engine
            .evaluate(ProjectAction::OpenIssue, actor, &project, self.clock.utc())?;
        let issue = Issue::open(project_id, actor.user_id(), title, description, &*self.clock)?;
        let opening_comment = if description.trim().is_empty() {
            None
        } else {
            Some(IssueComment::write(
                issue.id(),
                actor.user_id(),
                description,
                &*self.clock,
            )?)
        };
        self.repository
            .store_issue(&issue, opening_comment.as_ref())
            .await?;
        info!(issue_id = %issue.id(), "issue opened");
        Ok(issue)
    }

    /// Adds a comment to an open issue.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::NotFound`] for an unknown issue,
    /// [`MarketplaceError::Forbidden`] unless the actor is a participant and
    /// [`MarketplaceError::InvalidState`] once the issue is resolved.
    #[instrument(skip_all, fields(issue_id = %issue_id, user_id = %actor.user_id()))]
    pub async fn add_comment(
        &self,
        actor: Actor,
        issue_id: IssueId,
        content: &str,
    ) -> MarketplaceResult<IssueComment> {
        let (issue, project) = self.load_issue(issue_id).await?;
        self.engine
            .evaluate(ProjectAction::CommentOnIssue, actor, &project, self.clock.utc())?;
        if issue.is_resolved() {
            return Err(MarketplaceError::InvalidState(format!(
                "issue {issue_id} is resolved"
            )));
        }
        let comment = IssueComment::write(issue_id, actor.user_id(), content, &*self.clock)?;
        self.repository.store_comment(&comment).await?;
        Ok(comment)
    }

    /// Resolves an issue. Resolving a resolved issue changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::NotFound`] for an unknown issue and
    /// [`MarketplaceError::Forbidden`] unless the actor owns the project.
    #[instrument(skip_all, fields(issue_id = %issue_id, user_id = %actor.user_id()))]
    pub async fn resolve_issue(&self, actor: Actor, issue_id: IssueId) -> MarketplaceResult<Issue> {
        let (mut issue, project) = self.load_issue(issue_id).await?;
        self.engine
            .evaluate(ProjectAction::ResolveIssue, actor, &project, self.clock.utc())?;
        if issue.resolve(&*self.clock) {
            self.repository.update_issue(&issue).await?;
            info!("issue resolved");
        }
        Ok(issue)
    }

    /// Resolves every open issue on a project. Returns how many changed.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Forbidden`] unless the actor owns the
    /// project.
    #[instrument(skip_all, fields(project_id = %project_id, user_id = %actor.user_id()))]
    pub async fn close_all_issues_for_project(
        &self,
        actor: Actor,
        project_id: ProjectId,
    ) -> MarketplaceResult<usize> {
        let project = load_project(&*self.repository, project_id).await?;
        self.engine
            .evaluate(ProjectAction::ResolveIssue, actor, &project, self.clock.utc())?;
        let resolved = self
            .repository
            .resolve_open_issues(project_id, self.clock.utc())
            .await?;
        info!(resolved, "open issues resolved");
        Ok(resolved)
    }

    /// Lists a project's issues, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Forbidden`] unless the actor is a
    /// participant.
    pub async fn list_issues(&self, actor: Actor, project_id: ProjectId) -> MarketplaceResult<Vec<Issue>> {
        let project = load_project(&*self.repository, project_id).await?;
        ensure_participant(actor, &project)?;
        Ok(self.repository.list_issues_for_project(project_id).await?)
    }

    /// Lists an issue's comments, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::NotFound`] for an unknown issue and
    /// [`MarketplaceError::Forbidden`] unless the actor is a participant.
    pub async fn list_comments(
        &self,
        actor: Actor,
        issue_id: IssueId,
    ) -> MarketplaceResult<Vec<IssueComment>> {
        let (_, project) = self.load_issue(issue_id).await?;
        ensure_participant(actor, &project)?;
        Ok(self.repository.list_comments(issue_id).await?)
    }

    async fn load_issue(&self, issue_id: IssueId) -> MarketplaceResult<(Issue, Project)> {
        let issue = self
            .repository
            .find_issue(issue_id)
            .await?
            .ok_or_else(|| MarketplaceError::not_found("issue", issue_id.into_inner()))?;
        let project = load_project(&*self.repository, issue.project_id()).await?;
        Ok((issue, project))
    }
}

fn ensure_participant(actor: Actor, project: &Project) -> MarketplaceResult<()> {
    let user_id = actor.user_id();
    if project.is_owned_by(user_id) || project.is_assigned_to(user_id) {
        Ok(())
    } else {
        Err(MarketplaceError::Forbidden(
            "only project participants can view issues".to_owned(),
        ))
    }
}
