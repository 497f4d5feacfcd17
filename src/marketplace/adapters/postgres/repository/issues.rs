//! Issue and comment persistence.

use super::PostgresMarketplaceRepository;
use crate::marketplace::{
    adapters::postgres::{
        models::{CommentRow, IssueRow},
        schema::{issue_comments, issues},
    },
    domain::{Issue, IssueComment, IssueId, IssueStatus, ProjectId},
    ports::{IssueRepository, RepositoryError, RepositoryResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

#[async_trait]
impl IssueRepository for PostgresMarketplaceRepository {
    async fn store_issue(
        &self,
        issue: &Issue,
        opening_comment: Option<&IssueComment>,
    ) -> RepositoryResult<()> {
        let issue_row = IssueRow::from_domain(issue);
        let comment_row = opening_comment.map(CommentRow::from_domain);
        self.run(move |connection| {
            connection.transaction::<_, RepositoryError, _>(|tx| {
                diesel::insert_into(issues::table)
                    .values(&issue_row)
                    .execute(tx)?;
                if let Some(comment) = &comment_row {
                    diesel::insert_into(issue_comments::table)
                        .values(comment)
                        .execute(tx)?;
                }
                Ok(())
            })
        })
        .await
    }

    async fn find_issue(&self, id: IssueId) -> RepositoryResult<Option<Issue>> {
        self.run(move |connection| {
            issues::table
                .find(id.into_inner())
                .select(IssueRow::as_select())
                .first::<IssueRow>(connection)
                .optional()?
                .map(IssueRow::into_domain)
                .transpose()
        })
        .await
    }

    async fn update_issue(&self, issue: &Issue) -> RepositoryResult<()> {
        let issue_id = issue.id();
        let status = issue.status().as_str();
        let resolved_at = issue.resolved_at();
        self.run(move |connection| {
            let updated = diesel::update(issues::table.find(issue_id.into_inner()))
                .set((
                    issues::status.eq(status),
                    issues::resolved_at.eq(resolved_at),
                ))
                .execute(connection)?;
            if updated == 0 {
                return Err(RepositoryError::not_found("issue", issue_id.into_inner()));
            }
            Ok(())
        })
        .await
    }

    async fn list_issues_for_project(&self, project_id: ProjectId) -> RepositoryResult<Vec<Issue>> {
        self.run(move |connection| {
            issues::table
                .filter(issues::project_id.eq(project_id.into_inner()))
                .order((issues::created_at.asc(), issues::id.asc()))
                .select(IssueRow::as_select())
                .load::<IssueRow>(connection)?
                .into_iter()
                .map(IssueRow::into_domain)
                .collect()
        })
        .await
    }

    async fn store_comment(&self, comment: &IssueComment) -> RepositoryResult<()> {
        let row = CommentRow::from_domain(comment);
        let issue_id = comment.issue_id();
        self.run(move |connection| {
            connection.transaction::<_, RepositoryError, _>(|tx| {
                let status = issues::table
                    .find(issue_id.into_inner())
                    .select(issues::status)
                    .for_share()
                    .get_result::<String>(tx)
                    .optional()?
                    .ok_or_else(|| RepositoryError::not_found("issue", issue_id.into_inner()))?;
                if status == IssueStatus::Resolved.as_str() {
                    return Err(RepositoryError::IssueResolved(issue_id));
                }
                diesel::insert_into(issue_comments::table)
                    .values(&row)
                    .execute(tx)?;
                Ok(())
            })
        })
        .await
    }

    async fn list_comments(&self, issue_id: IssueId) -> RepositoryResult<Vec<IssueComment>> {
        self.run(move |connection| {
            let rows = issue_comments::table
                .filter(issue_comments::issue_id.eq(issue_id.into_inner()))
                .order((issue_comments::created_at.asc(), issue_comments::id.asc()))
                .select(CommentRow::as_select())
                .load::<CommentRow>(connection)?;
            Ok(rows.into_iter().map(CommentRow::into_domain).collect())
        })
        .await
    }

    async fn resolve_open_issues(
        &self,
        project_id: ProjectId,
        resolved_at: DateTime<Utc>,
    ) -> RepositoryResult<usize> {
        self.run(move |connection| {
            let resolved = diesel::update(
                issues::table
                    .filter(issues::project_id.eq(project_id.into_inner()))
                    .filter(issues::status.eq(IssueStatus::Open.as_str())),
            )
            .set((
                issues::status.eq(IssueStatus::Resolved.as_str()),
                issues::resolved_at.eq(Some(resolved_at)),
            ))
            .execute(connection)?;
            Ok(resolved)
        })
        .await
    }
}
