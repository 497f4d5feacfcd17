//! Project persistence.

use super::{
    PostgresMarketplaceRepository, lock_project_in_status, missed_project_write,
    update_project_in_status,
};
use crate::marketplace::{
    adapters::postgres::{
        models::ProjectRow,
        schema::{issues, projects},
    },
    domain::{IssueStatus, Project, ProjectId, ProjectStatus, UserId},
    ports::{ProjectRepository, RepositoryError, RepositoryResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

#[async_trait]
impl ProjectRepository for PostgresMarketplaceRepository {
    async fn store_project(&self, project: &Project) -> RepositoryResult<()> {
        let row = ProjectRow::from_domain(project);
        self.run(move |connection| {
            diesel::insert_into(projects::table)
                .values(&row)
                .execute(connection)?;
            Ok(())
        })
        .await
    }

    async fn find_project(&self, id: ProjectId) -> RepositoryResult<Option<Project>> {
        self.run(move |connection| {
            projects::table
                .find(id.into_inner())
                .select(ProjectRow::as_select())
                .first::<ProjectRow>(connection)
                .optional()?
                .map(ProjectRow::into_domain)
                .transpose()
        })
        .await
    }

    async fn update_project(
        &self,
        project: &Project,
        expected: ProjectStatus,
    ) -> RepositoryResult<()> {
        let updated = project.clone();
        self.run(move |connection| update_project_in_status(connection, &updated, expected))
            .await
    }

    async fn delete_project(&self, id: ProjectId, expected: ProjectStatus) -> RepositoryResult<()> {
        self.run(move |connection| {
            let deleted = diesel::delete(
                projects::table
                    .filter(projects::id.eq(id.into_inner()))
                    .filter(projects::status.eq(expected.as_str())),
            )
            .execute(connection)?;
            if deleted == 1 {
                return Ok(());
            }
            Err(missed_project_write(connection, id, expected)?)
        })
        .await
    }

    async fn list_projects_for_client(&self, client_id: UserId) -> RepositoryResult<Vec<Project>> {
        self.run(move |connection| {
            projects::table
                .filter(projects::client_id.eq(client_id.into_inner()))
                .order((projects::created_at.desc(), projects::id.desc()))
                .select(ProjectRow::as_select())
                .load::<ProjectRow>(connection)?
                .into_iter()
                .map(ProjectRow::into_domain)
                .collect()
        })
        .await
    }

    async fn list_projects_open_for_bidding(
        &self,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Vec<Project>> {
        self.run(move |connection| {
            projects::table
                .filter(projects::status.eq(ProjectStatus::Open.as_str()))
                .filter(
                    projects::bid_deadline
                        .is_null()
                        .or(projects::bid_deadline.gt(now)),
                )
                .order((projects::created_at.desc(), projects::id.desc()))
                .select(ProjectRow::as_select())
                .load::<ProjectRow>(connection)?
                .into_iter()
                .map(ProjectRow::into_domain)
                .collect()
        })
        .await
    }

    async fn finalize_project(
        &self,
        project: &Project,
        expected: ProjectStatus,
    ) -> RepositoryResult<usize> {
        let closed = project.clone();
        self.run(move |connection| {
            connection.transaction::<_, RepositoryError, _>(|tx| {
                lock_project_in_status(tx, closed.id(), expected)?;
                let resolved_at = closed.closed_at().unwrap_or_else(|| closed.updated_at());
                let swept = diesel::update(
                    issues::table
                        .filter(issues::project_id.eq(closed.id().into_inner()))
                        .filter(issues::status.eq(IssueStatus::Open.as_str())),
                )
                .set((
                    issues::status.eq(IssueStatus::Resolved.as_str()),
                    issues::resolved_at.eq(Some(resolved_at)),
                ))
                .execute(tx)?;
                update_project_in_status(tx, &closed, expected)?;
                Ok(swept)
            })
        })
        .await
    }
}
