//! `PostgreSQL` repository implementation for marketplace storage.
//!
//! Each port method runs as one unit of work on a scoped connection.
//! Conditional writes filter on the expected status and report a missed
//! match as a stale write; uniqueness invariants are backed by constraints
//! whose violations map to semantic repository errors.

mod attachments;
mod issues;
mod projects;
mod proposals;
mod ratings;
mod users;

use super::{
    models::ProjectChangeset,
    pool::DatabasePool,
    schema::projects as projects_table,
};
use crate::marketplace::{
    domain::{Project, ProjectId, ProjectStatus},
    ports::{RepositoryError, RepositoryResult},
};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL`-backed marketplace repository.
#[derive(Debug, Clone)]
pub struct PostgresMarketplaceRepository {
    pool: DatabasePool,
}

impl PostgresMarketplaceRepository {
    /// Creates a new repository from an opened pool.
    #[must_use]
    pub const fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Returns the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    async fn run<F, T>(&self, work: F) -> RepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        self.pool.run(work).await
    }
}

impl From<DieselError> for RepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

/// Returns the violated constraint name for unique violations.
fn unique_violation(err: &DieselError) -> Option<String> {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            info.constraint_name().map(str::to_owned)
        }
        _ => None,
    }
}

/// Locks a project row and checks that it is still in `expected`.
fn lock_project_in_status(
    connection: &mut PgConnection,
    project_id: ProjectId,
    expected: ProjectStatus,
) -> RepositoryResult<()> {
    let status = projects_table::table
        .find(project_id.into_inner())
        .select(projects_table::status)
        .for_update()
        .get_result::<String>(connection)
        .optional()?;
    match status {
        None => Err(RepositoryError::not_found("project", project_id.into_inner())),
        Some(stored) if stored == expected.as_str() => Ok(()),
        Some(_) => Err(RepositoryError::StaleProject {
            project_id,
            expected,
        }),
    }
}

/// Explains why a conditional project write matched no row.
fn missed_project_write(
    connection: &mut PgConnection,
    project_id: ProjectId,
    expected: ProjectStatus,
) -> RepositoryResult<RepositoryError> {
    let exists = diesel::select(diesel::dsl::exists(
        projects_table::table.find(project_id.into_inner()),
    ))
    .get_result::<bool>(connection)?;
    if exists {
        Ok(RepositoryError::StaleProject {
            project_id,
            expected,
        })
    } else {
        Ok(RepositoryError::not_found("project", project_id.into_inner()))
    }
}

/// Writes the project's mutable columns if its status is still `expected`.
fn update_project_in_status(
    connection: &mut PgConnection,
    project: &Project,
    expected: ProjectStatus,
) -> RepositoryResult<()> {
    let changes = ProjectChangeset::from_domain(project);
    let updated = diesel::update(
        projects_table::table
            .filter(projects_table::id.eq(project.id().into_inner()))
            .filter(projects_table::status.eq(expected.as_str())),
    )
    .set(&changes)
    .execute(connection)?;
    if updated == 1 {
        return Ok(());
    }
    Err(missed_project_write(connection, project.id(), expected)?)
}
