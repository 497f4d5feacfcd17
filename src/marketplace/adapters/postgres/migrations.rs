//! Embedded schema migrations.

use diesel::PgConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use thiserror::Error;
use tracing::info;

/// Every migration under `migrations/`, embedded at compile time.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// A pending migration failed to apply.
#[derive(Debug, Error)]
#[error("failed to apply migrations: {0}")]
pub struct MigrationError(#[source] Box<dyn std::error::Error + Send + Sync>);

/// Applies every pending migration and returns the versions applied by this
/// call, oldest first.
///
/// # Errors
///
/// Returns [`MigrationError`] for the first migration that fails; earlier
/// migrations stay applied.
pub fn apply_migrations(connection: &mut PgConnection) -> Result<Vec<String>, MigrationError> {
    let applied: Vec<String> = connection
        .run_pending_migrations(MIGRATIONS)
        .map_err(MigrationError)?
        .iter()
        .map(ToString::to_string)
        .collect();
    for version in &applied {
        info!(version = %version, "applied migration");
    }
    Ok(applied)
}
