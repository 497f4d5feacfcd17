//! Database preparation helpers for `PostgreSQL` integration tests.

use super::cluster::{BoxError, PostgresCluster, TemporaryDatabase};
use diesel::{Connection, PgConnection};
use tender::marketplace::adapters::postgres::{
    DatabasePool, PostgresMarketplaceRepository, apply_migrations,
};
use tokio::runtime::Runtime;

const TEMPLATE_DB: &str = "tender_test_template";

/// Multi-threaded runtime; the repository runs queries on blocking threads.
pub fn test_runtime() -> Result<Runtime, BoxError> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .map_err(|err| Box::new(err) as BoxError)
}

fn migrate(url: &str) -> Result<(), BoxError> {
    let mut conn = PgConnection::establish(url).map_err(|err| Box::new(err) as BoxError)?;
    apply_migrations(&mut conn).map_err(|err| Box::new(err) as BoxError)?;
    Ok(())
}

/// Creates a migrated database cloned from the shared template.
pub fn migrated_database(cluster: PostgresCluster) -> Result<TemporaryDatabase, BoxError> {
    cluster.ensure_template_exists(TEMPLATE_DB, migrate)?;
    TemporaryDatabase::from_template(cluster, TEMPLATE_DB)
}

/// Repository over a fresh migrated database.
///
/// Drop the repository before the database guard so the pool's connections
/// are closed when the database is dropped.
pub fn prepare_repository(
    cluster: PostgresCluster,
) -> Result<(PostgresMarketplaceRepository, TemporaryDatabase), BoxError> {
    let database = migrated_database(cluster)?;
    let pool = DatabasePool::open(&database.url(), 4).map_err(|err| Box::new(err) as BoxError)?;
    Ok((PostgresMarketplaceRepository::new(pool), database))
}
