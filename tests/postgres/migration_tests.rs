//! Schema ledger behaviour.

use super::cluster::{PostgresCluster, TemporaryDatabase, postgres_cluster};
use super::helpers::{migrated_database, test_runtime};
use diesel::pg::Pg;
use diesel::{Connection, PgConnection};
use diesel::migration::MigrationSource;
use rstest::rstest;
use tender::marketplace::adapters::postgres::{
    DatabasePool, DatabasePoolError, MIGRATIONS, apply_migrations,
};

#[rstest]
fn fresh_database_applies_every_migration_once(postgres_cluster: Option<PostgresCluster>) {
    let Some(cluster) = postgres_cluster else {
        eprintln!("SKIP-TEST-CLUSTER: migration test skipped");
        return;
    };
    let database = TemporaryDatabase::from_template(cluster, "template1").expect("empty database");
    let mut conn = PgConnection::establish(&database.url()).expect("connect");

    let first = apply_migrations(&mut conn).expect("first run");
    let expected: Vec<String> = MigrationSource::<Pg>::migrations(&MIGRATIONS)
        .expect("embedded migrations")
        .iter()
        .map(|migration| migration.name().version().to_string())
        .collect();
    assert!(!expected.is_empty());
    assert_eq!(first, expected);

    let second = apply_migrations(&mut conn).expect("second run");
    assert!(second.is_empty());
}

#[rstest]
fn template_clones_are_already_migrated(postgres_cluster: Option<PostgresCluster>) {
    let Some(cluster) = postgres_cluster else {
        eprintln!("SKIP-TEST-CLUSTER: migration test skipped");
        return;
    };
    let database = migrated_database(cluster).expect("migrated database");
    let mut conn = PgConnection::establish(&database.url()).expect("connect");
    assert!(apply_migrations(&mut conn).expect("rerun").is_empty());
}

#[rstest]
fn closed_pool_refuses_work(postgres_cluster: Option<PostgresCluster>) {
    let Some(cluster) = postgres_cluster else {
        eprintln!("SKIP-TEST-CLUSTER: pool test skipped");
        return;
    };
    let database = migrated_database(cluster).expect("migrated database");
    let runtime = test_runtime().expect("test runtime");
    let pool = DatabasePool::open(&database.url(), 1).expect("open pool");

    let applied: Result<Vec<String>, DatabasePoolError> = runtime.block_on(pool.run(
        |conn| Ok(apply_migrations(conn).expect("rerun through the pool")),
    ));
    assert!(applied.expect("pool runs work").is_empty());

    pool.close();
    assert!(pool.is_closed());
    assert!(matches!(pool.acquire(), Err(DatabasePoolError::Closed)));
    drop(pool);
}
