//! Runs the repository contract against the `PostgreSQL` adapter.

use super::cluster::{PostgresCluster, postgres_cluster};
use super::helpers::{prepare_repository, test_runtime};
use crate::repository_contract as contract;
use rstest::rstest;
use std::future::Future;
use tender::marketplace::adapters::postgres::PostgresMarketplaceRepository;

fn with_repository<F, Fut>(cluster: Option<PostgresCluster>, check: F)
where
    F: FnOnce(PostgresMarketplaceRepository) -> Fut,
    Fut: Future<Output = ()>,
{
    let Some(running) = cluster else {
        eprintln!("SKIP-TEST-CLUSTER: repository contract skipped");
        return;
    };
    let (repository, _database) = prepare_repository(running).expect("prepare repository");
    let runtime = test_runtime().expect("test runtime");
    runtime.block_on(check(repository));
}

#[rstest]
fn usernames_are_unique(postgres_cluster: Option<PostgresCluster>) {
    with_repository(postgres_cluster, contract::usernames_are_unique);
}

#[rstest]
fn conditional_project_writes(postgres_cluster: Option<PostgresCluster>) {
    with_repository(postgres_cluster, contract::conditional_project_writes);
}

#[rstest]
fn selection_rejects_remaining_pending(postgres_cluster: Option<PostgresCluster>) {
    with_repository(postgres_cluster, contract::selection_rejects_remaining_pending);
}

#[rstest]
fn versions_are_unique_per_partition(postgres_cluster: Option<PostgresCluster>) {
    with_repository(postgres_cluster, contract::versions_are_unique_per_partition);
}

#[rstest]
fn upload_companions_commit_together(postgres_cluster: Option<PostgresCluster>) {
    with_repository(postgres_cluster, contract::upload_companions_commit_together);
}

#[rstest]
fn resolved_issues_refuse_comments(postgres_cluster: Option<PostgresCluster>) {
    with_repository(postgres_cluster, contract::resolved_issues_refuse_comments);
}

#[rstest]
fn finalizing_sweeps_open_issues(postgres_cluster: Option<PostgresCluster>) {
    with_repository(postgres_cluster, contract::finalizing_sweeps_open_issues);
}

#[rstest]
fn ratings_are_unique_per_pair(postgres_cluster: Option<PostgresCluster>) {
    with_repository(postgres_cluster, contract::ratings_are_unique_per_pair);
}

#[rstest]
fn deleting_cascades_to_children(postgres_cluster: Option<PostgresCluster>) {
    with_repository(postgres_cluster, contract::deleting_cascades_to_children);
}

#[rstest]
fn open_listing_honours_deadlines(postgres_cluster: Option<PostgresCluster>) {
    with_repository(postgres_cluster, contract::open_listing_honours_deadlines);
}
