//! Runs the repository contract against the in-memory adapter.

use crate::repository_contract as contract;
use rstest::{fixture, rstest};
use tender::marketplace::adapters::memory::InMemoryMarketplaceRepository;

#[fixture]
fn repo() -> InMemoryMarketplaceRepository {
    InMemoryMarketplaceRepository::new()
}

#[rstest]
#[tokio::test]
async fn usernames_are_unique(repo: InMemoryMarketplaceRepository) {
    contract::usernames_are_unique(repo).await;
}

#[rstest]
#[tokio::test]
async fn conditional_project_writes(repo: InMemoryMarketplaceRepository) {
    contract::conditional_project_writes(repo).await;
}

#[rstest]
#[tokio::test]
async fn selection_rejects_remaining_pending(repo: InMemoryMarketplaceRepository) {
    contract::selection_rejects_remaining_pending(repo).await;
}

#[rstest]
#[tokio::test]
async fn versions_are_unique_per_partition(repo: InMemoryMarketplaceRepository) {
    contract::versions_are_unique_per_partition(repo).await;
}

#[rstest]
#[tokio::test]
async fn upload_companions_commit_together(repo: InMemoryMarketplaceRepository) {
    contract::upload_companions_commit_together(repo).await;
}

#[rstest]
#[tokio::test]
async fn resolved_issues_refuse_comments(repo: InMemoryMarketplaceRepository) {
    contract::resolved_issues_refuse_comments(repo).await;
}

#[rstest]
#[tokio::test]
async fn finalizing_sweeps_open_issues(repo: InMemoryMarketplaceRepository) {
    contract::finalizing_sweeps_open_issues(repo).await;
}

#[rstest]
#[tokio::test]
async fn ratings_are_unique_per_pair(repo: InMemoryMarketplaceRepository) {
    contract::ratings_are_unique_per_pair(repo).await;
}

#[rstest]
#[tokio::test]
async fn deleting_cascades_to_children(repo: InMemoryMarketplaceRepository) {
    contract::deleting_cascades_to_children(repo).await;
}

#[rstest]
#[tokio::test]
async fn open_listing_honours_deadlines(repo: InMemoryMarketplaceRepository) {
    contract::open_listing_honours_deadlines(repo).await;
}
