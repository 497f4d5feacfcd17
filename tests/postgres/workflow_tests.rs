//! Services running over the `PostgreSQL` repository and filesystem blobs.

use super::cluster::{PostgresCluster, postgres_cluster};
use super::helpers::{prepare_repository, test_runtime};
use crate::repository_contract::register;
use crate::test_helpers::{ManualClock, base_time};
use camino::Utf8PathBuf;
use chrono::Duration;
use rstest::rstest;
use std::sync::Arc;
use tender::marketplace::{
    adapters::{fs::CapStdBlobStore, postgres::PostgresMarketplaceRepository},
    domain::{
        AttachmentKind, IssueStatus, LifecycleEngine, ProjectStatus, Role, UploadPolicy,
        UploadedFile,
    },
    services::{
        Marketplace, MarketplaceError, ProjectDraft, RateCounterpartRequest,
        SubmitProposalRequest,
    },
};

struct ScratchDir(Utf8PathBuf);

impl Drop for ScratchDir {
    fn drop(&mut self) {
        drop(std::fs::remove_dir_all(&self.0));
    }
}

#[rstest]
fn project_walkthrough_persists_through_postgres(postgres_cluster: Option<PostgresCluster>) {
    let Some(cluster) = postgres_cluster else {
        eprintln!("SKIP-TEST-CLUSTER: workflow test skipped");
        return;
    };
    let (repository, _database) = prepare_repository(cluster).expect("prepare repository");
    let runtime = test_runtime().expect("test runtime");
    runtime.block_on(walkthrough(repository));
}

async fn walkthrough(repository: PostgresMarketplaceRepository) {
    let scratch = ScratchDir(
        Utf8PathBuf::from_path_buf(std::env::temp_dir())
            .expect("utf-8 temp dir")
            .join(format!("tender-pg-blobs-{}", uuid::Uuid::new_v4().simple())),
    );
    let clock = Arc::new(ManualClock::at(base_time()));
    let repo = Arc::new(repository);
    let blobs = Arc::new(CapStdBlobStore::open(scratch.0.clone()).expect("blob root"));
    let market = Marketplace::new(
        Arc::clone(&repo),
        blobs,
        Arc::clone(&clock),
        LifecycleEngine::default(),
        UploadPolicy::default(),
    );

    let client = register(&*repo, Role::Client, &clock).await;
    let contractor = register(&*repo, Role::Contractor, &clock).await;
    let rival = register(&*repo, Role::Contractor, &clock).await;

    let project = market
        .projects
        .create_project(
            client,
            ProjectDraft::new("Storefront", "Shop theme", 2_000)
                .with_bid_deadline(base_time() + Duration::days(1)),
        )
        .await
        .expect("project is posted");
    let winning = market
        .proposals
        .submit_proposal(
            contractor,
            SubmitProposalRequest::new(project.id(), "Shopify veteran", 1_800)
                .with_document(UploadedFile::new("cv.pdf", b"%PDF-1.7".to_vec())),
        )
        .await
        .expect("proposal with document");
    market
        .proposals
        .submit_proposal(rival, SubmitProposalRequest::new(project.id(), "Cheaper", 1_200))
        .await
        .expect("rival proposal");

    clock.advance(Duration::days(1));
    let selected = market
        .projects
        .select_contractor(client, project.id(), winning.id())
        .await
        .expect("selection after bidding closes");
    assert_eq!(selected.rejected_count, 1);

    let deliverable = market
        .files
        .upload_file(contractor, project.id(), UploadedFile::new("theme.zip", b"v1".to_vec()))
        .await
        .expect("deliverable");
    assert_eq!(deliverable.kind(), AttachmentKind::Closure);
    let fetched = market
        .files
        .fetch_attachment(client, deliverable.id())
        .await
        .expect("owner downloads the deliverable");
    assert_eq!(fetched.bytes, b"v1".to_vec());
    let hidden = market
        .files
        .fetch_attachment(rival, deliverable.id())
        .await
        .expect_err("rivals cannot see deliverables");
    assert!(matches!(hidden, MarketplaceError::Forbidden(_)));

    let issue = market
        .issues
        .open_issue(client, project.id(), "Checkout", "Cart total is wrong")
        .await
        .expect("issue while reviewing");
    let closed = market
        .projects
        .accept_deliverable(client, project.id())
        .await
        .expect("deliverable accepted");
    assert_eq!(closed.status(), ProjectStatus::Closed);
    let issues = market
        .issues
        .list_issues(client, project.id())
        .await
        .expect("issues listed");
    assert!(
        issues
            .iter()
            .any(|listed| listed.id() == issue.id() && listed.status() == IssueStatus::Resolved)
    );

    market
        .ratings
        .rate_counterpart(
            client,
            RateCounterpartRequest {
                project_id: project.id(),
                target_role: Role::Contractor,
                quality: 5,
                communication: 5,
                timeliness: 4,
                comment: None,
            },
        )
        .await
        .expect("client rates contractor");
    let summary = market
        .ratings
        .summary(contractor.user_id(), Role::Contractor)
        .await
        .expect("summary");
    assert_eq!(summary.count, 1);
    assert_eq!(summary.timeliness, Some(4.0));
}
