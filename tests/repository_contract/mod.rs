//! Behaviour every marketplace repository adapter must share.
//!
//! Each check takes a fresh repository and panics on the first deviation.

use crate::test_helpers::{ManualClock, base_time};
use chrono::Duration;
use tender::marketplace::{
    domain::{
        Actor, Amount, Attachment, AttachmentData, AttachmentId, AttachmentKind, ContentDigest,
        CredentialHash, FileVersion, Issue, IssueComment, IssueStatus, Project, ProjectDetails,
        ProjectStatus, ProjectTitle, Proposal, ProposalStatus, ProposalTerms, Rating,
        RatingParties, RatingScores, Role, StoredName, User, Username, VersionPartition,
    },
    ports::{ContractorSelection, MarketplaceRepository, RepositoryError, UploadCompanion},
};

/// Registers a user with a random username and returns its actor.
pub async fn register<R: MarketplaceRepository>(repo: &R, role: Role, clock: &ManualClock) -> Actor {
    let username = Username::new(format!("user-{}", uuid::Uuid::new_v4().simple()))
        .expect("valid username");
    let hash = CredentialHash::new("argon2id$stub").expect("valid hash");
    let user = User::register(username, role, hash, clock);
    repo.store_user(&user).await.expect("store user");
    Actor::new(user.id(), role)
}

pub async fn post<R: MarketplaceRepository>(
    repo: &R,
    owner: Actor,
    deadline: Option<Duration>,
    clock: &ManualClock,
) -> Project {
    let details = ProjectDetails {
        title: ProjectTitle::new("Landing page").expect("valid title"),
        description: "Single page".to_owned(),
        budget: Amount::new(800).expect("valid amount"),
    };
    let project = Project::post(
        owner.user_id(),
        details,
        deadline.map(|offset| base_time() + offset),
        clock,
    );
    repo.store_project(&project).await.expect("store project");
    project
}

pub async fn bid<R: MarketplaceRepository>(
    repo: &R,
    project: &Project,
    bidder: Actor,
    clock: &ManualClock,
) -> Proposal {
    let terms = ProposalTerms::new("Hire me", 700).expect("valid terms");
    let proposal = Proposal::submit(project.id(), bidder.user_id(), terms, None, clock);
    repo.store_proposal(&proposal, ProjectStatus::Open)
        .await
        .expect("store proposal");
    proposal
}

fn attachment(project: &Project, uploader: Actor, number: u32, clock: &ManualClock) -> Attachment {
    let version = FileVersion::new(i64::from(number)).expect("positive version");
    let bytes = format!("content v{version}");
    Attachment::new(AttachmentData {
        id: AttachmentId::new(),
        project_id: project.id(),
        uploader_id: uploader.user_id(),
        uploader_role: uploader.role(),
        kind: AttachmentKind::Closure,
        version,
        original_name: "site.zip".to_owned(),
        stored_name: StoredName::generate(project.id(), version, base_time(), "site.zip"),
        digest: ContentDigest::of(bytes.as_bytes()),
        size_bytes: u64::try_from(bytes.len()).expect("small length"),
        uploaded_at: mockable::Clock::utc(clock),
    })
}

/// Accepts `proposal` and returns the assigned project with the rejection count.
async fn select<R: MarketplaceRepository>(
    repo: &R,
    project: &Project,
    proposal: &Proposal,
    clock: &ManualClock,
) -> (Project, usize) {
    let mut accepted = proposal.clone();
    accepted.accept(clock).expect("pending proposal");
    let mut assigned = project.clone();
    assigned
        .assign_contractor(accepted.id(), accepted.contractor_id(), clock)
        .expect("open project");
    let rejected = repo
        .record_selection(ContractorSelection {
            project: &assigned,
            expected: ProjectStatus::Open,
            accepted: &accepted,
        })
        .await
        .expect("selection is recorded");
    (assigned, rejected)
}

pub async fn usernames_are_unique<R: MarketplaceRepository>(repo: R) {
    let clock = ManualClock::at(base_time());
    let hash = CredentialHash::new("argon2id$stub").expect("valid hash");
    let name = Username::new("ada").expect("valid username");
    let first = User::register(name.clone(), Role::Client, hash.clone(), &clock);
    let second = User::register(name.clone(), Role::Contractor, hash, &clock);
    repo.store_user(&first).await.expect("first registration");

    let err = repo.store_user(&second).await.expect_err("name is taken");

    assert!(matches!(err, RepositoryError::DuplicateUsername(_)));
    let found = repo
        .find_user_by_username(&name)
        .await
        .expect("lookup")
        .expect("user exists");
    assert_eq!(found, first);
}

pub async fn conditional_project_writes<R: MarketplaceRepository>(repo: R) {
    let clock = ManualClock::at(base_time());
    let owner = register(&repo, Role::Client, &clock).await;
    let mut project = post(&repo, owner, None, &clock).await;
    project.apply_details(
        ProjectDetails {
            title: ProjectTitle::new("Renamed").expect("valid title"),
            description: String::new(),
            budget: Amount::new(1).expect("valid amount"),
        },
        &clock,
    );

    let stale = repo
        .update_project(&project, ProjectStatus::InProgress)
        .await
        .expect_err("stored project is open");
    repo.update_project(&project, ProjectStatus::Open)
        .await
        .expect("status matches");

    assert!(matches!(stale, RepositoryError::StaleProject { .. }));
    let stored = repo
        .find_project(project.id())
        .await
        .expect("lookup")
        .expect("project exists");
    assert_eq!(stored, project);
}

pub async fn selection_rejects_remaining_pending<R: MarketplaceRepository>(repo: R) {
    let clock = ManualClock::at(base_time());
    let owner = register(&repo, Role::Client, &clock).await;
    let winner = register(&repo, Role::Contractor, &clock).await;
    let loser = register(&repo, Role::Contractor, &clock).await;
    let project = post(&repo, owner, None, &clock).await;
    let winning = bid(&repo, &project, winner, &clock).await;
    let losing = bid(&repo, &project, loser, &clock).await;
    let mut withdrawn = bid(&repo, &project, loser, &clock).await;
    withdrawn.reject(&clock).expect("pending proposal");
    repo.update_proposal(&withdrawn, ProposalStatus::Pending)
        .await
        .expect("reject one proposal");
    clock.advance(Duration::hours(1));

    let (assigned, rejected) = select(&repo, &project, &winning, &clock).await;

    assert_eq!(rejected, 1);
    let proposals = repo
        .list_proposals_for_project(project.id())
        .await
        .expect("list proposals");
    let status_of = |id| {
        proposals
            .iter()
            .find(|proposal| proposal.id() == id)
            .map(Proposal::status)
    };
    assert_eq!(status_of(winning.id()), Some(ProposalStatus::Accepted));
    assert_eq!(status_of(losing.id()), Some(ProposalStatus::Rejected));
    assert_eq!(status_of(withdrawn.id()), Some(ProposalStatus::Rejected));
    let stored = repo
        .find_project(project.id())
        .await
        .expect("lookup")
        .expect("project exists");
    assert_eq!(stored.status(), ProjectStatus::InProgress);
    assert_eq!(stored.contractor_id(), Some(winner.user_id()));
    assert_eq!(stored, assigned);

    let mut second = losing.clone();
    second.accept(&clock).expect("stale copy is still pending");
    let again = repo
        .record_selection(ContractorSelection {
            project: &assigned,
            expected: ProjectStatus::Open,
            accepted: &second,
        })
        .await
        .expect_err("project already in progress");
    assert!(matches!(again, RepositoryError::StaleProject { .. }));
}

pub async fn versions_are_unique_per_partition<R: MarketplaceRepository>(repo: R) {
    let clock = ManualClock::at(base_time());
    let owner = register(&repo, Role::Client, &clock).await;
    let hired = register(&repo, Role::Contractor, &clock).await;
    let project = post(&repo, owner, None, &clock).await;
    let first = attachment(&project, hired, 1, &clock);
    repo.record_upload(&first, UploadCompanion::None)
        .await
        .expect("first version");

    let clash = repo
        .record_upload(&attachment(&project, hired, 1, &clock), UploadCompanion::None)
        .await
        .expect_err("version taken");
    clock.advance(Duration::minutes(1));
    let second = attachment(&project, hired, 2, &clock);
    repo.record_upload(&second, UploadCompanion::None)
        .await
        .expect("second version");

    assert!(matches!(
        clash,
        RepositoryError::AttachmentVersionConflict { .. }
    ));
    let partition = VersionPartition {
        project_id: project.id(),
        uploader_id: hired.user_id(),
        kind: AttachmentKind::Closure,
    };
    let latest = repo
        .latest_attachment_version(partition)
        .await
        .expect("latest version");
    assert_eq!(latest.map(FileVersion::value), Some(2));
    let versions = repo
        .list_attachment_versions(partition)
        .await
        .expect("list versions");
    assert_eq!(versions, vec![first, second]);
}

pub async fn upload_companions_commit_together<R: MarketplaceRepository>(repo: R) {
    let clock = ManualClock::at(base_time());
    let owner = register(&repo, Role::Client, &clock).await;
    let hired = register(&repo, Role::Contractor, &clock).await;
    let project = post(&repo, owner, None, &clock).await;
    let proposal = bid(&repo, &project, hired, &clock).await;
    let (assigned, _) = select(&repo, &project, &proposal, &clock).await;
    let mut reviewing = assigned.clone();
    reviewing.submit_deliverable(&clock).expect("in progress");

    let stale = repo
        .record_upload(
            &attachment(&project, hired, 1, &clock),
            UploadCompanion::ProjectTransition {
                project: &reviewing,
                expected: ProjectStatus::InRevision,
            },
        )
        .await
        .expect_err("project is not in revision");
    repo.record_upload(
        &attachment(&project, hired, 1, &clock),
        UploadCompanion::ProjectTransition {
            project: &reviewing,
            expected: ProjectStatus::InProgress,
        },
    )
    .await
    .expect("deliverable with transition");

    assert!(matches!(stale, RepositoryError::StaleProject { .. }));
    let files = repo
        .list_attachments_for_project(project.id())
        .await
        .expect("list attachments");
    assert_eq!(files.len(), 1);
    let stored = repo
        .find_project(project.id())
        .await
        .expect("lookup")
        .expect("project exists");
    assert_eq!(stored.status(), ProjectStatus::Reviewing);
}

pub async fn resolved_issues_refuse_comments<R: MarketplaceRepository>(repo: R) {
    let clock = ManualClock::at(base_time());
    let owner = register(&repo, Role::Client, &clock).await;
    let project = post(&repo, owner, None, &clock).await;
    let mut issue =
        Issue::open(project.id(), owner.user_id(), "Typos", "Page two", &clock).expect("issue");
    let opening =
        IssueComment::write(issue.id(), owner.user_id(), "Page two", &clock).expect("comment");
    repo.store_issue(&issue, Some(&opening))
        .await
        .expect("store issue");
    issue.resolve(&clock);
    repo.update_issue(&issue).await.expect("resolve issue");

    let late = IssueComment::write(issue.id(), owner.user_id(), "One more", &clock)
        .expect("comment");
    let err = repo.store_comment(&late).await.expect_err("issue resolved");

    assert!(matches!(err, RepositoryError::IssueResolved(_)));
    let comments = repo.list_comments(issue.id()).await.expect("comments");
    assert_eq!(comments, vec![opening]);
}

pub async fn finalizing_sweeps_open_issues<R: MarketplaceRepository>(repo: R) {
    let clock = ManualClock::at(base_time());
    let owner = register(&repo, Role::Client, &clock).await;
    let hired = register(&repo, Role::Contractor, &clock).await;
    let project = post(&repo, owner, None, &clock).await;
    let proposal = bid(&repo, &project, hired, &clock).await;
    let (mut assigned, _) = select(&repo, &project, &proposal, &clock).await;
    for title in ["Header", "Footer"] {
        let issue = Issue::open(project.id(), owner.user_id(), title, "", &clock).expect("issue");
        repo.store_issue(&issue, None).await.expect("store issue");
    }
    assigned.submit_deliverable(&clock).expect("in progress");
    repo.update_project(&assigned, ProjectStatus::InProgress)
        .await
        .expect("reviewing");
    clock.advance(Duration::days(1));
    assigned.close(&clock).expect("reviewing");

    let swept = repo
        .finalize_project(&assigned, ProjectStatus::Reviewing)
        .await
        .expect("finalize");

    assert_eq!(swept, 2);
    let issues = repo
        .list_issues_for_project(project.id())
        .await
        .expect("issues");
    assert!(issues.iter().all(|issue| {
        issue.status() == IssueStatus::Resolved && issue.resolved_at() == assigned.closed_at()
    }));
}

pub async fn ratings_are_unique_per_pair<R: MarketplaceRepository>(repo: R) {
    let clock = ManualClock::at(base_time());
    let owner = register(&repo, Role::Client, &clock).await;
    let hired = register(&repo, Role::Contractor, &clock).await;
    let project = post(&repo, owner, None, &clock).await;
    let parties = RatingParties {
        project_id: project.id(),
        rater_id: owner.user_id(),
        rater_role: Role::Client,
        target_id: hired.user_id(),
        target_role: Role::Contractor,
    };
    let scores = RatingScores::new(4, 5, 3).expect("valid scores");
    let rating = Rating::record(parties, scores, Some("Great".to_owned()), &clock);
    repo.store_rating(&rating).await.expect("first rating");

    let again = Rating::record(parties, scores, None, &clock);
    let err = repo.store_rating(&again).await.expect_err("pair already rated");

    assert!(matches!(err, RepositoryError::DuplicateRating { .. }));
    let found = repo
        .find_rating(project.id(), owner.user_id(), hired.user_id())
        .await
        .expect("lookup");
    assert_eq!(found, Some(rating.clone()));
    let received = repo
        .list_ratings_for_target(hired.user_id(), Role::Contractor)
        .await
        .expect("list ratings");
    assert_eq!(received, vec![rating]);
}

pub async fn deleting_cascades_to_children<R: MarketplaceRepository>(repo: R) {
    let clock = ManualClock::at(base_time());
    let owner = register(&repo, Role::Client, &clock).await;
    let hired = register(&repo, Role::Contractor, &clock).await;
    let project = post(&repo, owner, None, &clock).await;
    let proposal = bid(&repo, &project, hired, &clock).await;
    repo.record_upload(&attachment(&project, owner, 1, &clock), UploadCompanion::None)
        .await
        .expect("attachment");

    repo.delete_project(project.id(), ProjectStatus::Open)
        .await
        .expect("delete");

    assert_eq!(repo.find_project(project.id()).await.expect("lookup"), None);
    assert_eq!(repo.find_proposal(proposal.id()).await.expect("lookup"), None);
    assert!(repo
        .list_attachments_for_project(project.id())
        .await
        .expect("list attachments")
        .is_empty());
}

pub async fn open_listing_honours_deadlines<R: MarketplaceRepository>(repo: R) {
    let clock = ManualClock::at(base_time());
    let owner = register(&repo, Role::Client, &clock).await;
    let undated = post(&repo, owner, None, &clock).await;
    clock.advance(Duration::minutes(1));
    let later = post(&repo, owner, Some(Duration::days(1)), &clock).await;
    let lapsed = post(&repo, owner, Some(Duration::minutes(1)), &clock).await;

    let open = repo
        .list_projects_open_for_bidding(base_time() + Duration::minutes(1))
        .await
        .expect("open projects");

    let ids: Vec<_> = open.iter().map(Project::id).collect();
    assert_eq!(ids, vec![later.id(), undated.id()]);
    assert!(!ids.contains(&lapsed.id()));
    let mine = repo
        .list_projects_for_client(owner.user_id())
        .await
        .expect("client projects");
    assert_eq!(mine.len(), 3);
}
