//! Shared fixtures for marketplace unit tests.

use std::sync::Arc;

use crate::marketplace::{
    adapters::memory::{InMemoryBlobStore, InMemoryMarketplaceRepository},
    domain::{
        Actor, Amount, LifecycleEngine, Project, ProjectDetails, ProjectTitle, Role,
        UploadPolicy, UserId,
    },
    services::Marketplace,
};
use chrono::{DateTime, TimeZone, Utc};
use rstest::fixture;

pub use crate::marketplace::adapters::memory::ManualClock;

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0)
        .single()
        .expect("valid base time")
}

#[fixture]
pub fn clock() -> ManualClock {
    ManualClock::at(base_time())
}

#[fixture]
pub fn client() -> Actor {
    Actor::new(UserId::new(), Role::Client)
}

#[fixture]
pub fn contractor() -> Actor {
    Actor::new(UserId::new(), Role::Contractor)
}

pub fn details(title: &str) -> ProjectDetails {
    ProjectDetails {
        title: ProjectTitle::new(title).expect("valid title"),
        description: "Build the thing".to_owned(),
        budget: Amount::new(1_500).expect("valid amount"),
    }
}

/// Posts an open project owned by `owner` with the given bid deadline.
pub fn open_project(
    owner: Actor,
    bid_deadline: Option<DateTime<Utc>>,
    clock: &ManualClock,
) -> Project {
    Project::post(owner.user_id(), details("Logo redesign"), bid_deadline, clock)
}

pub type TestMarketplace = Marketplace<InMemoryMarketplaceRepository, InMemoryBlobStore, ManualClock>;

/// In-memory marketplace with handles on its ports.
pub struct Harness {
    pub blobs: Arc<InMemoryBlobStore>,
    pub clock: Arc<ManualClock>,
    pub marketplace: TestMarketplace,
}

#[fixture]
pub fn harness() -> Harness {
    let blobs = Arc::new(InMemoryBlobStore::new());
    let clock = Arc::new(ManualClock::at(base_time()));
    let marketplace = Marketplace::new(
        Arc::new(InMemoryMarketplaceRepository::new()),
        Arc::clone(&blobs),
        Arc::clone(&clock),
        LifecycleEngine::default(),
        UploadPolicy::default(),
    );
    Harness {
        blobs,
        clock,
        marketplace,
    }
}
