//! Shared world state for project lifecycle BDD scenarios.

use std::collections::HashMap;
use std::sync::Arc;

use crate::test_helpers::{ManualClock, base_time, new_client, new_contractor};
use rstest::fixture;
use tender::marketplace::{
    adapters::memory::{InMemoryBlobStore, InMemoryMarketplaceRepository},
    domain::{Actor, Attachment, LifecycleEngine, Project, Proposal, UploadPolicy},
    services::{Marketplace, MarketplaceError, MarketplaceResult},
};

/// Marketplace type used by the BDD world.
pub type TestMarketplace =
    Marketplace<InMemoryMarketplaceRepository, InMemoryBlobStore, ManualClock>;

/// Scenario world for project lifecycle behaviour tests.
pub struct MarketWorld {
    pub marketplace: TestMarketplace,
    pub clock: Arc<ManualClock>,
    pub client: Actor,
    pub contractors: HashMap<String, Actor>,
    pub project: Option<Project>,
    pub proposals: HashMap<String, Proposal>,
    pub last_upload: Option<Attachment>,
    pub last_error: Option<MarketplaceError>,
}

impl MarketWorld {
    /// Creates a world over empty in-memory adapters.
    #[must_use]
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::at(base_time()));
        let marketplace = Marketplace::new(
            Arc::new(InMemoryMarketplaceRepository::new()),
            Arc::new(InMemoryBlobStore::new()),
            Arc::clone(&clock),
            LifecycleEngine::default(),
            UploadPolicy::default(),
        );
        Self {
            marketplace,
            clock,
            client: new_client(),
            contractors: HashMap::new(),
            project: None,
            proposals: HashMap::new(),
            last_upload: None,
            last_error: None,
        }
    }

    /// Returns the named contractor, creating it on first mention.
    pub fn contractor(&mut self, name: &str) -> Actor {
        *self
            .contractors
            .entry(name.to_owned())
            .or_insert_with(new_contractor)
    }

    pub fn project(&self) -> Result<&Project, eyre::Report> {
        self.project
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing project in scenario world"))
    }

    /// Records a failed action, or passes a successful value through.
    pub fn record<T>(&mut self, result: MarketplaceResult<T>) -> Option<T> {
        match result {
            Ok(value) => {
                self.last_error = None;
                Some(value)
            }
            Err(err) => {
                self.last_error = Some(err);
                None
            }
        }
    }
}

impl Default for MarketWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> MarketWorld {
    MarketWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
