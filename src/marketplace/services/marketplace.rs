//! Wiring of the workflow services over one set of ports.

use super::{FileVersioningService, IssueService, ProjectService, ProposalService, RatingService};
use crate::marketplace::{
    domain::{LifecycleEngine, UploadPolicy},
    ports::{BlobStore, MarketplaceRepository},
};
use mockable::Clock;
use std::sync::Arc;

/// Workflow services sharing one repository, blob store, clock and engine.
pub struct Marketplace<R, B, C>
where
    R: MarketplaceRepository,
    B: BlobStore,
    C: Clock + Send + Sync,
{
    /// Project posting, selection and review.
    pub projects: ProjectService<R, C>,
    /// Proposal submission.
    pub proposals: ProposalService<R, B, C>,
    /// Versioned files.
    pub files: FileVersioningService<R, B, C>,
    /// Issue threads.
    pub issues: IssueService<R, C>,
    /// Ratings.
    pub ratings: RatingService<R, C>,
}

impl<R, B, C> Marketplace<R, B, C>
where
    R: MarketplaceRepository,
    B: BlobStore,
    C: Clock + Send + Sync,
{
    /// Builds every service over the given ports.
    #[must_use]
    pub fn new(
        repository: Arc<R>,
        blobs: Arc<B>,
        clock: Arc<C>,
        engine: LifecycleEngine,
        policy: UploadPolicy,
    ) -> Self {
        let files = FileVersioningService::new(
            Arc::clone(&repository),
            blobs,
            Arc::clone(&clock),
            engine,
            policy,
        );
        Self {
            projects: ProjectService::new(Arc::clone(&repository), Arc::clone(&clock), engine),
            proposals: ProposalService::new(
                Arc::clone(&repository),
                files.clone(),
                Arc::clone(&clock),
                engine,
            ),
            issues: IssueService::new(Arc::clone(&repository), Arc::clone(&clock), engine),
            ratings: RatingService::new(repository, clock, engine),
            files,
        }
    }
}
