//! Application services for the marketplace.
//!
//! Each service is generic over the repository, blob store and clock ports,
//! evaluates every role-gated action through the shared
//! [`LifecycleEngine`](crate::marketplace::domain::LifecycleEngine), and
//! reports failures as [`MarketplaceError`].

mod error;
mod files;
mod identity;
mod issues;
mod marketplace;
mod projects;
mod proposals;
mod ratings;

pub use error::{ContentIntegrityError, ErrorKind, MarketplaceError, MarketplaceResult};
pub use files::{FetchedFile, FileVersioningService, StoreUploadRequest, StoredUpload, UploadEffect};
pub use identity::{IdentityService, RegisterUserRequest, actor_from_session, logout};
pub use issues::IssueService;
pub use marketplace::Marketplace;
pub use projects::{
    ContractorSelected, OpenProjectListing, ProjectDraft, ProjectEdit, ProjectService,
    ProjectView,
};
pub use proposals::{ProposalService, SubmitProposalRequest};
pub use ratings::{RateCounterpartRequest, RatingService};

use crate::marketplace::{
    domain::{Project, ProjectId},
    ports::ProjectRepository,
};

async fn load_project<R>(repository: &R, project_id: ProjectId) -> MarketplaceResult<Project>
where
    R: ProjectRepository + ?Sized,
{
    repository
        .find_project(project_id)
        .await?
        .ok_or_else(|| MarketplaceError::not_found("project", project_id.into_inner()))
}
