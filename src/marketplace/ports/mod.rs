//! Port contracts for the marketplace.
//!
//! Ports define infrastructure-agnostic interfaces used by marketplace
//! services: row persistence, blob storage, the request session and
//! credential verification.

pub mod blob_store;
pub mod repository;
pub mod session;

pub use blob_store::{BlobStore, BlobStoreError, BlobStoreResult};
pub use repository::{
    AttachmentRepository, ContractorSelection, IssueRepository, MarketplaceRepository,
    ProjectRepository, ProposalRepository, RatingRepository, RepositoryError, RepositoryResult,
    UploadCompanion, UserRepository,
};
pub use session::{CredentialVerifier, ROLE_KEY, SessionStore, USER_ID_KEY};
