//! In-memory adapter implementations for testing.
//!
//! These adapters provide simple, thread-safe implementations, and a manually
//! driven clock, suitable for unit and scenario tests without database or
//! filesystem dependencies.

mod blob_store;
mod clock;
mod repository;

pub use blob_store::InMemoryBlobStore;
pub use clock::ManualClock;
pub use repository::InMemoryMarketplaceRepository;
