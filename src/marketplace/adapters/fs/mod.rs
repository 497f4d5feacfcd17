//! Filesystem adapters backed by capability-scoped directories.

mod blob_store;

pub use blob_store::CapStdBlobStore;
