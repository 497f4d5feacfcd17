//! Port for durable storage of uploaded file content.

use crate::marketplace::domain::StoredName;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for blob store operations.
pub type BlobStoreResult<T> = Result<T, BlobStoreError>;

/// Write-once content storage rooted at a configured directory.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Writes `bytes` under `name`. Never overwrites: the write fails if the
    /// name is already present. A failed write leaves no file behind.
    ///
    /// # Errors
    ///
    /// Returns [`BlobStoreError::AlreadyExists`] when `name` is taken or
    /// [`BlobStoreError::Io`] on storage failure.
    async fn write_new(&self, name: &StoredName, bytes: &[u8]) -> BlobStoreResult<()>;

    /// Reads the full content stored under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`BlobStoreError::Missing`] when nothing is stored under
    /// `name` or [`BlobStoreError::Io`] on storage failure.
    async fn read(&self, name: &StoredName) -> BlobStoreResult<Vec<u8>>;

    /// Returns `true` when content is stored under `name`.
    async fn exists(&self, name: &StoredName) -> BlobStoreResult<bool>;
}

/// Errors returned by blob stores.
#[derive(Debug, Clone, Error)]
pub enum BlobStoreError {
    /// A blob with the name already exists.
    #[error("stored file already exists: {0}")]
    AlreadyExists(StoredName),

    /// No blob is stored under the name.
    #[error("stored file is missing: {0}")]
    Missing(StoredName),

    /// Underlying storage failure.
    #[error("blob storage failure: {0}")]
    Io(Arc<std::io::Error>),
}

impl BlobStoreError {
    /// Wraps an I/O error.
    #[must_use]
    pub fn io(err: std::io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}
