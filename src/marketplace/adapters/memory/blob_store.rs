//! In-memory blob store for tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::marketplace::{
    domain::StoredName,
    ports::{BlobStore, BlobStoreError, BlobStoreResult},
};

/// Thread-safe write-once blob store held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBlobStore {
    blobs: Arc<RwLock<HashMap<StoredName, Vec<u8>>>>,
}

impl InMemoryBlobStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored blobs.
    ///
    /// # Errors
    ///
    /// Returns [`BlobStoreError::Io`] when the lock is poisoned.
    pub fn blob_count(&self) -> BlobStoreResult<usize> {
        let blobs = self
            .blobs
            .read()
            .map_err(|err| BlobStoreError::io(std::io::Error::other(err.to_string())))?;
        Ok(blobs.len())
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn write_new(&self, name: &StoredName, bytes: &[u8]) -> BlobStoreResult<()> {
        let mut blobs = self
            .blobs
            .write()
            .map_err(|err| BlobStoreError::io(std::io::Error::other(err.to_string())))?;
        if blobs.contains_key(name) {
            return Err(BlobStoreError::AlreadyExists(name.clone()));
        }
        blobs.insert(name.clone(), bytes.to_vec());
        Ok(())
    }

    async fn read(&self, name: &StoredName) -> BlobStoreResult<Vec<u8>> {
        let blobs = self
            .blobs
            .read()
            .map_err(|err| BlobStoreError::io(std::io::Error::other(err.to_string())))?;
        blobs
            .get(name)
            .cloned()
            .ok_or_else(|| BlobStoreError::Missing(name.clone()))
    }

    async fn exists(&self, name: &StoredName) -> BlobStoreResult<bool> {
        let blobs = self
            .blobs
            .read()
            .map_err(|err| BlobStoreError::io(std::io::Error::other(err.to_string())))?;
        Ok(blobs.contains_key(name))
    }
}
