//! Write-once blob store rooted at a capability-scoped directory.

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::{Dir, OpenOptions};
use std::io::{ErrorKind, Write};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::marketplace::{
    domain::StoredName,
    ports::{BlobStore, BlobStoreError, BlobStoreResult},
};

/// Stores uploaded content as flat files inside a single root directory.
///
/// Every operation is resolved relative to the opened root, so stored names
/// cannot escape it.
#[derive(Debug, Clone)]
pub struct CapStdBlobStore {
    root: Utf8PathBuf,
    dir: Arc<Dir>,
}

impl CapStdBlobStore {
    /// Opens `root`, creating it when absent.
    ///
    /// # Errors
    ///
    /// Returns [`BlobStoreError::Io`] when the directory cannot be created
    /// or opened.
    pub fn open(root: impl Into<Utf8PathBuf>) -> BlobStoreResult<Self> {
        let root_path = root.into();
        Dir::create_ambient_dir_all(&root_path, ambient_authority()).map_err(BlobStoreError::io)?;
        let dir = Dir::open_ambient_dir(&root_path, ambient_authority())
            .map_err(BlobStoreError::io)?;
        debug!(root = %root_path, "blob store opened");
        Ok(Self {
            root: root_path,
            dir: Arc::new(dir),
        })
    }

    /// Returns the directory blobs are stored in.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    async fn blocking<T, F>(&self, work: F) -> BlobStoreResult<T>
    where
        F: FnOnce(&Dir) -> BlobStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let dir = Arc::clone(&self.dir);
        tokio::task::spawn_blocking(move || work(&dir))
            .await
            .map_err(|err| BlobStoreError::io(std::io::Error::other(err)))?
    }
}

fn write_exclusive(dir: &Dir, name: &StoredName, bytes: &[u8]) -> BlobStoreResult<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    let mut file = dir
        .open_with(name.as_str(), &options)
        .map_err(|err| match err.kind() {
            ErrorKind::AlreadyExists => BlobStoreError::AlreadyExists(name.clone()),
            _ => BlobStoreError::io(err),
        })?;
    let written = file.write_all(bytes).and_then(|()| file.sync_all());
    if let Err(err) = written {
        drop(file);
        if let Err(cleanup) = dir.remove_file(name.as_str()) {
            warn!(stored_name = %name, error = %cleanup, "failed to remove partial blob");
        }
        return Err(BlobStoreError::io(err));
    }
    Ok(())
}

#[async_trait]
impl BlobStore for CapStdBlobStore {
    async fn write_new(&self, name: &StoredName, bytes: &[u8]) -> BlobStoreResult<()> {
        let target = name.clone();
        let content = bytes.to_vec();
        self.blocking(move |dir| write_exclusive(dir, &target, &content))
            .await
    }

    async fn read(&self, name: &StoredName) -> BlobStoreResult<Vec<u8>> {
        let target = name.clone();
        self.blocking(move |dir| {
            dir.read(target.as_str()).map_err(|err| match err.kind() {
                ErrorKind::NotFound => BlobStoreError::Missing(target.clone()),
                _ => BlobStoreError::io(err),
            })
        })
        .await
    }

    async fn exists(&self, name: &StoredName) -> BlobStoreResult<bool> {
        let target = name.clone();
        self.blocking(move |dir| Ok(dir.exists(target.as_str())))
            .await
    }
}
