//! Write-once semantics shared by the in-memory and filesystem blob stores.

use camino::Utf8PathBuf;
use rstest::rstest;
use tender::marketplace::{
    adapters::{fs::CapStdBlobStore, memory::InMemoryBlobStore},
    domain::{FileVersion, ProjectId, StoredName},
    ports::{BlobStore, BlobStoreError},
};

use crate::test_helpers::base_time;

fn name() -> StoredName {
    StoredName::generate(ProjectId::new(), FileVersion::FIRST, base_time(), "report.pdf")
}

fn scratch_root() -> Utf8PathBuf {
    let dir = std::env::temp_dir().join(format!("tender-blobs-{}", uuid::Uuid::new_v4()));
    Utf8PathBuf::from_path_buf(dir).expect("temp dir is UTF-8")
}

async fn check_write_once(store: &impl BlobStore) {
    let stored = name();
    store.write_new(&stored, b"first").await.expect("first write");

    let err = store
        .write_new(&stored, b"second")
        .await
        .expect_err("names are never overwritten");

    assert!(matches!(err, BlobStoreError::AlreadyExists(_)));
    assert_eq!(store.read(&stored).await.expect("read"), b"first".to_vec());
    assert!(store.exists(&stored).await.expect("exists"));
}

async fn check_missing(store: &impl BlobStore) {
    let absent = name();

    let err = store.read(&absent).await.expect_err("nothing stored");

    assert!(matches!(err, BlobStoreError::Missing(_)));
    assert!(!store.exists(&absent).await.expect("exists"));
}

#[rstest]
#[tokio::test]
async fn memory_store_is_write_once() {
    let store = InMemoryBlobStore::new();
    check_write_once(&store).await;
    check_missing(&store).await;
    assert_eq!(store.blob_count().expect("count"), 1);
}

#[rstest]
#[tokio::test]
async fn filesystem_store_is_write_once() {
    let root = scratch_root();
    let store = CapStdBlobStore::open(root.clone()).expect("open upload root");

    check_write_once(&store).await;
    check_missing(&store).await;

    assert_eq!(store.root(), root.as_path());
    std::fs::remove_dir_all(&root).expect("remove scratch root");
}

#[rstest]
#[tokio::test]
async fn filesystem_store_creates_nested_roots() {
    let base = scratch_root();
    let nested = base.join("static").join("uploads");

    let store = CapStdBlobStore::open(nested.clone()).expect("open nested root");
    let stored = name();
    store.write_new(&stored, b"bytes").await.expect("write");

    assert!(nested.join(stored.as_str()).is_file());
    std::fs::remove_dir_all(&base).expect("remove scratch root");
}
