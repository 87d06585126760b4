use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use stack_blob::{BlobError, BlobKey, BlobMetadata, BlobResult, BlobStore, ObjectCacheStore};
use stack_media::{MediaConfig, MediaError, MediaFs, MediaStorage, SchemeRegistry};

/// A store that cannot read or stat anything and counts write attempts
#[derive(Default)]
struct DeniedStore {
    writes: AtomicUsize,
}

fn denied() -> BlobError {
    io::Error::new(io::ErrorKind::PermissionDenied, "bucket access denied").into()
}

impl BlobStore for DeniedStore {
    fn name(&self) -> &'static str {
        "denied"
    }

    fn get(&self, _key: &BlobKey) -> BlobResult<Vec<u8>> {
        Err(denied())
    }

    fn stat(&self, _key: &BlobKey) -> BlobResult<BlobMetadata> {
        Err(denied())
    }

    fn set(&self, _key: &BlobKey, _content: &[u8]) -> BlobResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn remove(&self, _key: &BlobKey) -> BlobResult<()> {
        Err(denied())
    }
}

fn is_permission_denied(err: &MediaError) -> bool {
    matches!(
        err,
        MediaError::Blob(BlobError::Io { source }) if source.kind() == io::ErrorKind::PermissionDenied
    )
}

fn create_test_fs() -> (Arc<DeniedStore>, MediaFs) {
    let registry = Arc::new(SchemeRegistry::new());
    let store = Arc::new(DeniedStore::default());
    registry.register("media", Arc::new(ObjectCacheStore::in_memory()));
    registry.register("denied", Arc::clone(&store) as Arc<dyn BlobStore>);
    (store, MediaFs::new(registry))
}

#[test]
fn test_read_surfaces_backend_failure() {
    let (_store, fs) = create_test_fs();

    let err = fs.read("denied://a/b/c.txt").unwrap_err();
    assert!(!err.is_not_found());
    assert!(is_permission_denied(&err), "got {:?}", err);

    assert!(fs.try_is_file("denied://a/b/c.txt").is_err());
    assert!(!fs.try_is_file("media://a/b/c.txt").unwrap());
}

#[test]
fn test_read_surfaces_unregistered_scheme() {
    let (_store, fs) = create_test_fs();
    assert!(matches!(
        fs.read("cdn://a.txt"),
        Err(MediaError::SchemeNotRegistered { ref scheme }) if scheme == "cdn"
    ));
}

#[test]
fn test_copy_without_overwrite_stops_on_failed_stat() {
    let (store, fs) = create_test_fs();
    fs.write("media://a.txt", "a").unwrap();

    let err = fs.copy("media://a.txt", "denied://b.txt", false).unwrap_err();
    assert!(is_permission_denied(&err), "got {:?}", err);
    assert_eq!(store.writes.load(Ordering::SeqCst), 0);

    let err = fs
        .move_file("media://a.txt", "denied://b.txt", false)
        .unwrap_err();
    assert!(is_permission_denied(&err), "got {:?}", err);
    assert_eq!(store.writes.load(Ordering::SeqCst), 0);
    assert!(fs.is_file("media://a.txt"));

    // overwriting skips the existence check, so the write goes through
    fs.copy("media://a.txt", "denied://b.txt", true).unwrap();
    assert_eq!(store.writes.load(Ordering::SeqCst), 1);
}

#[test]
fn test_serve_surfaces_backend_failure() {
    let storage = MediaStorage::new(MediaConfig::new("objcache://")).unwrap();
    let registry = storage.registry();
    registry.unregister("media");
    assert!(registry.register("media", Arc::new(DeniedStore::default())));

    let err = storage
        .serve_media_file(
            "http://localhost:8080/wp-content/uploads/a.jpg",
            "http://localhost:8080/wp-content/uploads",
        )
        .unwrap_err();
    assert!(is_permission_denied(&err), "got {:?}", err);
}
