use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

use crate::{BlobError, BlobKey, BlobMetadata, BlobResult, BlobStore};

/// Cache group the media store writes into unless told otherwise.
pub const DEFAULT_CACHE_GROUP: &str = "stack-media";

/// One cached object.
#[derive(Debug, Clone)]
pub struct CachedBlob {
    pub content: Bytes,
    pub modified_at: DateTime<Utc>,
}

/// Minimal grouped key/value cache, the surface an object cache exposes.
pub trait ObjectCache: Send + Sync {
    fn get(&self, group: &str, key: &str) -> Option<CachedBlob>;

    fn set(&self, group: &str, key: &str, value: CachedBlob);

    /// Returns false when nothing was stored under the key.
    fn delete(&self, group: &str, key: &str) -> bool;
}

/// Process-local cache; contents live as long as the process.
#[derive(Debug, Default)]
pub struct MemoryObjectCache {
    entries: DashMap<(String, String), CachedBlob>,
}

impl MemoryObjectCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ObjectCache for MemoryObjectCache {
    fn get(&self, group: &str, key: &str) -> Option<CachedBlob> {
        self.entries
            .get(&(group.to_string(), key.to_string()))
            .map(|entry| entry.value().clone())
    }

    fn set(&self, group: &str, key: &str, value: CachedBlob) {
        self.entries
            .insert((group.to_string(), key.to_string()), value);
    }

    fn delete(&self, group: &str, key: &str) -> bool {
        self.entries
            .remove(&(group.to_string(), key.to_string()))
            .is_some()
    }
}

/// BlobStore over an [`ObjectCache`].
///
/// Not durable; meant for ephemeral media and tests. The cache has no
/// metadata API of its own, so `stat` reads the whole entry to report its size
/// and reports `modified_at` for all three timestamps.
#[derive(Clone)]
pub struct ObjectCacheStore {
    cache: Arc<dyn ObjectCache>,
    group: String,
}

impl ObjectCacheStore {
    pub fn new(cache: Arc<dyn ObjectCache>) -> Self {
        Self {
            cache,
            group: DEFAULT_CACHE_GROUP.to_string(),
        }
    }

    /// Store backed by a fresh process-local cache
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryObjectCache::new()))
    }

    /// Use a different cache group (namespace)
    pub fn with_group<S: Into<String>>(mut self, group: S) -> Self {
        self.group = group.into();
        self
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    fn entry(&self, key: &BlobKey) -> BlobResult<CachedBlob> {
        self.cache
            .get(&self.group, key.as_str())
            .ok_or_else(|| BlobError::not_found(key.as_str()))
    }
}

impl std::fmt::Debug for ObjectCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectCacheStore")
            .field("group", &self.group)
            .finish_non_exhaustive()
    }
}

impl BlobStore for ObjectCacheStore {
    fn name(&self) -> &'static str {
        "objcache"
    }

    fn get(&self, key: &BlobKey) -> BlobResult<Vec<u8>> {
        debug!("get {}:{}", self.group, key);
        Ok(self.entry(key)?.content.to_vec())
    }

    fn stat(&self, key: &BlobKey) -> BlobResult<BlobMetadata> {
        debug!("stat {}:{}", self.group, key);
        let entry = self.entry(key)?;
        Ok(BlobMetadata::uniform(
            entry.content.len() as u64,
            entry.modified_at,
        ))
    }

    fn set(&self, key: &BlobKey, content: &[u8]) -> BlobResult<()> {
        debug!("set {}:{} ({} bytes)", self.group, key, content.len());
        self.cache.set(
            &self.group,
            key.as_str(),
            CachedBlob {
                content: Bytes::copy_from_slice(content),
                modified_at: Utc::now(),
            },
        );
        Ok(())
    }

    fn remove(&self, key: &BlobKey) -> BlobResult<()> {
        debug!("remove {}:{}", self.group, key);
        if self.cache.delete(&self.group, key.as_str()) {
            Ok(())
        } else {
            Err(BlobError::not_found(key.as_str()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_and_stat() {
        let store = ObjectCacheStore::in_memory();
        let key = BlobKey::new("a/b/c.txt");

        store.set(&key, b"hello").unwrap();

        assert_eq!(store.get(&key).unwrap(), b"hello");
        let meta = store.stat(&key).unwrap();
        assert_eq!(meta.size, 5);
        assert_eq!(meta.created_at, meta.modified_at);
        assert_eq!(meta.accessed_at, meta.modified_at);
    }

    #[test]
    fn test_missing_key_is_not_found() {
        let store = ObjectCacheStore::in_memory();
        let key = BlobKey::new("missing.txt");

        assert!(store.get(&key).unwrap_err().is_not_found());
        assert!(store.stat(&key).unwrap_err().is_not_found());
    }

    #[test]
    fn test_second_remove_is_not_found() {
        let store = ObjectCacheStore::in_memory();
        let key = BlobKey::new("a/b/c.txt");
        store.set(&key, b"hello").unwrap();

        store.remove(&key).unwrap();

        assert!(store.get(&key).unwrap_err().is_not_found());
        assert!(store.remove(&key).unwrap_err().is_not_found());
    }

    #[test]
    fn test_groups_share_cache_but_not_keys() {
        let cache: Arc<dyn ObjectCache> = Arc::new(MemoryObjectCache::new());
        let media = ObjectCacheStore::new(Arc::clone(&cache));
        let other = ObjectCacheStore::new(cache).with_group("other");
        let key = BlobKey::new("logo.png");

        media.set(&key, b"png").unwrap();

        assert!(other.get(&key).unwrap_err().is_not_found());
        assert_eq!(media.get(&key).unwrap(), b"png");
    }
}
