use tracing::info;

use crate::{
    BlobKey, BlobMetadata, BlobResult, BlobStore, GcsConfig, GcsStore, LocalFilesystemStore,
    ObjectCacheStore, StorageLocation,
};

/// The concrete store selected from a [`StorageLocation`].
#[derive(Debug)]
pub enum Backend {
    Local(LocalFilesystemStore),
    Gcs(GcsStore),
    ObjectCache(ObjectCacheStore),
}

impl Backend {
    /// Build the store for `location`. Cloud credentials come from the environment.
    pub fn open(location: &StorageLocation) -> BlobResult<Self> {
        Self::open_with(location, None)
    }

    /// Build the store for `location`; `gcs` overrides the environment credentials.
    pub fn open_with(location: &StorageLocation, gcs: Option<GcsConfig>) -> BlobResult<Self> {
        let backend = match location {
            StorageLocation::Local { root } => Self::Local(LocalFilesystemStore::new(root)),
            StorageLocation::Gcs { bucket, prefix } => {
                let config = match gcs {
                    Some(config) => config,
                    None => GcsConfig::from_env()?,
                };
                Self::Gcs(GcsStore::new(bucket, prefix, config)?)
            }
            StorageLocation::ObjectCache => Self::ObjectCache(ObjectCacheStore::in_memory()),
        };

        info!("media blob store: {} ({})", backend.name(), location);
        Ok(backend)
    }

    fn inner(&self) -> &dyn BlobStore {
        match self {
            Self::Local(store) => store,
            Self::Gcs(store) => store,
            Self::ObjectCache(store) => store,
        }
    }
}

impl BlobStore for Backend {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn get(&self, key: &BlobKey) -> BlobResult<Vec<u8>> {
        self.inner().get(key)
    }

    fn stat(&self, key: &BlobKey) -> BlobResult<BlobMetadata> {
        self.inner().stat(key)
    }

    fn set(&self, key: &BlobKey, content: &[u8]) -> BlobResult<()> {
        self.inner().set(key, content)
    }

    fn remove(&self, key: &BlobKey) -> BlobResult<()> {
        self.inner().remove(key)
    }
}

impl From<LocalFilesystemStore> for Backend {
    fn from(store: LocalFilesystemStore) -> Self {
        Self::Local(store)
    }
}

impl From<GcsStore> for Backend {
    fn from(store: GcsStore) -> Self {
        Self::Gcs(store)
    }
}

impl From<ObjectCacheStore> for Backend {
    fn from(store: ObjectCacheStore) -> Self {
        Self::ObjectCache(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_factory_selects_backend_by_location() {
        let local = Backend::open(&StorageLocation::Local {
            root: PathBuf::from("/tmp/stack-media"),
        })
        .unwrap();
        assert!(matches!(local, Backend::Local(_)));
        assert_eq!(local.name(), "local");

        let cache = Backend::open(&StorageLocation::ObjectCache).unwrap();
        assert!(matches!(cache, Backend::ObjectCache(_)));

        let gcs = Backend::open_with(
            &StorageLocation::parse("gs://media/site-1").unwrap(),
            Some(GcsConfig::new("GOOG1E", "secret")),
        )
        .unwrap();
        assert_eq!(gcs.name(), "gcs");
    }

    #[test]
    fn test_backend_delegates() {
        let backend = Backend::from(ObjectCacheStore::in_memory());
        let key = BlobKey::new("a/b/c.txt");

        backend.set(&key, b"hello").unwrap();
        assert_eq!(backend.get(&key).unwrap(), b"hello");
        assert_eq!(backend.stat(&key).unwrap().size, 5);
    }
}
