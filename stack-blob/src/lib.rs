//! # stack-blob: uniform blob storage for uploaded media
//!
//! `stack-blob` puts three very different object backends behind one small,
//! blocking contract: [`BlobStore`] with `get`, `stat`, `set` and `remove`.
//!
//! - [`LocalFilesystemStore`]: a directory on disk, atomic replace on `set`
//! - [`GcsStore`]: a Cloud Storage bucket + prefix
//! - [`ObjectCacheStore`]: an in-process object cache, for ephemeral media
//!
//! ## Quick Start
//!
//! ```rust
//! use stack_blob::prelude::*;
//!
//! # fn main() -> BlobResult<()> {
//! let location = StorageLocation::parse("objcache://")?;
//! let store = Backend::open(&location)?;
//!
//! let key = BlobKey::new("wp-content/uploads/hello.txt");
//! store.set(&key, b"hello")?;
//!
//! assert_eq!(store.get(&key)?, b"hello");
//! assert_eq!(store.stat(&key)?.size, 5);
//! # Ok(())
//! # }
//! ```
//!
//! Absent objects always surface as [`BlobError::NotFound`], distinct from
//! every other failure, so callers can implement create-on-write.

mod backend;
mod cache;
mod config;
mod error;
mod gcs;
mod key;
mod local;
mod location;
pub mod store;

pub use backend::Backend;
pub use cache::{CachedBlob, MemoryObjectCache, ObjectCache, ObjectCacheStore, DEFAULT_CACHE_GROUP};
pub use config::GcsConfig;
pub use error::{BlobError, BlobResult};
pub use gcs::GcsStore;
pub use key::BlobKey;
pub use local::LocalFilesystemStore;
pub use location::StorageLocation;
pub use store::{BlobMetadata, BlobStore};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Backend, BlobError, BlobKey, BlobMetadata, BlobResult, BlobStore, StorageLocation,
    };
}
