//! # stack-media: a virtual `media://` filesystem over blob storage
//!
//! Uploaded media lives in a [`stack_blob`] store (local directory, Cloud
//! Storage bucket or object cache). This crate makes that store look like a
//! small filesystem addressed by virtual paths such as
//! `media://wp-content/uploads/2024/01/cat.jpg`:
//!
//! - [`StreamWrapper`]: open/read/write/seek/flush/close over one object,
//!   plus stat, unlink, rename and (empty) directory emulation
//! - [`SchemeRegistry`]: scheme name to store bindings, owned explicitly
//! - [`MediaFs`] / [`MediaFile`]: path-based calls and `std::io` traits
//! - [`MediaStorage`]: picks the backend from configuration and rewrites
//!   upload, delete and serve paths onto the virtual scheme
//!
//! ## Quick Start
//!
//! ```rust
//! use std::io::Write;
//! use stack_media::{MediaConfig, MediaResult, MediaStorage};
//!
//! # fn main() -> MediaResult<()> {
//! let storage = MediaStorage::new(MediaConfig::new("objcache://"))?;
//! let fs = storage.fs();
//!
//! let mut file = fs.open("media://wp-content/uploads/hello.txt", "w")?;
//! file.write_all(b"hello")?;
//! file.close()?;
//!
//! assert_eq!(fs.read("media://wp-content/uploads/hello.txt")?, b"hello");
//! assert!(fs.is_dir("media://wp-content/uploads"));
//! # Ok(())
//! # }
//! ```

mod config;
mod controller;
mod error;
mod fs;
mod mime;
mod mode;
pub mod path;
mod registry;
mod stat;
mod wrapper;

pub use config::{MediaConfig, DEFAULT_MEDIA_PATH};
pub use controller::{MediaStorage, ServeOutcome, UploadDir, INCOMPATIBLE_IMAGE_EDITOR};
pub use error::{MediaError, MediaResult};
pub use fs::{MediaFile, MediaFs};
pub use mime::content_type;
pub use mode::OpenMode;
pub use registry::SchemeRegistry;
pub use stat::{MediaStat, DIRECTORY_WRITABLE_MODE, FILE_WRITABLE_MODE};
pub use wrapper::{MetadataChange, Report, StreamWrapper, DEFAULT_SCHEME};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        MediaConfig, MediaError, MediaFile, MediaFs, MediaResult, MediaStorage, OpenMode, Report,
        SchemeRegistry, StreamWrapper,
    };
}
