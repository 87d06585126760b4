use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use stack_blob::{Backend, BlobStore, StorageLocation};
use tracing::{debug, info};

use crate::mime::content_type;
use crate::path::{extension, is_valid_scheme, virtual_path};
use crate::{MediaConfig, MediaError, MediaFs, MediaResult, SchemeRegistry};

/// Image editor that cannot work on virtual streams
pub const INCOMPATIBLE_IMAGE_EDITOR: &str = "WP_Image_Editor_Imagick";

/// The upload directory description handed around by the upload pipeline
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadDir {
    pub path: String,
    pub url: String,
    pub subdir: String,
    pub basedir: String,
    pub baseurl: String,
    #[serde(default)]
    pub error: Option<String>,
}

/// Result of routing a request through [`MediaStorage::serve_media_file`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServeOutcome {
    /// Not an uploads URL; someone else handles it
    Pass,
    /// Directory or unservable file type
    Forbidden { message: &'static str },
    /// Uploads URL without an object behind it
    NotFound,
    File {
        content_type: &'static str,
        body: Vec<u8>,
    },
}

/// Wires one blob store under the virtual scheme and rewrites upload paths
/// to go through it.
#[derive(Debug)]
pub struct MediaStorage {
    config: MediaConfig,
    location: StorageLocation,
    registry: Arc<SchemeRegistry>,
    fs: MediaFs,
}

impl MediaStorage {
    /// Build the store from `config` and register it in a private registry.
    pub fn new(config: MediaConfig) -> MediaResult<Self> {
        Self::with_registry(config, Arc::new(SchemeRegistry::new()))
    }

    /// [`MediaConfig::from_env`] followed by [`MediaStorage::new`]
    pub fn from_env() -> MediaResult<Self> {
        Self::new(MediaConfig::from_env()?)
    }

    /// Build the store from `config` and bind it in `registry`, replacing any
    /// previous binding for the scheme.
    ///
    /// Unknown storage schemes and backend construction failures are fatal.
    pub fn with_registry(config: MediaConfig, registry: Arc<SchemeRegistry>) -> MediaResult<Self> {
        if !is_valid_scheme(&config.scheme) {
            return Err(MediaError::configuration(format!(
                "invalid virtual scheme {:?}",
                config.scheme
            )));
        }

        let location = match config.location()? {
            StorageLocation::Local { root } => StorageLocation::Local {
                root: store_root(&root, &config.media_path),
            },
            location => location,
        };

        let backend = Backend::open_with(&location, config.gcs.clone()).map_err(|err| {
            MediaError::configuration(format!("cannot open media storage {}: {}", location, err))
        })?;

        if registry.unregister(&config.scheme).is_some() {
            debug!("replacing existing {}:// binding", config.scheme);
        }
        if !registry.register(config.scheme.clone(), Arc::new(backend)) {
            return Err(MediaError::configuration(format!(
                "failed to register {}://",
                config.scheme
            )));
        }

        info!(
            "media storage ready: {}://{} -> {}",
            config.scheme, config.media_path, location
        );
        Ok(Self {
            fs: MediaFs::new(Arc::clone(&registry)),
            config,
            location,
            registry,
        })
    }

    pub fn config(&self) -> &MediaConfig {
        &self.config
    }

    /// Where blobs actually live
    pub fn location(&self) -> &StorageLocation {
        &self.location
    }

    pub fn registry(&self) -> &Arc<SchemeRegistry> {
        &self.registry
    }

    /// Path-based access through the registry
    pub fn fs(&self) -> &MediaFs {
        &self.fs
    }

    /// The store bound to this controller's scheme
    pub fn store(&self) -> MediaResult<Arc<dyn BlobStore>> {
        self.registry.resolve(&self.config.scheme)
    }

    /// `<scheme>://<path>`
    pub fn remote_path(&self, path: &str) -> String {
        virtual_path(&self.config.scheme, path)
    }

    /// `<scheme>://<media path>`, e.g. `media://wp-content/uploads`
    pub fn uploads_dir(&self) -> String {
        self.remote_path(&self.config.media_path)
    }

    /// Re-root an upload directory description at the virtual scheme.
    pub fn filter_upload_dir(&self, mut uploads: UploadDir) -> UploadDir {
        let basedir = self.uploads_dir();
        uploads.path = format!("{}{}", basedir, uploads.subdir)
            .trim_end_matches(['/', '\\'])
            .to_string();
        uploads.basedir = basedir;
        uploads
    }

    /// Normalize a path about to be deleted.
    ///
    /// Repeated uploads-dir prefixes collapse to one. Virtual paths are
    /// deleted here, ignoring failures, and `None` is returned; any other
    /// path is handed back for the caller to delete.
    pub fn filter_delete_file(&self, path: &str) -> Option<String> {
        let basedir = self.uploads_dir();
        let path = match path.strip_prefix(basedir.as_str()) {
            Some(mut rest) => {
                while let Some(next) = rest.trim_start_matches('/').strip_prefix(basedir.as_str()) {
                    rest = next;
                }
                format!("{}{}", basedir, rest)
            }
            None => path.to_string(),
        };

        let prefix = format!("{}://", self.config.scheme);
        if !path.starts_with(&prefix) {
            return Some(path);
        }

        if let Err(err) = self.fs.remove_file(&path) {
            debug!(%path, %err, "ignoring failed delete");
        }
        None
    }

    /// Serve an uploaded file for `request_url` when it falls under
    /// `base_url` (the public uploads URL).
    pub fn serve_media_file(&self, request_url: &str, base_url: &str) -> MediaResult<ServeOutcome> {
        let request = request_url
            .split(['?', '#'])
            .next()
            .unwrap_or(request_url);
        let relative = match request.strip_prefix(base_url) {
            Some(relative) => relative,
            None => return Ok(ServeOutcome::Pass),
        };

        let content_type = match extension(relative).and_then(content_type) {
            Some(content_type) => content_type,
            None => {
                return Ok(ServeOutcome::Forbidden {
                    message: "Directory listing disabled.",
                })
            }
        };

        let path = self.remote_path(&format!(
            "{}/{}",
            self.config.media_path,
            relative.trim_start_matches('/')
        ));
        match self.fs.read(&path) {
            Ok(body) => Ok(ServeOutcome::File { content_type, body }),
            Err(err) if err.is_not_found() => Ok(ServeOutcome::NotFound),
            Err(err) => Err(err),
        }
    }

    /// Drop image editors that cannot operate on virtual streams.
    pub fn filter_image_editors(&self, editors: Vec<String>) -> Vec<String> {
        editors
            .into_iter()
            .filter(|editor| editor != INCOMPATIBLE_IMAGE_EDITOR)
            .collect()
    }

    /// Remove this controller's scheme binding. Returns `false` when it was
    /// already gone.
    pub fn unregister(&self) -> bool {
        self.registry.unregister(&self.config.scheme).is_some()
    }
}

/// Virtual keys already start with the media path, so a local root that ends
/// with it is moved up to the directory containing it.
fn store_root(root: &Path, media_path: &str) -> PathBuf {
    if media_path.is_empty() || !root.ends_with(media_path) {
        return root.to_path_buf();
    }
    let depth = Path::new(media_path).components().count();
    root.ancestors()
        .nth(depth)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf())
}
