use std::env;

use stack_blob::{GcsConfig, StorageLocation};

use crate::{MediaError, MediaResult, DEFAULT_SCHEME};

/// Uploads directory relative to the document root
pub const DEFAULT_MEDIA_PATH: &str = "wp-content/uploads";

/// Configuration for the media storage controller
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Storage location URI (`file://`, `gs://`, `gcs://`, `objcache://`)
    pub bucket: String,

    /// Uploads base path, without leading or trailing slashes
    pub media_path: String,

    /// Virtual scheme the store is registered under
    pub scheme: String,

    /// Cloud credentials; read from the environment when unset
    pub gcs: Option<GcsConfig>,
}

impl MediaConfig {
    /// Config for a storage URI, with the default uploads path and scheme
    pub fn new<S: Into<String>>(bucket: S) -> Self {
        Self {
            bucket: bucket.into(),
            media_path: DEFAULT_MEDIA_PATH.to_string(),
            scheme: DEFAULT_SCHEME.to_string(),
            gcs: None,
        }
    }

    /// Read `MEDIA_PATH` and `MEDIA_BUCKET`.
    ///
    /// Without `MEDIA_BUCKET`, media lives on the local filesystem under
    /// `<current dir>/<MEDIA_PATH>`.
    pub fn from_env() -> MediaResult<Self> {
        let media_path = env::var("MEDIA_PATH")
            .map(|path| trim_media_path(&path))
            .unwrap_or_else(|_| DEFAULT_MEDIA_PATH.to_string());

        let bucket = match env::var("MEDIA_BUCKET") {
            Ok(bucket) if !bucket.trim().is_empty() => bucket,
            _ => {
                let cwd = env::current_dir()?;
                format!("file://{}", cwd.join(&media_path).display())
            }
        };

        Ok(Self::new(bucket).with_media_path(media_path))
    }

    pub fn with_media_path<S: AsRef<str>>(mut self, media_path: S) -> Self {
        self.media_path = trim_media_path(media_path.as_ref());
        self
    }

    pub fn with_scheme<S: Into<String>>(mut self, scheme: S) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn with_gcs(mut self, gcs: GcsConfig) -> Self {
        self.gcs = Some(gcs);
        self
    }

    /// Parse the storage URI. Unknown schemes are configuration errors.
    pub fn location(&self) -> MediaResult<StorageLocation> {
        StorageLocation::parse(&self.bucket).map_err(|err| {
            MediaError::configuration(format!(
                "invalid media storage {:?}: {}",
                self.bucket, err
            ))
        })
    }
}

fn trim_media_path(path: &str) -> String {
    path.trim().trim_matches('/').to_string()
}
