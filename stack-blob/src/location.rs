use std::fmt;
use std::path::PathBuf;

use crate::{BlobError, BlobResult};

/// Where blobs live, parsed from a storage URI.
///
/// | URI                       | Location                     |
/// |---------------------------|------------------------------|
/// | `file:///srv/www`         | `Local { root: /srv/www }`   |
/// | `/srv/www` (no scheme)    | `Local { root: /srv/www }`   |
/// | `gs://bucket/prefix`      | `Gcs { bucket, prefix }`     |
/// | `gcs://bucket/prefix`     | `Gcs { bucket, prefix }`     |
/// | `objcache://`             | `ObjectCache`                |
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageLocation {
    Local { root: PathBuf },
    Gcs { bucket: String, prefix: String },
    ObjectCache,
}

impl StorageLocation {
    /// Parse a storage URI. Unknown schemes are rejected.
    pub fn parse(uri: &str) -> BlobResult<Self> {
        let uri = uri.trim();
        let (scheme, rest) = match uri.split_once("://") {
            Some((scheme, rest)) => (scheme.to_ascii_lowercase(), rest),
            None => (String::new(), uri),
        };

        match scheme.as_str() {
            "objcache" => Ok(Self::ObjectCache),
            "gs" | "gcs" => {
                let (bucket, prefix) = rest.split_once('/').unwrap_or((rest, ""));
                if bucket.is_empty() {
                    return Err(BlobError::invalid(format!(
                        "storage URI {:?} has no bucket",
                        uri
                    )));
                }
                Ok(Self::Gcs {
                    bucket: bucket.to_string(),
                    prefix: prefix.trim_matches('/').to_string(),
                })
            }
            "file" | "" => Ok(Self::Local {
                root: PathBuf::from(rest),
            }),
            _ => Err(BlobError::unsupported_scheme(scheme)),
        }
    }

    /// Scheme name as it would appear in a URI
    pub fn scheme(&self) -> &'static str {
        match self {
            Self::Local { .. } => "file",
            Self::Gcs { .. } => "gs",
            Self::ObjectCache => "objcache",
        }
    }
}

impl fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local { root } => write!(f, "file://{}", root.display()),
            Self::Gcs { bucket, prefix } if prefix.is_empty() => write!(f, "gs://{}", bucket),
            Self::Gcs { bucket, prefix } => write!(f, "gs://{}/{}", bucket, prefix),
            Self::ObjectCache => write!(f, "objcache://"),
        }
    }
}

impl std::str::FromStr for StorageLocation {
    type Err = BlobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
