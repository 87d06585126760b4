use std::env;

use crate::{BlobError, BlobResult};

/// Configuration for the Cloud Storage backend.
///
/// Buckets are reached through the S3-interoperable XML API, authenticated
/// with an HMAC key pair.
#[derive(Debug, Clone)]
pub struct GcsConfig {
    /// HMAC access id
    pub access_key_id: String,

    /// HMAC secret
    pub secret_access_key: String,

    /// XML API endpoint
    pub endpoint_url: String,

    /// Signing region; Cloud Storage accepts `auto`
    pub region: String,
}

impl GcsConfig {
    pub const DEFAULT_ENDPOINT: &'static str = "https://storage.googleapis.com";
    pub const DEFAULT_REGION: &'static str = "auto";

    /// Create a config with the default endpoint and region
    pub fn new<A: Into<String>, S: Into<String>>(access_key_id: A, secret_access_key: S) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            endpoint_url: Self::DEFAULT_ENDPOINT.to_string(),
            region: Self::DEFAULT_REGION.to_string(),
        }
    }

    /// Read `GCS_ACCESS_KEY_ID`, `GCS_SECRET_ACCESS_KEY` and the optional
    /// `GCS_ENDPOINT_URL` / `GCS_REGION` overrides.
    pub fn from_env() -> BlobResult<Self> {
        fn get_env(key: &str) -> BlobResult<String> {
            env::var(key)
                .map_err(|_| BlobError::invalid(format!("{} environment variable required", key)))
        }

        let mut config = Self::new(
            get_env("GCS_ACCESS_KEY_ID")?,
            get_env("GCS_SECRET_ACCESS_KEY")?,
        );
        if let Ok(endpoint) = env::var("GCS_ENDPOINT_URL") {
            config = config.with_endpoint(endpoint);
        }
        if let Ok(region) = env::var("GCS_REGION") {
            config = config.with_region(region);
        }
        Ok(config)
    }

    /// Point at a different XML API endpoint (emulators, private gateways)
    pub fn with_endpoint<S: Into<String>>(mut self, endpoint_url: S) -> Self {
        self.endpoint_url = endpoint_url.into();
        self
    }

    /// Set the signing region
    pub fn with_region<S: Into<String>>(mut self, region: S) -> Self {
        self.region = region.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_overrides() {
        let config = GcsConfig::new("GOOG1E", "secret");
        assert_eq!(config.endpoint_url, GcsConfig::DEFAULT_ENDPOINT);
        assert_eq!(config.region, "auto");

        let config = config
            .with_endpoint("http://127.0.0.1:4443")
            .with_region("europe-west1");
        assert_eq!(config.endpoint_url, "http://127.0.0.1:4443");
        assert_eq!(config.region, "europe-west1");
    }
}
