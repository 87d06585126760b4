use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream as AwsByteStream;
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, instrument};

use crate::{BlobError, BlobKey, BlobMetadata, BlobResult, BlobStore, GcsConfig};

/// Google Cloud Storage store using the AWS SDK against the XML API.
///
/// Objects live at `prefix/key` inside `bucket`. The store owns a
/// current-thread runtime and blocks on each request, so it must not be
/// called from inside another async runtime.
pub struct GcsStore {
    client: Client,
    bucket: String,
    prefix: String,
    runtime: Runtime,
}

impl GcsStore {
    pub fn new<B: Into<String>, P: Into<String>>(
        bucket: B,
        prefix: P,
        config: GcsConfig,
    ) -> BlobResult<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        let client = runtime.block_on(Self::create_client(config));

        Ok(Self {
            client,
            bucket: bucket.into(),
            prefix: prefix.into().trim_matches('/').to_string(),
            runtime,
        })
    }

    /// Build a store with credentials from [`GcsConfig::from_env`]
    pub fn from_env<B: Into<String>, P: Into<String>>(bucket: B, prefix: P) -> BlobResult<Self> {
        Self::new(bucket, prefix, GcsConfig::from_env()?)
    }

    async fn create_client(config: GcsConfig) -> Client {
        let credentials = Credentials::new(
            config.access_key_id,
            config.secret_access_key,
            None,
            None,
            "stack-gcs",
        );

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .endpoint_url(config.endpoint_url)
            .load()
            .await;

        Client::from_conf(
            aws_sdk_s3::config::Builder::from(&sdk_config)
                .force_path_style(true)
                .build(),
        )
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Object name inside the bucket for `key`
    pub fn object_name(&self, key: &BlobKey) -> String {
        key.with_prefix(&self.prefix)
    }
}

impl std::fmt::Debug for GcsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcsStore")
            .field("bucket", &self.bucket)
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl BlobStore for GcsStore {
    fn name(&self) -> &'static str {
        "gcs"
    }

    #[instrument(level = "debug", skip(self), fields(bucket = %self.bucket))]
    fn get(&self, key: &BlobKey) -> BlobResult<Vec<u8>> {
        let name = self.object_name(key);
        self.runtime.block_on(async {
            let output = self
                .client
                .get_object()
                .bucket(&self.bucket)
                .key(&name)
                .send()
                .await
                .map_err(|e| map_sdk_error(key, e))?;

            let body = output.body.collect().await.map_err(BlobError::backend)?;
            Ok::<_, BlobError>(body.into_bytes().to_vec())
        })
    }

    #[instrument(level = "debug", skip(self), fields(bucket = %self.bucket))]
    fn stat(&self, key: &BlobKey) -> BlobResult<BlobMetadata> {
        let name = self.object_name(key);
        let head = self.runtime.block_on(async {
            self.client
                .head_object()
                .bucket(&self.bucket)
                .key(&name)
                .send()
                .await
                .map_err(|e| map_sdk_error(key, e))
        })?;

        let modified_at = head
            .last_modified()
            .and_then(|t| DateTime::<Utc>::from_timestamp(t.secs(), t.subsec_nanos()))
            .unwrap_or_else(Utc::now);
        let size = head.content_length().unwrap_or(0).max(0) as u64;

        Ok(BlobMetadata::uniform(size, modified_at))
    }

    #[instrument(level = "debug", skip(self, content), fields(bucket = %self.bucket, len = content.len()))]
    fn set(&self, key: &BlobKey, content: &[u8]) -> BlobResult<()> {
        let name = self.object_name(key);
        let body = AwsByteStream::from(content.to_vec());
        let result = self.runtime.block_on(async {
            self.client
                .put_object()
                .bucket(&self.bucket)
                .key(&name)
                .body(body)
                .send()
                .await
                .map_err(BlobError::backend)
        })?;

        debug!("stored {} etag={:?}", name, result.e_tag());
        Ok(())
    }

    #[instrument(level = "debug", skip(self), fields(bucket = %self.bucket))]
    fn remove(&self, key: &BlobKey) -> BlobResult<()> {
        let name = self.object_name(key);
        self.runtime.block_on(async {
            self.client
                .delete_object()
                .bucket(&self.bucket)
                .key(&name)
                .send()
                .await
                .map_err(|e| map_sdk_error(key, e))
        })?;
        Ok(())
    }
}

/// Turn a remote "no such object" into `NotFound`, anything else into a backend error.
fn map_sdk_error<E>(key: &BlobKey, err: SdkError<E, HttpResponse>) -> BlobError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let status = err.raw_response().map(|r| r.status().as_u16());
    let code = err.as_service_error().and_then(|e| e.code());

    if is_not_found(status, code) {
        BlobError::not_found(key.as_str())
    } else {
        BlobError::backend(err)
    }
}

pub(crate) fn is_not_found(status: Option<u16>, code: Option<&str>) -> bool {
    status == Some(404) || matches!(code, Some("NoSuchKey" | "NotFound"))
}
