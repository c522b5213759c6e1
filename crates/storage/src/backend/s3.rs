//! S3-compatible storage backend.
//!
//! This is the remote object store that the latest image per catalog entry
//! is published to. Any S3-compatible service works, including Supabase
//! Storage through its S3 endpoint.
//!
//! # Credentials
//!
//! Credentials are provided explicitly via configuration (`remote.key_id` and
//! `remote.key_secret`); the AWS credential chain is not consulted.

use crate::{
    FileInfo, StorageBackend,
    backend::FileInfoStream,
    error::{ErrorKind, Result},
    validate_path,
};
use async_stream::stream;
use async_trait::async_trait;
use aws_sdk_s3::{
    Client,
    config::{BehaviorVersion, Credentials, Region, retry::RetryConfig},
    error::{DisplayErrorContext, SdkError},
    primitives::{ByteStream, DateTime},
};
use exn::{OptionExt, ResultExt};
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;

/// S3-compatible storage backend.
///
/// Stores files in an S3 bucket, optionally under a key prefix. All paths are
/// relative to the configured prefix (if any).
///
/// # Examples
///
/// ```no_run
/// use mnemo_storage::backend::S3Backend;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = S3Backend::new(
///     "supabase",
///     "mnemonics",
///     Some("images".to_string()),
///     "us-east-1",
///     Some("https://project.supabase.co/storage/v1/s3"),
///     "access_key_id",
///     "secret_access_key",
/// )?
/// .with_public_base_url("https://project.supabase.co/storage/v1/object/public/mnemonics");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct S3Backend {
    name: String,
    client: Client,
    bucket: String,
    prefix: Option<String>,
    region: String,
    endpoint: Option<String>,
    public_base_url: Option<String>,
}

impl S3Backend {
    /// Create a new S3 storage backend.
    ///
    /// # Arguments
    /// * `name` - A name for this backend (used in logging)
    /// * `bucket` - S3 bucket name
    /// * `prefix` - Optional key prefix (acts as virtual directory)
    /// * `region` - Region name; S3-compatible services mostly accept anything
    /// * `endpoint` - Custom endpoint URL for S3-compatible services
    /// * `key_id` - Access key ID
    /// * `key_secret` - Secret access key
    pub fn new(
        name: impl Into<String>,
        bucket: impl Into<String>,
        prefix: Option<String>,
        region: impl Into<String>,
        endpoint: Option<impl Into<String>>,
        key_id: impl Into<String>,
        key_secret: impl Into<String>,
    ) -> Result<Self> {
        let prefix = prefix
            .map(validate_path)
            .transpose()?
            .map(|p| p.to_str().map(|s| s.to_string()).ok_or_raise(|| ErrorKind::InvalidPath(p)))
            .transpose()?;
        let region = region.into();
        let endpoint = endpoint.map(|e| e.into().trim_end_matches('/').to_string());
        let credentials = Credentials::new(key_id, key_secret, None, None, "mnemo-config");
        let mut config_builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new(region.clone()))
            // Every remote call is a single attempt; a failed key is reported
            // and picked up again by the next run.
            .retry_config(RetryConfig::disabled())
            // Path-style addressing for S3-compatible services (Supabase,
            // MinIO, etc.)
            .force_path_style(true);
        if let Some(endpoint_url) = &endpoint {
            config_builder = config_builder.endpoint_url(endpoint_url);
        }
        Ok(Self {
            name: name.into(),
            client: Client::from_conf(config_builder.build()),
            bucket: bucket.into(),
            prefix,
            region,
            endpoint,
            public_base_url: None,
        })
    }

    /// Base URL that public object URLs are built from.
    ///
    /// Without one, URLs are derived from the endpoint (path-style) or from
    /// the AWS virtual-hosted naming scheme.
    pub fn with_public_base_url(mut self, url: impl Into<String>) -> Self {
        self.public_base_url = Some(url.into().trim_end_matches('/').to_string());
        self
    }

    /// Construct the full S3 key from a relative path.
    fn full_key(&self, path: &Path) -> Result<String> {
        let validated = validate_path(path)?;
        let path_str = validated.to_str().ok_or_raise(|| ErrorKind::InvalidPath(validated.clone()))?;
        Ok(match &self.prefix {
            Some(prefix) => format!("{}/{}", prefix.trim_end_matches('/'), path_str),
            None => path_str.to_string(),
        })
    }

    /// Strip the configured prefix from an S3 key to get relative path.
    fn relative_path(&self, key: &str) -> Result<PathBuf> {
        let relative = match &self.prefix {
            Some(prefix) => {
                let prefix_normalized = prefix.trim_end_matches('/');
                key.strip_prefix(prefix_normalized).and_then(|s| s.strip_prefix('/')).unwrap_or(key)
            },
            None => key,
        };
        validate_path(relative)
    }

    /// Convert AWS DateTime to OffsetDateTime.
    fn parse_datetime(dt: &DateTime) -> Result<OffsetDateTime> {
        OffsetDateTime::from_unix_timestamp_nanos(dt.as_nanos())
            .or_raise(|| ErrorKind::BackendError("S3 datetime out of range".to_string()))
    }

    /// Transport problems are network errors, everything the service
    /// answered with is a backend error.
    fn sdk_error<E, R>(err: &SdkError<E, R>) -> ErrorKind
    where
        E: std::error::Error + 'static,
        R: Debug,
    {
        let message = DisplayErrorContext(err).to_string();
        match err {
            SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => ErrorKind::Network(message),
            _ => ErrorKind::BackendError(message),
        }
    }
}

#[async_trait]
impl StorageBackend for S3Backend {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> FileInfoStream<'a> {
        let key_prefix = match prefix {
            Some(pfx) => match self.full_key(pfx) {
                Ok(key) => Some(key),
                Err(e) => return Box::pin(futures::stream::once(async { Err(e) })),
            },
            None => self.prefix.as_ref().map(|p| format!("{}/", p.trim_end_matches('/'))),
        };

        Box::pin(stream! {
            let mut pages = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .set_prefix(key_prefix)
                .into_paginator()
                .send();
            while let Some(page) = pages.next().await {
                let page = match page {
                    Ok(page) => page,
                    Err(err) => {
                        yield Err(exn::Exn::from(Self::sdk_error(&err)));
                        break;
                    },
                };
                for object in page.contents() {
                    let Some(key) = object.key() else { continue };
                    // Directory placeholder objects.
                    if key.ends_with('/') {
                        continue;
                    }
                    let path = match self.relative_path(key) {
                        Ok(path) => path,
                        Err(e) => { yield Err(e); continue; },
                    };
                    let modified = match object.last_modified().map(Self::parse_datetime).transpose() {
                        Ok(modified) => modified.unwrap_or(OffsetDateTime::UNIX_EPOCH),
                        Err(e) => { yield Err(e); continue; },
                    };
                    let size = object.size().unwrap_or_default().max(0) as u64;
                    yield Ok(FileInfo::new(path, size, modified));
                }
            }
        })
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        match self.stat(path).await {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    #[tracing::instrument(level = "debug", skip(self), fields(backend = %self.name))]
    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let key = self.full_key(path)?;
        let output = match self.client.get_object().bucket(&self.bucket).key(&key).send().await {
            Ok(output) => output,
            Err(err) if err.as_service_error().is_some_and(|e| e.is_no_such_key()) => {
                exn::bail!(ErrorKind::NotFound(path.to_path_buf()))
            },
            Err(err) => exn::bail!(Self::sdk_error(&err)),
        };
        let body = output
            .body
            .collect()
            .await
            .or_raise(|| ErrorKind::Network(format!("interrupted reading body of {key}")))?;
        Ok(body.into_bytes().to_vec())
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        self.upload(path, data, crate::content_type_for(path)).await
    }

    /// A single `PutObject`: S3 never exposes a partially uploaded object.
    #[tracing::instrument(level = "debug", skip(self, data), fields(backend = %self.name, size = data.len()))]
    async fn upload(&self, path: &Path, data: &[u8], content_type: &str) -> Result<()> {
        let key = self.full_key(path)?;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type)
            .body(ByteStream::from(data.to_vec()))
            .send()
            .await
            .map_err(|err| Self::sdk_error(&err))?;
        Ok(())
    }

    /// S3 reports success when deleting a key that does not exist, so this
    /// never returns [`NotFound`](ErrorKind::NotFound).
    #[tracing::instrument(level = "debug", skip(self), fields(backend = %self.name))]
    async fn delete(&self, path: &Path) -> Result<()> {
        let key = self.full_key(path)?;
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|err| Self::sdk_error(&err))?;
        Ok(())
    }

    async fn stat(&self, path: &Path) -> Result<FileInfo> {
        let key = self.full_key(path)?;
        let output = match self.client.head_object().bucket(&self.bucket).key(&key).send().await {
            Ok(output) => output,
            Err(err) if err.as_service_error().is_some_and(|e| e.is_not_found()) => {
                exn::bail!(ErrorKind::NotFound(path.to_path_buf()))
            },
            Err(err) => exn::bail!(Self::sdk_error(&err)),
        };
        let modified = output
            .last_modified()
            .map(Self::parse_datetime)
            .transpose()?
            .unwrap_or(OffsetDateTime::UNIX_EPOCH);
        let size = output.content_length().unwrap_or_default().max(0) as u64;
        Ok(FileInfo::new(validate_path(path)?, size, modified))
    }

    fn public_url(&self, path: &Path) -> Result<String> {
        let key = self.full_key(path)?;
        Ok(match (&self.public_base_url, &self.endpoint) {
            (Some(base), _) => format!("{base}/{key}"),
            (None, Some(endpoint)) => format!("{endpoint}/{}/{key}", self.bucket),
            (None, None) => format!("https://{}.s3.{}.amazonaws.com/{key}", self.bucket, self.region),
        })
    }
}
