//! Storage backend trait and implementations.
//!
//! The `StorageBackend` trait is the single interface behind both the local
//! artifact pool and the remote object store that images are published to.

mod local;
#[cfg(feature = "mock")]
mod mock;
#[cfg(feature = "s3")]
mod s3;

pub use self::local::LocalBackend;
#[cfg(feature = "mock")]
pub use self::mock::MockBackend;
#[cfg(feature = "s3")]
pub use self::s3::S3Backend;
use crate::error::Result;
use crate::models::FileInfo;
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use std::path::Path;
use std::pin::Pin;

pub(crate) type FileInfoStream<'a> = Pin<Box<dyn Stream<Item = Result<FileInfo>> + Send + 'a>>;

/// Unified interface for storage backends.
///
/// # Path Handling
/// All paths are relative to the storage root and must be validated using
/// [`validate_path`](crate::validate_path) before use. Implementations
/// enforce this validation.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use mnemo_storage::{backend::StorageBackend, error::Result};
///
/// async fn publish_copy(pool: &dyn StorageBackend, remote: &dyn StorageBackend, name: &str) -> Result<String> {
///     let path = Path::new(name);
///     let bytes = pool.read(path).await?;
///     remote.upload(path, &bytes, "image/png").await?;
///     remote.public_url(path)
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Name of the configured backend. Used for logging only.
    fn name(&self) -> &str;

    /// Make sure the backend root exists and is usable.
    ///
    /// Called once before a batch of writes. Backends without a notion of
    /// "root" (object stores) have nothing to do here.
    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    /// List all files matching an optional prefix.
    ///
    /// Default implementation of this method is to collect all the results
    /// from [`list_stream()`](Self::list_stream) into a [`Vec`] before
    /// returning.
    async fn list(&self, prefix: Option<&Path>) -> Result<Vec<FileInfo>> {
        self.list_stream(prefix).try_collect().await
    }

    /// Stream file metadata matching an optional prefix.
    ///
    /// Listing a root or prefix that does not exist yields an empty stream,
    /// not an error.
    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> FileInfoStream<'a>;

    /// Check if a file exists.
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Read file contents.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Write file contents, creating or overwriting the file.
    ///
    /// The whole payload is handed over at once. Implementations must never
    /// leave a partially written file at `path`: either the previous state
    /// survives or the complete new contents are visible.
    async fn write(&self, path: &Path, data: &[u8]) -> Result<()>;

    /// Write file contents with an explicit content type.
    ///
    /// Object stores record the content type alongside the object so it is
    /// served correctly from the public URL. The default implementation
    /// ignores it and delegates to [`write()`](Self::write).
    async fn upload(&self, path: &Path, data: &[u8], content_type: &str) -> Result<()> {
        tracing::trace!(path = %path.display(), content_type, "Backend ignores content type");
        self.write(path, data).await
    }

    /// Delete a file.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist (where the backend is able to tell).
    async fn delete(&self, path: &Path) -> Result<()>;

    /// Get file metadata without reading contents.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn stat(&self, path: &Path) -> Result<FileInfo>;

    /// Public reference for the object at `path`.
    ///
    /// Pure string construction: no request is made and the object does not
    /// need to exist.
    fn public_url(&self, path: &Path) -> Result<String>;
}

