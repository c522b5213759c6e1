//! In-memory storage backend for testing.

use super::FileInfoStream;
use crate::error::{ErrorKind, Result};
use crate::models::FileInfo;
use crate::path::validate as validate_path;
use async_stream::stream;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::StorageBackend;

struct StoredObject {
    modified: OffsetDateTime,
    content_type: Option<String>,
    data: Vec<u8>,
}

/// In-memory storage backend for testing.
///
/// Files are stored in a `HashMap` behind a [`RwLock`], so all trait methods
/// can operate on `&self` without external synchronisation. Stands in for
/// both the artifact pool and the remote object store in tests.
///
/// # Examples
///
/// ```
/// use mnemo_storage::backend::{MockBackend, StorageBackend};
/// use std::path::Path;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MockBackend::with_files([
///     ("001_two_sum.png", b"\x89PNG...".to_vec()),
/// ]);
/// assert!(backend.exists(Path::new("001_two_sum.png")).await?);
///
/// backend.upload(Path::new("053_maximum_subarray.png"), b"data", "image/png").await?;
/// assert_eq!(backend.content_type(Path::new("053_maximum_subarray.png")).await.as_deref(), Some("image/png"));
/// # Ok(())
/// # }
/// ```
pub struct MockBackend {
    name: String,
    storage: RwLock<HashMap<PathBuf, StoredObject>>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MockBackend {
    /// Create a mock backend pre-populated with files.
    ///
    /// Panics if any path fails validation (e.g. path traversal). If test
    /// setup is wrong, then test should not pass.
    pub fn with_files(files: impl IntoIterator<Item = (impl Into<PathBuf>, impl Into<Vec<u8>>)>) -> Self {
        let mut map = HashMap::new();
        let now = OffsetDateTime::now_utc();
        for (path, data) in files {
            let path = path.into();
            let Ok(validated) = validate_path(&path) else {
                // The panic here is DELIBERATE. MockBackend is intended to be
                // used in tests; panics are expected. There is no error result.
                panic!("MockBackend::with_files: invalid path {}", path.display());
            };
            map.insert(validated, StoredObject { modified: now, content_type: None, data: data.into() });
        }
        Self {
            name: "mock".to_string(),
            storage: RwLock::new(map),
            fail_writes: AtomicBool::new(false),
            writes: AtomicUsize::new(0),
        }
    }

    /// Change the name of the mock backend.
    ///
    /// The name shows up in [`public_url()`](StorageBackend::public_url).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Make every subsequent write or upload fail with a network error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes and uploads so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Content type recorded by the last upload to `path`, if any.
    pub async fn content_type(&self, path: &Path) -> Option<String> {
        let path = validate_path(path).ok()?;
        self.storage.read().await.get(&path).and_then(|object| object.content_type.clone())
    }

    /// Sorted snapshot of every stored path and its contents.
    pub async fn snapshot(&self) -> Vec<(PathBuf, Vec<u8>)> {
        let guard = self.storage.read().await;
        let mut entries: Vec<_> = guard.iter().map(|(path, object)| (path.clone(), object.data.clone())).collect();
        entries.sort();
        entries
    }

    async fn store(&self, path: &Path, data: &[u8], content_type: Option<&str>) -> Result<()> {
        let path = validate_path(path)?;
        if self.fail_writes.load(Ordering::SeqCst) {
            exn::bail!(ErrorKind::Network(format!("refusing write to {}", path.display())));
        }
        let object = StoredObject {
            modified: OffsetDateTime::now_utc(),
            content_type: content_type.map(str::to_string),
            data: data.to_vec(),
        };
        self.storage.write().await.insert(path, object);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
impl Default for MockBackend {
    fn default() -> Self {
        let files: [(&str, &str); 0] = [];
        Self::with_files(files)
    }
}

#[async_trait]
impl StorageBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> FileInfoStream<'a> {
        let validated_prefix = match prefix.map(validate_path).transpose() {
            Ok(pfx) => pfx,
            Err(e) => return Box::pin(futures::stream::once(async { Err(e) })),
        };

        Box::pin(stream! {
            // Snapshot matching entries under the read lock, then drop it
            // before yielding to avoid holding the lock across yield points.
            let entries: Vec<FileInfo> = {
                let guard = self.storage.read().await;
                guard
                    .iter()
                    .filter(|(path, _)| match &validated_prefix {
                        Some(pfx) => path.starts_with(pfx),
                        None => true,
                    })
                    .map(|(path, object)| FileInfo::new(path.clone(), object.data.len() as u64, object.modified))
                    .collect()
            };
            for info in entries {
                yield Ok(info);
            }
        })
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        let path = validate_path(path)?;
        Ok(self.storage.read().await.contains_key(&path))
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let path = validate_path(path)?;
        let guard = self.storage.read().await;
        let object = guard.get(&path).ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path.clone())))?;
        Ok(object.data.clone())
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        self.store(path, data, None).await
    }

    async fn upload(&self, path: &Path, data: &[u8], content_type: &str) -> Result<()> {
        self.store(path, data, Some(content_type)).await
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        let path = validate_path(path)?;
        self.storage.write().await.remove(&path).map(|_| ()).ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path)))
    }

    async fn stat(&self, path: &Path) -> Result<FileInfo> {
        let path = validate_path(path)?;
        let guard = self.storage.read().await;
        let object = guard.get(&path).ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path.clone())))?;
        Ok(FileInfo::new(path.clone(), object.data.len() as u64, object.modified))
    }

    fn public_url(&self, path: &Path) -> Result<String> {
        let path = validate_path(path)?;
        Ok(format!("mock://{}/{}", self.name, path.display()))
    }
}
