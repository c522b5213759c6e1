use crate::publish::error::{Error as PublishError, ErrorKind as PublishErrorKind, Result as PublishResult};
use crate::resolve::{Resolution, resolve};
use exn::{OptionExt, ResultExt};
use mnemo_records::Repository;
use mnemo_storage::BackendHandle;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Scheme of the placeholder URLs a dry run reports.
pub const DRY_RUN_SCHEME: &str = "dry-run://";
const CONTENT_TYPE: &str = "image/png";

enum Mode {
    /// No remote or record store is touched.
    DryRun,
    Live { remote: BackendHandle, records: Repository },
}

/// Publishes artifacts from a pool to a remote store.
///
/// The mode is fixed at construction: [`new`](Self::new) holds the remote
/// store and the record repository, [`dry_run`](Self::dry_run) holds neither
/// and reports placeholder URLs.
pub struct Publisher {
    pool: BackendHandle,
    mode: Mode,
}
impl fmt::Debug for Publisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let remote = match &self.mode {
            Mode::DryRun => "dry-run",
            Mode::Live { remote, .. } => remote.name(),
        };
        f.debug_struct("Publisher").field("pool", &self.pool.name()).field("remote", &remote).finish()
    }
}

/// What happened to the publish record of a key.
#[derive(Debug)]
pub enum RecordStatus {
    Updated,
    /// Record updates were switched off for this run.
    NotRequested,
    /// The upload failed, so there was no URL to record.
    NotAttempted,
    /// No record exists for the key. Records are never created by publishing.
    Missing,
    Failed(PublishError),
}

#[derive(Debug)]
pub struct PublishOutcome {
    pub key: u32,
    pub raw_name: String,
    pub public_url: Result<String, PublishError>,
    pub record: RecordStatus,
}
impl PublishOutcome {
    /// The upload worked and so did the record update, unless it was not
    /// requested.
    pub fn succeeded(&self) -> bool {
        self.public_url.is_ok() && matches!(self.record, RecordStatus::Updated | RecordStatus::NotRequested)
    }
}

/// Latest artifact per key in `listing`, restricted to `filter` if given.
///
/// Fails with [`NotFound`](PublishErrorKind::NotFound) when the filter names
/// a key without any artifact.
pub fn resolve_targets<I, S>(listing: I, filter: Option<u32>) -> PublishResult<BTreeMap<u32, String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    restrict(&resolve(listing), filter)
}

pub(crate) fn restrict(resolution: &Resolution, filter: Option<u32>) -> PublishResult<BTreeMap<u32, String>> {
    let Some(key) = filter else {
        return Ok(resolution.targets());
    };
    let name = resolution.get(key).ok_or_raise(|| PublishErrorKind::NotFound(key))?;
    Ok(BTreeMap::from([(key, name.raw_name.clone())]))
}

impl Publisher {
    pub fn new(pool: BackendHandle, remote: BackendHandle, records: Repository) -> Self {
        Self { pool, mode: Mode::Live { remote, records } }
    }

    pub fn dry_run(pool: BackendHandle) -> Self {
        Self { pool, mode: Mode::DryRun }
    }

    pub fn is_dry_run(&self) -> bool {
        matches!(self.mode, Mode::DryRun)
    }

    pub fn pool(&self) -> &BackendHandle {
        &self.pool
    }

    /// Upload `raw_name` from the pool and return its public URL.
    ///
    /// Any object already stored under the same name is deleted first, so
    /// publishing the same bytes twice leaves the remote store in the same
    /// state and returns the same URL. Failures are logged and reported as
    /// `None`.
    pub async fn publish_one(&self, key: u32, raw_name: &str) -> Option<String> {
        match self.upload(key, raw_name).await {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(key, raw_name, error = ?e, "Failed to publish artifact");
                None
            },
        }
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn upload(&self, key: u32, raw_name: &str) -> PublishResult<String> {
        let path = Path::new(raw_name);
        let bytes = self.pool.read(path).await.or_raise(|| PublishErrorKind::Pool)?;
        let Mode::Live { remote, .. } = &self.mode else {
            tracing::info!(key, raw_name, size = bytes.len(), "Would publish artifact");
            return Ok(format!("{DRY_RUN_SCHEME}{raw_name}"));
        };

        match remote.delete(path).await {
            Ok(()) => tracing::debug!(remote = remote.name(), "Deleted previous remote object"),
            Err(e) if e.is_not_found() => {},
            Err(e) => return Err(e).or_raise(|| PublishErrorKind::Remote),
        }
        remote.upload(path, &bytes, CONTENT_TYPE).await.or_raise(|| PublishErrorKind::Remote)?;
        let url = remote.public_url(path).or_raise(|| PublishErrorKind::Remote)?;
        tracing::info!(key, raw_name, %url, size = bytes.len(), "Published artifact");
        Ok(url)
    }

    /// Point the record for `key` at `public_url`.
    ///
    /// Never creates a record. Returns `false`, with a warning, when no
    /// record matches or the update fails. A dry run returns `true` without
    /// touching the record store.
    pub async fn update_record(&self, key: u32, public_url: &str) -> bool {
        matches!(self.record(key, public_url).await, RecordStatus::Updated)
    }

    async fn record(&self, key: u32, public_url: &str) -> RecordStatus {
        let Mode::Live { records, .. } = &self.mode else {
            return RecordStatus::Updated;
        };
        match records.update_public_url(key, public_url).await.or_raise(|| PublishErrorKind::Records) {
            Ok(true) => RecordStatus::Updated,
            Ok(false) => {
                tracing::warn!(key, "No publish record for key, nothing updated");
                RecordStatus::Missing
            },
            Err(e) => {
                tracing::warn!(key, error = ?e, "Failed to update publish record");
                RecordStatus::Failed(e)
            },
        }
    }

    /// Publish one artifact and, unless `skip_record_update`, record it.
    pub async fn publish_file(&self, key: u32, raw_name: &str, skip_record_update: bool) -> PublishOutcome {
        let public_url = self.upload(key, raw_name).await;
        let record = match &public_url {
            Err(e) => {
                tracing::warn!(key, raw_name, error = ?e, "Failed to publish artifact");
                RecordStatus::NotAttempted
            },
            Ok(_) if skip_record_update => RecordStatus::NotRequested,
            Ok(url) => self.record(key, url).await,
        };
        PublishOutcome { key, raw_name: raw_name.to_string(), public_url, record }
    }
}
