use crate::generate::error::{Error as GenerateError, ErrorKind as GenerateErrorKind, Result as GenerateResult};
use exn::{OptionExt, ResultExt};
use mnemo_catalog::naming::apply_version;
use mnemo_catalog::{Catalog, PromptBuilder, VersionLabel};
use mnemo_imagegen::{GeneratorHandle, is_png};
use mnemo_storage::BackendHandle;
use std::fmt;
use std::path::Path;

enum Mode {
    /// Nothing leaves the process and nothing is written.
    DryRun,
    Live { generator: GeneratorHandle, prompts: PromptBuilder },
}

/// Generates artifacts into a pool.
///
/// Built either [live](Self::new), with a generator and a prompt builder, or
/// as a [dry run](Self::dry_run) that only needs the pool to know where
/// artifacts would have gone.
pub struct Driver {
    pool: BackendHandle,
    mode: Mode,
}
impl fmt::Debug for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match &self.mode {
            Mode::DryRun => "dry-run",
            Mode::Live { generator, .. } => generator.name(),
        };
        f.debug_struct("Driver").field("pool", &self.pool.name()).field("mode", &mode).finish()
    }
}

/// What happened to a single key.
#[derive(Debug)]
pub enum GenerateStatus {
    /// The artifact was written to the pool.
    Written { size: usize },
    /// Dry run: the artifact would have been written.
    Planned,
    Failed(GenerateError),
}

#[derive(Debug)]
pub struct GenerateOutcome {
    pub key: u32,
    /// Versioned filename in the pool; `None` when the key is not in the
    /// catalog.
    pub filename: Option<String>,
    pub status: GenerateStatus,
}
impl GenerateOutcome {
    pub fn succeeded(&self) -> bool {
        !matches!(self.status, GenerateStatus::Failed(_))
    }
}

impl Driver {
    pub fn new(pool: BackendHandle, generator: GeneratorHandle, prompts: PromptBuilder) -> Self {
        Self { pool, mode: Mode::Live { generator, prompts } }
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

    /// Make sure the pool can be written to. Does nothing in a dry run.
    pub(crate) async fn prepare(&self) -> GenerateResult<()> {
        if self.is_dry_run() {
            return Ok(());
        }
        self.pool.initialize().await.or_raise(|| GenerateErrorKind::Storage)
    }

    /// Generate the artifact for `key`, versioned with `label` if given.
    ///
    /// Returns `false` and leaves the pool untouched when the key is not in
    /// the catalog, the generator fails, or its payload is empty or not a PNG
    /// image. The pool is expected to exist; see
    /// [`generate_batch`](Self::generate_batch) for the variant that creates
    /// it.
    pub async fn generate_one(&self, catalog: &Catalog, key: u32, label: Option<&VersionLabel>) -> bool {
        self.generate_file(catalog, key, label).await.succeeded()
    }

    /// Like [`generate_one`](Self::generate_one), with the full outcome.
    #[tracing::instrument(skip(self, catalog, label), fields(label = ?label))]
    pub async fn generate_file(&self, catalog: &Catalog, key: u32, label: Option<&VersionLabel>) -> GenerateOutcome {
        let filename = catalog.get(key).map(|entry| apply_version(&entry.filename, label));
        let status = match self.generate_file_inner(catalog, key, label).await {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!(error = ?e, "Failed to generate artifact");
                GenerateStatus::Failed(e)
            },
        };
        GenerateOutcome { key, filename, status }
    }

    async fn generate_file_inner(
        &self,
        catalog: &Catalog,
        key: u32,
        label: Option<&VersionLabel>,
    ) -> GenerateResult<GenerateStatus> {
        let entry = catalog.get(key).ok_or_raise(|| GenerateErrorKind::UnknownKey(key))?;
        let filename = apply_version(&entry.filename, label);

        let (generator, prompts) = match &self.mode {
            Mode::DryRun => {
                tracing::info!(%filename, "Would generate artifact");
                return Ok(GenerateStatus::Planned);
            },
            Mode::Live { generator, prompts } => (generator, prompts),
        };

        let prompt = prompts.build(entry).or_raise(|| GenerateErrorKind::Prompt)?;
        tracing::debug!(generator = generator.name(), title = %entry.title, "Requesting image");
        let bytes = generator.generate(&prompt).await.or_raise(|| GenerateErrorKind::Generator)?;
        if bytes.is_empty() {
            exn::bail!(GenerateErrorKind::EmptyPayload);
        }
        if !is_png(&bytes) {
            exn::bail!(GenerateErrorKind::NotPng);
        }

        self.pool.write(Path::new(&filename), &bytes).await.or_raise(|| GenerateErrorKind::Storage)?;
        tracing::info!(%filename, size = bytes.len(), "Generated artifact");
        Ok(GenerateStatus::Written { size: bytes.len() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemo_catalog::CatalogEntry;
    use mnemo_imagegen::MockGenerator;
    use mnemo_storage::StorageBackend;
    use mnemo_storage::backend::{LocalBackend, MockBackend};
    use std::ops::Deref;
    use std::sync::Arc;

    fn catalog() -> Catalog {
        Catalog::from_entries([
            CatalogEntry::new(1, "Two Sum").with_punchline("Remember what you've seen"),
            CatalogEntry::new(2, "Add Two Numbers"),
            CatalogEntry::new(70, "Climbing Stairs").with_prompt("Draw a staircase"),
        ])
        .unwrap()
    }

    fn driver(pool: &Arc<MockBackend>, generator: MockGenerator) -> Driver {
        Driver::new(pool.clone(), Arc::new(generator), PromptBuilder::new(None).unwrap())
    }

    #[tokio::test]
    async fn test_generate_one_writes_artifact() {
        let pool = Arc::new(MockBackend::default());
        let generator = Arc::new(MockGenerator::default());
        let driver = Driver::new(pool.clone(), generator.clone(), PromptBuilder::new(None).unwrap());
        assert!(driver.generate_one(&catalog(), 70, None).await);
        assert_eq!(generator.calls(), vec!["Draw a staircase"]);
        assert_eq!(pool.read(Path::new("070_climbing_stairs.png")).await.unwrap(), generator.image_for("Draw a staircase"));
    }

    #[tokio::test]
    async fn test_generate_one_with_label() {
        let pool = Arc::new(MockBackend::default());
        let driver = driver(&pool, MockGenerator::default());
        let label: VersionLabel = "v2".parse().unwrap();
        let outcome = driver.generate_file(&catalog(), 1, Some(&label)).await;
        assert_eq!(outcome.filename.as_deref(), Some("001_two_sum_v2.png"));
        assert!(matches!(outcome.status, GenerateStatus::Written { .. }));
        assert!(pool.exists(Path::new("001_two_sum_v2.png")).await.unwrap());
        assert!(!pool.exists(Path::new("001_two_sum.png")).await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_key() {
        let pool = Arc::new(MockBackend::default());
        let generator = Arc::new(MockGenerator::default());
        let driver = Driver::new(pool.clone(), generator.clone(), PromptBuilder::new(None).unwrap());
        let outcome = driver.generate_file(&catalog(), 999, None).await;
        assert!(!outcome.succeeded());
        assert_eq!(outcome.filename, None);
        assert!(matches!(&outcome.status, GenerateStatus::Failed(e) if matches!(e.deref(), GenerateErrorKind::UnknownKey(999))));
        assert!(generator.calls().is_empty());
        assert_eq!(pool.write_count(), 0);
    }

    #[tokio::test]
    async fn test_generator_failure_leaves_pool_untouched() {
        let pool = Arc::new(MockBackend::default());
        let driver = driver(&pool, MockGenerator::default().failing_on("Add Two Numbers"));
        assert!(!driver.generate_one(&catalog(), 2, None).await);
        assert!(pool.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_payload() {
        let pool = Arc::new(MockBackend::default());
        let driver = driver(&pool, MockGenerator::default().with_payload(Vec::new()));
        let outcome = driver.generate_file(&catalog(), 1, None).await;
        assert!(matches!(&outcome.status, GenerateStatus::Failed(e) if matches!(e.deref(), GenerateErrorKind::EmptyPayload)));
        assert_eq!(pool.write_count(), 0);
    }

    #[tokio::test]
    async fn test_payload_must_be_png() {
        let pool = Arc::new(MockBackend::default());
        let driver = driver(&pool, MockGenerator::default().with_payload(b"GIF89a...".to_vec()));
        let outcome = driver.generate_file(&catalog(), 1, None).await;
        assert!(matches!(&outcome.status, GenerateStatus::Failed(e) if matches!(e.deref(), GenerateErrorKind::NotPng)));
        assert_eq!(pool.write_count(), 0);
    }

    #[tokio::test]
    async fn test_pool_write_failure() {
        let pool = Arc::new(MockBackend::default());
        pool.fail_writes(true);
        let driver = driver(&pool, MockGenerator::default());
        let outcome = driver.generate_file(&catalog(), 1, None).await;
        assert!(matches!(&outcome.status, GenerateStatus::Failed(e) if e.is_retryable()));
        assert!(pool.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_overwrites_existing_artifact() {
        let pool = Arc::new(MockBackend::with_files([("070_climbing_stairs.png", "old")]));
        let generator = Arc::new(MockGenerator::default());
        let driver = Driver::new(pool.clone(), generator.clone(), PromptBuilder::new(None).unwrap());
        assert!(driver.generate_one(&catalog(), 70, None).await);
        assert_eq!(pool.read(Path::new("070_climbing_stairs.png")).await.unwrap(), generator.image_for("Draw a staircase"));
    }

    #[tokio::test]
    async fn test_dry_run_plans_without_calls() {
        let pool = Arc::new(MockBackend::default());
        let driver = Driver::dry_run(pool.clone());
        assert!(driver.is_dry_run());
        let outcome = driver.generate_file(&catalog(), 1, None).await;
        assert!(matches!(outcome.status, GenerateStatus::Planned));
        assert_eq!(outcome.filename.as_deref(), Some("001_two_sum.png"));
        assert!(!driver.generate_one(&catalog(), 999, None).await);
        assert_eq!(pool.write_count(), 0);
    }

    #[tokio::test]
    async fn test_writes_into_local_pool() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().join("memories");
        let pool: BackendHandle = Arc::new(LocalBackend::new("pool", &root).unwrap());
        let driver = Driver::new(pool, Arc::new(MockGenerator::default()), PromptBuilder::new(None).unwrap());
        driver.prepare().await.unwrap();
        assert!(driver.generate_one(&catalog(), 1, None).await);
        let names: Vec<_> = std::fs::read_dir(&root).unwrap().map(|e| e.unwrap().file_name()).collect();
        assert_eq!(names, vec!["001_two_sum.png"]);
    }
}
