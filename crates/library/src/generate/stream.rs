use crate::error::{ErrorKind as LibraryErrorKind, Result as LibraryResult};
use crate::generate::error::Result as GenerateResult;
use crate::generate::file::{Driver, GenerateOutcome};
use async_stream::stream;
use exn::ResultExt;
use futures::{Stream, StreamExt};
use mnemo_catalog::{Catalog, VersionLabel};
use std::collections::HashSet;

/// Progress events emitted by [`generate`] as it works through a list of
/// keys.
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started): exactly once.
/// 2. [`Selected`](Self::Selected): exactly once, with the number of distinct
///    keys that will be attempted.
/// 3. [`Generated`](Self::Generated): zero or more times, one per key, in the
///    order the keys were given.
/// 4. [`Complete`](Self::Complete): exactly once, signalling the stream is
///    finished.
///
/// Only a failure to prepare the pool terminates the stream early, in which
/// case [`Complete`](Self::Complete) is never emitted. Per-key failures are
/// reported inside [`Generated`](Self::Generated).
#[derive(Debug)]
pub enum GenerateEvent {
    /// Generation has begun; emitted exactly once before any other event.
    Started,
    /// Keys have been de-duplicated; the total count is now known.
    Selected(usize),
    /// A key has been attempted.
    Generated(GenerateOutcome),
    /// Every key has been attempted; the stream is finished.
    Complete,
}

/// Streams [`GenerateEvent`]s while generating each of `keys` in turn.
///
/// Keys are processed sequentially in the given order. Duplicates are
/// dropped, keeping the first occurrence. A live driver initializes the pool
/// once before the first key; a dry run never touches it.
pub fn generate<'a>(
    driver: &'a Driver,
    catalog: &'a Catalog,
    keys: &'a [u32],
    label: Option<&'a VersionLabel>,
) -> impl Stream<Item = LibraryResult<GenerateEvent>> + 'a {
    stream! {
        for await event in generate_inner(driver, catalog, keys, label) {
            yield event.or_raise(|| LibraryErrorKind::Generate);
        }
    }
}

fn generate_inner<'a>(
    driver: &'a Driver,
    catalog: &'a Catalog,
    keys: &'a [u32],
    label: Option<&'a VersionLabel>,
) -> impl Stream<Item = GenerateResult<GenerateEvent>> + 'a {
    stream!({
        yield Ok(GenerateEvent::Started);

        let mut seen = HashSet::new();
        let keys: Vec<u32> = keys.iter().copied().filter(|key| seen.insert(*key)).collect();
        yield Ok(GenerateEvent::Selected(keys.len()));

        if let Err(e) = driver.prepare().await {
            yield Err(e);
            return;
        }

        for key in keys {
            yield Ok(GenerateEvent::Generated(driver.generate_file(catalog, key, label).await));
        }

        yield Ok(GenerateEvent::Complete);
    })
}

/// Per-key results of a batch, in the order the keys were attempted.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<GenerateOutcome>,
}
impl BatchReport {
    /// Whether `key` succeeded, or `None` if it was not part of the batch.
    pub fn get(&self, key: u32) -> Option<bool> {
        self.outcomes.iter().find(|outcome| outcome.key == key).map(GenerateOutcome::succeeded)
    }

    /// `(key, succeeded)` pairs in attempt order.
    pub fn results(&self) -> Vec<(u32, bool)> {
        self.outcomes.iter().map(|outcome| (outcome.key, outcome.succeeded())).collect()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.succeeded()).count()
    }

    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }
}

impl Driver {
    /// Generate every key in `keys` and collect the outcomes.
    ///
    /// One key failing never stops the batch. The only error is failing to
    /// prepare the pool, before any key is attempted.
    pub async fn generate_batch(
        &self,
        catalog: &Catalog,
        keys: &[u32],
        label: Option<&VersionLabel>,
    ) -> LibraryResult<BatchReport> {
        let mut report = BatchReport::default();
        let mut events = std::pin::pin!(generate(self, catalog, keys, label));
        while let Some(event) = events.next().await {
            if let GenerateEvent::Generated(outcome) = event? {
                report.outcomes.push(outcome);
            }
        }
        tracing::info!(succeeded = report.succeeded(), attempted = report.attempted(), "Generation finished");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::GenerateStatus;
    use futures::TryStreamExt;
    use mnemo_catalog::{CatalogEntry, PromptBuilder};
    use mnemo_imagegen::MockGenerator;
    use mnemo_storage::backend::{LocalBackend, MockBackend};
    use mnemo_storage::{BackendHandle, StorageBackend};
    use std::path::Path;
    use std::sync::Arc;

    fn catalog() -> Catalog {
        Catalog::from_entries([
            CatalogEntry::new(1, "Two Sum"),
            CatalogEntry::new(2, "Add Two Numbers"),
            CatalogEntry::new(3, "Longest Substring Without Repeating Characters"),
        ])
        .unwrap()
    }

    fn live(pool: &Arc<MockBackend>) -> Driver {
        let generator = MockGenerator::default().failing_on("Add Two Numbers");
        Driver::new(pool.clone(), Arc::new(generator), PromptBuilder::new(None).unwrap())
    }

    #[tokio::test]
    async fn test_failure_does_not_abort_batch() {
        let pool = Arc::new(MockBackend::default());
        let report = live(&pool).generate_batch(&catalog(), &[1, 2, 3], None).await.unwrap();
        assert_eq!(report.results(), vec![(1, true), (2, false), (3, true)]);
        assert_eq!((report.succeeded(), report.attempted()), (2, 3));

        let files: Vec<_> = pool.snapshot().await.into_iter().map(|(path, _)| path).collect();
        assert_eq!(
            files,
            vec![Path::new("001_two_sum.png"), Path::new("003_longest_substring_without_repeating_characters.png")]
        );
    }

    #[tokio::test]
    async fn test_keys_are_deduplicated_in_given_order() {
        let pool = Arc::new(MockBackend::default());
        let report = live(&pool).generate_batch(&catalog(), &[3, 1, 3, 999, 1], None).await.unwrap();
        assert_eq!(report.results(), vec![(3, true), (1, true), (999, false)]);
        assert_eq!(report.get(999), Some(false));
        assert_eq!(report.get(2), None);
    }

    #[tokio::test]
    async fn test_event_order() {
        let pool = Arc::new(MockBackend::default());
        let driver = live(&pool);
        let catalog = catalog();
        let events: Vec<_> = generate(&driver, &catalog, &[1, 2], None).try_collect().await.unwrap();
        assert_eq!(events.len(), 5);
        assert!(matches!(events[0], GenerateEvent::Started));
        assert!(matches!(events[1], GenerateEvent::Selected(2)));
        assert!(matches!(&events[2], GenerateEvent::Generated(o) if o.key == 1 && o.succeeded()));
        assert!(matches!(&events[3], GenerateEvent::Generated(o) if o.key == 2 && !o.succeeded()));
        assert!(matches!(events[4], GenerateEvent::Complete));
    }

    #[tokio::test]
    async fn test_dry_run_matches_live_shape() {
        let pool = Arc::new(MockBackend::default());
        let label: VersionLabel = "v2".parse().unwrap();
        let report = Driver::dry_run(pool.clone()).generate_batch(&catalog(), &[1, 2, 3], Some(&label)).await.unwrap();
        assert_eq!(report.results(), vec![(1, true), (2, true), (3, true)]);
        assert!(report.outcomes.iter().all(|o| matches!(o.status, GenerateStatus::Planned)));
        assert_eq!(report.outcomes[0].filename.as_deref(), Some("001_two_sum_v2.png"));
        assert_eq!(pool.write_count(), 0);
    }

    #[tokio::test]
    async fn test_pool_created_once_for_live_runs() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().join("memories");
        let pool: BackendHandle = Arc::new(LocalBackend::new("pool", &root).unwrap());

        let dry = Driver::dry_run(pool.clone());
        dry.generate_batch(&catalog(), &[1], None).await.unwrap();
        assert!(!root.exists());

        let driver = Driver::new(pool.clone(), Arc::new(MockGenerator::default()), PromptBuilder::new(None).unwrap());
        let report = driver.generate_batch(&catalog(), &[1], None).await.unwrap();
        assert_eq!(report.results(), vec![(1, true)]);
        assert!(pool.exists(Path::new("001_two_sum.png")).await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let pool = Arc::new(MockBackend::default());
        let report = live(&pool).generate_batch(&catalog(), &[], None).await.unwrap();
        assert_eq!(report.attempted(), 0);
    }
}
