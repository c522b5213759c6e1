//! Repository for publish records.
//!
//! Rows are created by seeding from the catalog; publishing only ever
//! updates them. A key that was never seeded is reported, not inserted.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::{PublishRecord, RecordRow};
use exn::ResultExt;
use sqlx::SqlitePool;
use time::OffsetDateTime;
use tracing::instrument;

/// Outcome of [`Repository::seed`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    /// Rows that did not exist before.
    pub inserted: u64,
    /// Existing rows whose title changed.
    pub renamed: u64,
    /// Existing rows left as they were.
    pub unchanged: u64,
}

/// Repository for managing publish records in the metadata store.
///
/// When `dry_run` is set, every write reports what it would have done
/// without modifying the database. Reads are unaffected.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
    dry_run: bool,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone(), dry_run: false }
    }
}
impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool, dry_run: bool) -> Self {
        Self { pool, dry_run }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    // =========================================================================
    // Insert
    // =========================================================================

    /// Make sure a row exists for every `(key, title)` pair.
    ///
    /// Existing rows keep their `image_url`; only a changed title is
    /// written. Runs in a single transaction.
    #[instrument(skip_all)]
    pub async fn seed<'a>(&self, entries: impl IntoIterator<Item = (u32, &'a str)>) -> Result<SeedSummary> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let mut summary = SeedSummary::default();
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        for (key, title) in entries {
            let existing: Option<RecordRow> = sqlx::query_as(include_str!("../queries/get_record.sql"))
                .bind(i64::from(key))
                .fetch_optional(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
            let existing = existing.map(PublishRecord::try_from).transpose()?;
            match existing {
                None => {
                    summary.inserted += 1;
                    if !self.dry_run {
                        sqlx::query(include_str!("../queries/insert_record.sql"))
                            .bind(i64::from(key))
                            .bind(title)
                            .bind(now)
                            .execute(&mut *tx)
                            .await
                            .or_raise(|| ErrorKind::Database)?;
                    }
                },
                Some(record) if record.title != title => {
                    summary.renamed += 1;
                    if !self.dry_run {
                        sqlx::query(include_str!("../queries/rename_record.sql"))
                            .bind(title)
                            .bind(now)
                            .bind(i64::from(key))
                            .execute(&mut *tx)
                            .await
                            .or_raise(|| ErrorKind::Database)?;
                    }
                },
                Some(_) => summary.unchanged += 1,
            }
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        tracing::debug!(?summary, dry_run = self.dry_run, "Seeded publish records");
        Ok(summary)
    }

    // =========================================================================
    // Update
    // =========================================================================

    /// Point the record for `key` at a newly published URL.
    ///
    /// Never inserts: returns `false` when no row matches `key`. In dry-run
    /// mode nothing is written and the result says whether a row would have
    /// been updated.
    #[instrument(skip(self, url))]
    pub async fn update_public_url(&self, key: u32, url: &str) -> Result<bool> {
        if self.dry_run {
            return Ok(self.get(key).await?.is_some());
        }
        let result = sqlx::query(include_str!("../queries/update_image_url.sql"))
            .bind(url)
            .bind(OffsetDateTime::now_utc().unix_timestamp())
            .bind(i64::from(key))
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Get/Fetch
    // =========================================================================

    pub async fn get(&self, key: u32) -> Result<Option<PublishRecord>> {
        let row: Option<RecordRow> = sqlx::query_as(include_str!("../queries/get_record.sql"))
            .bind(i64::from(key))
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(PublishRecord::try_from).transpose()
    }

    /// All records in ascending key order.
    pub async fn list(&self) -> Result<Vec<PublishRecord>> {
        let rows: Vec<RecordRow> = sqlx::query_as(include_str!("../queries/list_records.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(PublishRecord::try_from).collect()
    }
}
