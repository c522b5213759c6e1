//! SQLite metadata store for published artifacts.
//!
//! Holds one row per catalog entry with the public URL of its latest
//! published image. The store is downstream of the artifact pool: if it is
//! lost it can be seeded from the catalog again and repopulated by
//! re-running the publisher.

mod db;
pub mod error;
mod models;
mod repo;

pub use crate::db::Database;
pub use crate::models::PublishRecord;
pub use crate::repo::{Repository, SeedSummary};
