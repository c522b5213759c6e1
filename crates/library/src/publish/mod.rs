//! Publishing the latest artifacts.
//!
//! Resolves the newest version of every artifact in the pool, uploads each
//! one to the remote store under its own filename and points the matching
//! publish record at the resulting public URL.
//!
//! The primary entry point is [`publish`], which streams one
//! [`PublishEvent`] per resolved key in ascending key order.
//! [`Publisher::publish_all`] collects that stream into a
//! [`PublishSummary`].

pub mod error;
mod file;
mod stream;

pub use self::file::{DRY_RUN_SCHEME, PublishOutcome, Publisher, RecordStatus, resolve_targets};
pub use self::stream::{PublishEvent, PublishSummary, publish};
