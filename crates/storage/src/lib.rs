//! Storage backends for the artifact pool and the remote object store.
//!
//! Both sides of the pipeline speak the same [`StorageBackend`] trait: the
//! local pool directory that generated images land in, and the public bucket
//! that the latest image per catalog entry is published to.

pub mod backend;
pub mod error;
mod models;
mod path;

pub use crate::backend::StorageBackend;
pub use crate::models::{FileInfo, content_type_for};
pub use crate::path::validate as validate_path;
use std::sync::Arc;

pub type BackendHandle = Arc<dyn StorageBackend + Send + Sync>;
