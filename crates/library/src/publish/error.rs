//! Error types for the [`publish`](super) module.
//!
//! Uses [`exn`] for automatic location tracking and error tree construction.

use derive_more::{Display, Error};

/// A publish error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for publish operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a publish failure.
///
/// ### Operational Errors
/// - [`ErrorKind::NotFound`]
///
/// ### Dependency Errors
/// - [`ErrorKind::Pool`]
/// - [`ErrorKind::Remote`]
/// - [`ErrorKind::Records`]
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The requested key has no artifact in the pool.
    #[display("no artifact for key {_0} in the pool")]
    NotFound(#[error(not(source))] u32),
    /// Reading the artifact from the pool failed.
    #[display("artifact pool operation failed")]
    Pool,
    /// A remote store operation (delete, upload, URL) failed.
    #[display("remote store operation failed")]
    Remote,
    /// Updating the publish record via [`mnemo_records::Repository`] failed.
    #[display("record update failed")]
    Records,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Remote | Self::Records)
    }
}
