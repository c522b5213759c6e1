//! Configuration Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Every configuration error is fatal: nothing runs until it is fixed.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A source could not be merged or the result has the wrong shape.
    #[display("invalid configuration")]
    Invalid,
    /// An explicitly requested configuration file does not exist.
    #[display("configuration file not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// An explicitly requested configuration file has an unknown extension.
    #[display("unsupported configuration format: {}", _0.display())]
    UnsupportedFormat(#[error(not(source))] PathBuf),
    /// A value is present but unusable.
    #[display("invalid value for `{_0}`")]
    InvalidValue(#[error(not(source))] &'static str),
    /// A live command needs credentials that are not configured.
    #[display("missing credentials: {}", _0.join(", "))]
    MissingCredentials(#[error(not(source))] Vec<&'static str>),
    /// Neither the working directory nor the platform directories are known.
    #[display("unable to determine working directory")]
    WorkingDirectory,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
