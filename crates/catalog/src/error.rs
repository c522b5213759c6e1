//! Catalog Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A catalog error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The catalog document is not valid TOML or has the wrong shape.
    #[display("catalog document could not be parsed")]
    Parse,
    /// The catalog file could not be read.
    #[display("unable to read catalog file: {}", _0.display())]
    Read(#[error(not(source))] PathBuf),
    /// Two entries share the same key.
    #[display("duplicate catalog key {_0}")]
    DuplicateKey(#[error(not(source))] u32),
    /// An entry's filename does not parse back to its own key as a base
    /// (unversioned) artifact.
    #[display("filename `{filename}` is not a canonical artifact name for key {key}")]
    InvalidFilename {
        #[error(not(source))]
        key: u32,
        #[error(not(source))]
        filename: String,
    },
    /// A version label that is not `v<N>` with `N >= 1`.
    #[display("invalid version label `{_0}`")]
    InvalidLabel(#[error(not(source))] String),
    #[display("issue with prompt template")]
    Template,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    ///
    /// Catalog problems are always configuration problems.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
