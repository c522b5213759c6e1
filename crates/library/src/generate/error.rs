//! Error types for the [`generate`](super) module.
//!
//! Uses [`exn`] for automatic location tracking and error tree construction.

use derive_more::{Display, Error};

/// A generate error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for generate operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a generation failure.
///
/// ### Operational Errors
/// - [`ErrorKind::UnknownKey`]
/// - [`ErrorKind::EmptyPayload`]
/// - [`ErrorKind::NotPng`]
///
/// ### Dependency Errors
/// - [`ErrorKind::Prompt`]
/// - [`ErrorKind::Generator`]
/// - [`ErrorKind::Storage`]
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The key has no catalog entry.
    #[display("no catalog entry for key {_0}")]
    UnknownKey(#[error(not(source))] u32),
    /// The [`PromptBuilder`](mnemo_catalog::PromptBuilder) could not render
    /// the entry's prompt.
    #[display("could not compose the prompt")]
    Prompt,
    /// The image generator refused or failed the request.
    #[display("image generator failed")]
    Generator,
    /// The generator succeeded but returned no bytes.
    #[display("generator returned an empty payload")]
    EmptyPayload,
    /// The generator returned something that is not a PNG image.
    #[display("generator returned a payload that is not a PNG image")]
    NotPng,
    /// A pool operation (initialize, write) failed.
    #[display("artifact pool operation failed")]
    Storage,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Generator | Self::Storage)
    }
}
