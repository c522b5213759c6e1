//! Image Generation Error Types

use derive_more::{Display, Error};

/// An image generation error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for image generation.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The request never got an HTTP response.
    #[display("request failed: {_0}")]
    Request(#[error(not(source))] String),
    /// The API asked us to slow down.
    #[display("rate limited by the image API")]
    RateLimited,
    /// The API answered with an error.
    #[display("image API returned {status}: {message}")]
    Api {
        #[error(not(source))]
        status: u16,
        #[error(not(source))]
        message: String,
    },
    /// The response did not contain a usable image.
    #[display("invalid response from image API: {_0}")]
    InvalidResponse(#[error(not(source))] String),
    /// The generator refused the prompt (mock generators only).
    #[display("generation rejected: {_0}")]
    Rejected(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request(_) | Self::RateLimited => true,
            Self::Api { status, .. } => *status >= 500,
            Self::InvalidResponse(_) | Self::Rejected(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retryable() {
        assert!(ErrorKind::RateLimited.is_retryable());
        assert!(ErrorKind::Api { status: 503, message: String::new() }.is_retryable());
        assert!(!ErrorKind::Api { status: 400, message: String::new() }.is_retryable());
        assert!(!ErrorKind::InvalidResponse("no data".to_string()).is_retryable());
    }
}
