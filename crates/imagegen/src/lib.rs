//! External image generation capability.
//!
//! [`ImageGenerator`] turns a prompt into encoded image bytes. The real
//! implementation talks to the OpenAI Images API (feature `openai`); the
//! mock (feature `mock`) produces deterministic PNG-signed payloads for
//! tests.

pub mod error;
#[cfg(feature = "mock")]
mod mock;
#[cfg(feature = "openai")]
mod openai;

use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

#[cfg(feature = "mock")]
pub use crate::mock::MockGenerator;
#[cfg(feature = "openai")]
pub use crate::openai::{OpenAiConfig, OpenAiGenerator};

/// The eight bytes every PNG file starts with.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Whether `bytes` starts with the PNG signature.
pub fn is_png(bytes: &[u8]) -> bool {
    bytes.starts_with(&PNG_SIGNATURE)
}

/// Something that can draw a picture from a prompt.
///
/// One call is one attempt: implementations never retry.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Name of the generator. Used for logging only.
    fn name(&self) -> &str;

    /// Generate one image and return its encoded bytes.
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>>;
}

pub type GeneratorHandle = Arc<dyn ImageGenerator + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_png() {
        assert!(is_png(&PNG_SIGNATURE));
        assert!(is_png(&[&PNG_SIGNATURE[..], b"IHDR"].concat()));
        assert!(!is_png(b""));
        assert!(!is_png(b"GIF89a"));
        assert!(!is_png(&PNG_SIGNATURE[..7]));
    }
}
