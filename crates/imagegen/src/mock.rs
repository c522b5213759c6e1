//! Deterministic generator for tests.

use crate::error::{ErrorKind, Result};
use crate::{ImageGenerator, PNG_SIGNATURE};
use async_trait::async_trait;
use std::sync::Mutex;

/// Generator that never leaves the process.
///
/// Returns the PNG signature followed by the prompt, so identical prompts
/// always produce identical bytes. Prompts containing any of the configured
/// substrings are rejected instead.
///
/// # Examples
///
/// ```
/// use mnemo_imagegen::{ImageGenerator, MockGenerator, is_png};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let generator = MockGenerator::default().failing_on("Add Two Numbers");
/// assert!(is_png(&generator.generate("Two Sum").await.unwrap()));
/// assert!(generator.generate("PROBLEM: Add Two Numbers").await.is_err());
/// assert_eq!(generator.calls().len(), 2);
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MockGenerator {
    fail_on: Vec<String>,
    payload: Option<Vec<u8>>,
    calls: Mutex<Vec<String>>,
}

impl MockGenerator {
    /// Reject every prompt that contains `needle`.
    pub fn failing_on(mut self, needle: impl Into<String>) -> Self {
        self.fail_on.push(needle.into());
        self
    }

    /// Return `payload` verbatim instead of a PNG-signed image.
    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Every prompt received so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }

    /// The bytes returned for `prompt` when it is not rejected.
    pub fn image_for(&self, prompt: &str) -> Vec<u8> {
        match &self.payload {
            Some(payload) => payload.clone(),
            None => [&PNG_SIGNATURE[..], prompt.as_bytes()].concat(),
        }
    }
}

#[async_trait]
impl ImageGenerator for MockGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, prompt: &str) -> Result<Vec<u8>> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).push(prompt.to_string());
        if let Some(needle) = self.fail_on.iter().find(|needle| prompt.contains(needle.as_str())) {
            exn::bail!(ErrorKind::Rejected(format!("prompt mentions `{needle}`")));
        }
        Ok(self.image_for(prompt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::is_png;

    #[tokio::test]
    async fn test_deterministic_output() {
        let generator = MockGenerator::default();
        let first = generator.generate("Two Sum").await.unwrap();
        let second = generator.generate("Two Sum").await.unwrap();
        assert_eq!(first, second);
        assert!(is_png(&first));
        assert_ne!(first, generator.generate("Contains Duplicate").await.unwrap());
    }

    #[tokio::test]
    async fn test_failing_on() {
        let generator = MockGenerator::default().failing_on("Duplicate");
        let err = generator.generate("Contains Duplicate").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Rejected(_)));
        assert!(generator.generate("Two Sum").await.is_ok());
        assert_eq!(generator.calls(), vec!["Contains Duplicate".to_string(), "Two Sum".to_string()]);
    }

    #[tokio::test]
    async fn test_with_payload() {
        let generator = MockGenerator::default().with_payload(Vec::new());
        assert!(generator.generate("Two Sum").await.unwrap().is_empty());
    }
}
