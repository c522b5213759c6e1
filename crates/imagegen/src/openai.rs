//! OpenAI Images API client.
//!
//! Calls `POST {base_url}/v1/images/generations` and decodes the base64
//! image in the first element of `data`.

use crate::ImageGenerator;
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use exn::ResultExt;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-image-1.5";
pub const DEFAULT_SIZE: &str = "1536x1024";
pub const DEFAULT_QUALITY: &str = "high";

/// Connection and request settings for [`OpenAiGenerator`].
#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub size: String,
    pub quality: String,
}
impl OpenAiConfig {
    /// Settings with every default applied.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            size: DEFAULT_SIZE.to_string(),
            quality: DEFAULT_QUALITY.to_string(),
        }
    }
}
impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("size", &self.size)
            .field("quality", &self.quality)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,
    quality: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    data: Vec<GeneratedImage>,
}

#[derive(Debug, Deserialize)]
struct GeneratedImage {
    b64_json: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Image generator backed by the OpenAI Images API.
#[derive(Debug)]
pub struct OpenAiGenerator {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiGenerator {
    pub fn new(config: OpenAiConfig) -> Self {
        Self { client: Client::new(), config }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/images/generations", self.config.base_url.trim_end_matches('/'))
    }

    fn request<'a>(&'a self, prompt: &'a str) -> GenerationRequest<'a> {
        GenerationRequest {
            model: &self.config.model,
            prompt,
            n: 1,
            size: &self.config.size,
            quality: &self.config.quality,
        }
    }

    /// Turn an error response body into a message, preferring the API's own.
    fn error_message(body: &str) -> String {
        match serde_json::from_str::<ErrorResponse>(body) {
            Ok(response) => response.error.message,
            Err(_) => body.trim().to_string(),
        }
    }

    /// Extract and decode the first image of a successful response.
    fn decode(response: GenerationResponse) -> Result<Vec<u8>> {
        let Some(encoded) = response.data.into_iter().next().and_then(|image| image.b64_json) else {
            exn::bail!(ErrorKind::InvalidResponse("response contained no image data".to_string()));
        };
        STANDARD
            .decode(encoded.trim())
            .or_raise(|| ErrorKind::InvalidResponse("image data is not valid base64".to_string()))
    }
}

#[async_trait]
impl ImageGenerator for OpenAiGenerator {
    fn name(&self) -> &str {
        "openai"
    }

    #[tracing::instrument(skip_all, fields(model = %self.config.model, size = %self.config.size))]
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>> {
        tracing::debug!(prompt_len = prompt.len(), "Sending image generation request");
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&self.request(prompt))
            .send()
            .await
            .map_err(|e| ErrorKind::Request(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            exn::bail!(ErrorKind::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "failed to read error body".to_string());
            exn::bail!(ErrorKind::Api { status: status.as_u16(), message: Self::error_message(&body) });
        }

        let body: GenerationResponse = response
            .json()
            .await
            .or_raise(|| ErrorKind::InvalidResponse("response body is not the expected JSON".to_string()))?;
        let bytes = Self::decode(body)?;
        tracing::debug!(size = bytes.len(), "Received image");
        Ok(bytes)
    }
}
