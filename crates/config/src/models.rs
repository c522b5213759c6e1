//! Configuration model.

use crate::error::{ErrorKind, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_POOL: &str = "./memories";
pub const DEFAULT_DATABASE_FILE: &str = "records.sqlite";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-image-1.5";
pub const DEFAULT_SIZE: &str = "1536x1024";
pub const DEFAULT_QUALITY: &str = "high";
pub const DEFAULT_BATCH_SIZE: usize = 5;
pub const DEFAULT_REMOTE_NAME: &str = "remote";
pub const DEFAULT_REGION: &str = "us-east-1";

/// Fully merged configuration.
///
/// Paths are absolute once loaded through [`ConfigLoader`](crate::ConfigLoader).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory generated artifacts are written to and published from.
    pub pool: PathBuf,
    /// Replacement catalog file. The built-in catalog is used when unset.
    pub catalog: Option<PathBuf>,
    /// SQLite file of the metadata store.
    pub database: Option<PathBuf>,
    pub generator: GeneratorConfig,
    pub remote: RemoteConfig,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            pool: PathBuf::from(DEFAULT_POOL),
            catalog: None,
            database: None,
            generator: GeneratorConfig::default(),
            remote: RemoteConfig::default(),
        }
    }
}
impl Config {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.generator.batch_size == 0 {
            exn::bail!(ErrorKind::InvalidValue("generator.batch_size"));
        }
        if self.generator.model.trim().is_empty() {
            exn::bail!(ErrorKind::InvalidValue("generator.model"));
        }
        if self.pool.as_os_str().is_empty() {
            exn::bail!(ErrorKind::InvalidValue("pool"));
        }
        Ok(())
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub size: String,
    pub quality: String,
    /// How many missing entries `generate` picks when no keys are given.
    pub batch_size: usize,
    /// Replacement prompt template (`{{ title }}`, `{{ punchline }}`, `{{ hint }}`).
    pub prompt_template: Option<String>,
}
impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            size: DEFAULT_SIZE.to_string(),
            quality: DEFAULT_QUALITY.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            prompt_template: None,
        }
    }
}
impl GeneratorConfig {
    /// The API key, or [`MissingCredentials`](ErrorKind::MissingCredentials).
    pub fn require_api_key(&self) -> Result<&str> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => exn::bail!(ErrorKind::MissingCredentials(vec!["generator.api_key"])),
        }
    }
}
impl fmt::Debug for GeneratorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("size", &self.size)
            .field("quality", &self.quality)
            .field("batch_size", &self.batch_size)
            .field("prompt_template", &self.prompt_template.as_ref().map(|_| "<custom>"))
            .finish()
    }
}

/// Remote object store the latest artifacts are published to.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Name used in logs.
    pub name: String,
    pub bucket: Option<String>,
    /// Key prefix inside the bucket.
    pub prefix: Option<String>,
    pub region: String,
    /// Custom S3-compatible endpoint (Supabase, MinIO, ...).
    pub endpoint: Option<String>,
    pub key_id: Option<String>,
    pub key_secret: Option<String>,
    /// Base that public object URLs are built from.
    pub public_base_url: Option<String>,
}
impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_REMOTE_NAME.to_string(),
            bucket: None,
            prefix: None,
            region: DEFAULT_REGION.to_string(),
            endpoint: None,
            key_id: None,
            key_secret: None,
            public_base_url: None,
        }
    }
}

/// The parts of [`RemoteConfig`] a live publish cannot do without.
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteCredentials<'a> {
    pub bucket: &'a str,
    pub key_id: &'a str,
    pub key_secret: &'a str,
}

impl RemoteConfig {
    /// Bucket and credentials, or every missing setting at once.
    pub fn require_credentials(&self) -> Result<RemoteCredentials<'_>> {
        fn present(value: &Option<String>) -> Option<&str> {
            value.as_deref().map(str::trim).filter(|v| !v.is_empty())
        }
        match (present(&self.bucket), present(&self.key_id), present(&self.key_secret)) {
            (Some(bucket), Some(key_id), Some(key_secret)) => Ok(RemoteCredentials { bucket, key_id, key_secret }),
            (bucket, key_id, key_secret) => {
                let missing = [("remote.bucket", bucket), ("remote.key_id", key_id), ("remote.key_secret", key_secret)]
                    .into_iter()
                    .filter_map(|(name, value)| value.is_none().then_some(name))
                    .collect();
                exn::bail!(ErrorKind::MissingCredentials(missing))
            },
        }
    }
}
impl fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("name", &self.name)
            .field("bucket", &self.bucket)
            .field("prefix", &self.prefix)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("key_id", &self.key_id)
            .field("key_secret", &self.key_secret.as_ref().map(|_| "[REDACTED]"))
            .field("public_base_url", &self.public_base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.pool, PathBuf::from("./memories"));
        assert_eq!(config.generator.model, "gpt-image-1.5");
        assert_eq!(config.generator.batch_size, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_batch_size() {
        let mut config = Config::default();
        config.generator.batch_size = 0;
        let err = config.validate().unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidValue("generator.batch_size")));
    }

    #[test]
    fn test_require_api_key() {
        let mut generator = GeneratorConfig::default();
        assert!(generator.require_api_key().is_err());
        generator.api_key = Some("  ".to_string());
        assert!(generator.require_api_key().is_err());
        generator.api_key = Some("sk-test".to_string());
        assert_eq!(generator.require_api_key().unwrap(), "sk-test");
    }

    #[test]
    fn test_require_credentials_lists_everything_missing() {
        let remote = RemoteConfig { bucket: Some("mnemonic-images".to_string()), ..RemoteConfig::default() };
        let err = remote.require_credentials().err().unwrap();
        assert!(matches!(&*err, ErrorKind::MissingCredentials(m) if m == &vec!["remote.key_id", "remote.key_secret"]));
    }

    #[test]
    fn test_require_credentials() {
        let remote = RemoteConfig {
            bucket: Some("mnemonic-images".to_string()),
            key_id: Some("id".to_string()),
            key_secret: Some("secret".to_string()),
            ..RemoteConfig::default()
        };
        let credentials = remote.require_credentials().unwrap();
        assert_eq!(credentials.bucket, "mnemonic-images");
        assert_eq!(credentials.key_secret, "secret");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut config = Config::default();
        config.generator.api_key = Some("sk-very-secret".to_string());
        config.remote.key_secret = Some("s3-very-secret".to_string());
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-very-secret"));
        assert!(!rendered.contains("s3-very-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
