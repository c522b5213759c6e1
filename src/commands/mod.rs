//! Subcommand implementations.
//!
//! Every command starts from a [`Context`]: the loaded configuration and
//! catalog. Store clients are only built by the commands that need them, so
//! that `catalog` or a dry run never asks for credentials.

pub mod catalog;
pub mod generate;
pub mod publish;
pub mod records;
pub mod status;

pub use self::generate::GenerateArgs;
pub use self::publish::PublishArgs;
pub use self::records::RecordsCommand;
use mnemo_catalog::{Catalog, PromptBuilder};
use mnemo_config::{Config, ConfigLoader};
use mnemo_imagegen::{GeneratorHandle, OpenAiConfig, OpenAiGenerator};
use mnemo_library::list_pool;
use mnemo_records::Database;
use mnemo_storage::BackendHandle;
use mnemo_storage::backend::{LocalBackend, S3Backend};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Turn any error into a fatal report. The `exn` debug output carries the
/// whole error tree with locations.
pub(crate) fn fatal<E: fmt::Debug>(err: E) -> miette::Report {
    miette::miette!("{err:?}")
}

/// Closing line of every run.
pub(crate) fn summary(succeeded: usize, attempted: usize) -> String {
    format!("{succeeded}/{attempted} succeeded")
}

pub struct Context {
    pub config: Config,
    pub catalog: Catalog,
}

impl Context {
    pub fn load(config_file: Option<PathBuf>) -> miette::Result<Self> {
        let config = ConfigLoader::new().and_then(|loader| loader.with_file(config_file).load()).map_err(fatal)?;
        let catalog = match &config.catalog {
            Some(path) => Catalog::from_path(path),
            None => Catalog::builtin(),
        }
        .map_err(fatal)?;
        tracing::debug!(entries = catalog.len(), pool = %config.pool.display(), "Loaded catalog");
        Ok(Self { config, catalog })
    }

    pub fn pool(&self) -> miette::Result<BackendHandle> {
        let pool = LocalBackend::new("pool", &self.config.pool).map_err(fatal)?;
        Ok(Arc::new(pool))
    }

    /// Sorted filenames in the pool.
    pub async fn listing(&self, pool: &BackendHandle) -> miette::Result<Vec<String>> {
        list_pool(pool).await.map_err(fatal)
    }

    pub fn remote(&self) -> miette::Result<BackendHandle> {
        let remote = &self.config.remote;
        let credentials = remote.require_credentials().map_err(fatal)?;
        let mut backend = S3Backend::new(
            &remote.name,
            credentials.bucket,
            remote.prefix.clone(),
            &remote.region,
            remote.endpoint.as_deref(),
            credentials.key_id,
            credentials.key_secret,
        )
        .map_err(fatal)?;
        if let Some(url) = &remote.public_base_url {
            backend = backend.with_public_base_url(url);
        }
        Ok(Arc::new(backend))
    }

    pub fn generator(&self) -> miette::Result<GeneratorHandle> {
        let settings = &self.config.generator;
        let api_key = settings.require_api_key().map_err(fatal)?;
        let config = OpenAiConfig {
            api_key: api_key.to_string(),
            base_url: settings.base_url.clone(),
            model: settings.model.clone(),
            size: settings.size.clone(),
            quality: settings.quality.clone(),
        };
        Ok(Arc::new(OpenAiGenerator::new(config)))
    }

    pub fn prompts(&self) -> miette::Result<PromptBuilder> {
        PromptBuilder::new(self.config.generator.prompt_template.as_deref()).map_err(fatal)
    }

    pub async fn database(&self) -> miette::Result<Database> {
        let path = self.config.database.as_ref().ok_or_else(|| miette::miette!("no database path configured"))?;
        Database::connect(path).await.map_err(fatal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary() {
        assert_eq!(summary(2, 3), "2/3 succeeded");
        assert_eq!(summary(0, 0), "0/0 succeeded");
    }
}
