//! Layered configuration loading.
//!
//! Sources, lowest to highest precedence:
//!
//! 1. Built-in defaults.
//! 2. `mnemo.toml`, `mnemo.yaml` or `mnemo.json` in the platform config
//!    directory.
//! 3. `mnemo.toml` in the working directory.
//! 4. An explicit file (format picked by extension).
//! 5. `MNEMO_*` environment variables, `__` separating nested keys
//!    (`MNEMO_REMOTE__BUCKET`), plus `OPENAI_API_KEY` for
//!    `generator.api_key`.

use crate::error::{ErrorKind, Result};
use crate::models::{Config, DEFAULT_DATABASE_FILE};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use std::path::{Path, PathBuf};
use tracing::instrument;

const FILE_STEM: &str = "mnemo";
const ENV_PREFIX: &str = "MNEMO_";
const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Load `.env.local` then `.env` into the process environment.
///
/// Variables that are already set are never overwritten, so `.env.local`
/// wins over `.env` and the real environment wins over both. Runs before
/// logging is configured, so files that exist but cannot be loaded are
/// returned for the caller to report.
pub fn load_dotenv() -> Vec<(&'static str, dotenvy::Error)> {
    let mut failures = Vec::new();
    for file in [".env.local", ".env"] {
        match dotenvy::from_filename(file) {
            Ok(_) => {},
            Err(err) if err.not_found() => {},
            Err(err) => failures.push((file, err)),
        }
    }
    failures
}

/// Builds a [`Config`] from every configuration source.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config_dir: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    working_dir: PathBuf,
    explicit: Option<PathBuf>,
    env_prefix: String,
}

impl ConfigLoader {
    /// Loader using the platform directories and the process working
    /// directory.
    pub fn new() -> Result<Self> {
        let working_dir = std::env::current_dir().or_raise(|| ErrorKind::WorkingDirectory)?;
        let dirs = ProjectDirs::from("", "", FILE_STEM);
        Ok(Self {
            config_dir: dirs.as_ref().map(|d| d.config_dir().to_path_buf()),
            data_dir: dirs.as_ref().map(|d| d.data_dir().to_path_buf()),
            working_dir,
            explicit: None,
            env_prefix: ENV_PREFIX.to_string(),
        })
    }

    /// Loader rooted somewhere other than the process environment.
    ///
    /// No platform directories are consulted; the data directory defaults to
    /// the working directory.
    pub fn rooted(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: None,
            data_dir: None,
            working_dir: working_dir.into(),
            explicit: None,
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    pub fn with_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = Some(dir.into());
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Add an explicit configuration file on top of the discovered ones.
    pub fn with_file(mut self, path: Option<impl Into<PathBuf>>) -> Self {
        self.explicit = path.map(Into::into);
        self
    }

    /// Prefix of the environment variables that are merged last.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Every source merged, in precedence order, without extracting.
    pub fn figment(&self) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(dir) = &self.config_dir {
            figment = figment
                .merge(Toml::file(dir.join(format!("{FILE_STEM}.toml"))))
                .merge(Yaml::file(dir.join(format!("{FILE_STEM}.yaml"))))
                .merge(Json::file(dir.join(format!("{FILE_STEM}.json"))));
        }
        figment = figment.merge(Toml::file(self.working_dir.join(format!("{FILE_STEM}.toml"))));
        if let Some(path) = &self.explicit {
            let path = self.absolute(path);
            if !path.is_file() {
                exn::bail!(ErrorKind::NotFound(path));
            }
            let extension = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
            figment = match extension.as_deref() {
                Some("toml") => figment.merge(Toml::file(&path)),
                Some("yaml" | "yml") => figment.merge(Yaml::file(&path)),
                Some("json") => figment.merge(Json::file(&path)),
                _ => exn::bail!(ErrorKind::UnsupportedFormat(path)),
            };
        }
        Ok(figment
            .merge(Env::prefixed(&self.env_prefix).split("__"))
            .merge(Env::raw().only(&[API_KEY_VAR]).map(|_| "generator.api_key".into())))
    }

    /// Merge, extract and validate. Relative paths are resolved against the
    /// working directory.
    #[instrument(skip_all)]
    pub fn load(&self) -> Result<Config> {
        let mut config: Config = self.figment()?.extract().or_raise(|| ErrorKind::Invalid)?;
        config.validate()?;
        config.pool = self.absolute(&config.pool);
        config.catalog = config.catalog.map(|p| self.absolute(&p));
        config.database = Some(match config.database {
            Some(path) => self.absolute(&path),
            None => self.data_dir.as_deref().unwrap_or(&self.working_dir).join(DEFAULT_DATABASE_FILE),
        });
        tracing::debug!(?config, "Loaded configuration");
        Ok(config)
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() { path.to_path_buf() } else { self.working_dir.join(path) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;

    /// A loader that cannot see the developer's real configuration.
    fn isolated(dir: &Path) -> ConfigLoader {
        ConfigLoader::rooted(dir).with_env_prefix("MNEMO_TEST_UNSET_")
    }

    #[test]
    fn test_defaults_resolve_against_working_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = isolated(temp_dir.path()).load().unwrap();
        assert_eq!(config.pool, temp_dir.path().join("./memories"));
        assert_eq!(config.database, Some(temp_dir.path().join("records.sqlite")));
        assert_eq!(config.catalog, None);
        assert_eq!(config.generator.size, "1536x1024");
    }

    #[test]
    fn test_data_dir_hosts_default_database() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = isolated(temp_dir.path()).with_data_dir("/var/lib/mnemo").load().unwrap();
        assert_eq!(config.database, Some(PathBuf::from("/var/lib/mnemo/records.sqlite")));
    }

    #[test]
    fn test_working_dir_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("mnemo.toml"), "pool = \"images\"\n[generator]\nbatch_size = 10\n").unwrap();
        let config = isolated(temp_dir.path()).load().unwrap();
        assert_eq!(config.pool, temp_dir.path().join("images"));
        assert_eq!(config.generator.batch_size, 10);
        // Untouched nested values keep their defaults.
        assert_eq!(config.generator.quality, "high");
    }

    #[test]
    fn test_precedence_of_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_dir = temp_dir.path().join("config");
        fs::create_dir(&config_dir).unwrap();
        fs::write(config_dir.join("mnemo.yaml"), "generator:\n  model: from-platform\n  size: 1024x1024\n").unwrap();
        fs::write(temp_dir.path().join("mnemo.toml"), "[generator]\nmodel = \"from-working-dir\"\n").unwrap();
        fs::write(temp_dir.path().join("explicit.json"), r#"{"remote": {"bucket": "from-explicit"}}"#).unwrap();
        let config = isolated(temp_dir.path())
            .with_config_dir(&config_dir)
            .with_file(Some("explicit.json"))
            .load()
            .unwrap();
        assert_eq!(config.generator.model, "from-working-dir");
        assert_eq!(config.generator.size, "1024x1024");
        assert_eq!(config.remote.bucket.as_deref(), Some("from-explicit"));
    }

    #[rstest]
    #[case("custom.toml", "[remote]\nbucket = \"images\"\n")]
    #[case("custom.yaml", "remote:\n  bucket: images\n")]
    #[case("custom.YML", "remote:\n  bucket: images\n")]
    #[case("custom.json", r#"{"remote": {"bucket": "images"}}"#)]
    fn test_explicit_file_formats(#[case] name: &str, #[case] contents: &str) {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join(name), contents).unwrap();
        let config = isolated(temp_dir.path()).with_file(Some(name)).load().unwrap();
        assert_eq!(config.remote.bucket.as_deref(), Some("images"));
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = isolated(temp_dir.path()).with_file(Some("missing.toml")).load().unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[test]
    fn test_explicit_file_format() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("mnemo.ini"), "pool = x").unwrap();
        let err = isolated(temp_dir.path()).with_file(Some("mnemo.ini")).load().unwrap_err();
        assert!(matches!(&*err, ErrorKind::UnsupportedFormat(_)));
    }

    #[test]
    fn test_invalid_values_are_fatal() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("mnemo.toml"), "[generator]\nbatch_size = 0\n").unwrap();
        let err = isolated(temp_dir.path()).load().unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidValue("generator.batch_size")));

        fs::write(temp_dir.path().join("mnemo.toml"), "[generator]\nbatch_size = \"five\"\n").unwrap();
        let err = isolated(temp_dir.path()).load().unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid));
    }

    #[test]
    fn test_environment_overrides_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("mnemo.toml"), "[remote]\nbucket = \"from-file\"\n").unwrap();
        // SAFETY: the variable name is unique to this test, nothing else
        // reads or writes it.
        unsafe { std::env::set_var("MNEMO_TEST_ENV_OVERRIDE_REMOTE__BUCKET", "from-env") };
        let config =
            ConfigLoader::rooted(temp_dir.path()).with_env_prefix("MNEMO_TEST_ENV_OVERRIDE_").load().unwrap();
        assert_eq!(config.remote.bucket.as_deref(), Some("from-env"));
    }
}
