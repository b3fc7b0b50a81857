//! Configuration file handling.
//!
//! The configuration file is stored at `$MONEYMANAGER_HOME/config.json`. It holds the settings for
//! the completion server, the category load timeout and the notification toggle. The stored data
//! lives next to it in `data.json`.

use crate::error::{ErrorType, IntoResult, Res};
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

const APP_NAME: &str = "moneymanager";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";
const DATA_JSON: &str = "data.json";
pub const DEFAULT_COMPLETION_URL: &str = "http://localhost:11434/";
pub const DEFAULT_MODEL: &str = "qwen2.5:1.5b";
const DEFAULT_COMPLETION_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_CATEGORY_TIMEOUT_MS: u64 = 2_000;

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$MONEYMANAGER_HOME` and from there it loads `$MONEYMANAGER_HOME/config.json`.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    completion_url: Url,
}

impl Config {
    /// Creates the home directory and an initial `config.json`.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the home directory, e.g. `$HOME/moneymanager`
    /// - `completion_url` - Base URL of the completion server. Defaults to a local Ollama.
    /// - `model` - The model name sent with every completion request.
    ///
    /// # Errors
    /// - The directory already holds a `config.json`.
    /// - The URL is invalid.
    /// - Any file operation fails.
    pub async fn create(
        dir: impl Into<PathBuf>,
        completion_url: Option<&str>,
        model: Option<&str>,
    ) -> Result<Self> {
        Self::create_inner(dir.into(), completion_url, model)
            .await
            .pub_result(ErrorType::Config)
    }

    async fn create_inner(
        maybe_relative: PathBuf,
        completion_url: Option<&str>,
        model: Option<&str>,
    ) -> Res<Self> {
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the moneymanager home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;
        let config_path = root.join(CONFIG_JSON);
        if config_path.exists() {
            bail!(
                "A configuration already exists at '{}'",
                config_path.display()
            );
        }

        let config_file = ConfigFile {
            completion: CompletionSettings {
                base_url: completion_url.unwrap_or(DEFAULT_COMPLETION_URL).to_string(),
                model: model.unwrap_or(DEFAULT_MODEL).to_string(),
                ..CompletionSettings::default()
            },
            ..ConfigFile::default()
        };
        let completion_url = config_file.completion.url()?;
        config_file.save(&config_path).await?;

        Ok(Self {
            root,
            config_path,
            config_file,
            completion_url,
        })
    }

    /// This will
    /// - validate that the home directory and the config file exist
    /// - load and validate the config file
    /// - return the loaded configuration object
    pub async fn load(home: impl Into<PathBuf>) -> Result<Self> {
        Self::load_inner(home.into())
            .await
            .pub_result(ErrorType::Config)
    }

    async fn load_inner(maybe_relative: PathBuf) -> Res<Self> {
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The moneymanager home is missing, run 'moneymanager init' first")?;
        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;
        let completion_url = config_file.completion.url()?;
        Ok(Self {
            root,
            config_path,
            config_file,
            completion_url,
        })
    }

    /// Writes the current settings back to `config.json`.
    pub async fn save(&self) -> Result<()> {
        self.config_file
            .save(&self.config_path)
            .await
            .pub_result(ErrorType::Config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Where the transactions, categories and budgets are stored.
    pub fn data_path(&self) -> PathBuf {
        self.root.join(DATA_JSON)
    }

    pub fn completion_url(&self) -> &Url {
        &self.completion_url
    }

    pub fn model(&self) -> &str {
        &self.config_file.completion.model
    }

    pub fn completion_timeout(&self) -> Duration {
        Duration::from_millis(self.config_file.completion.timeout_ms)
    }

    pub fn category_timeout(&self) -> Duration {
        Duration::from_millis(self.config_file.category_timeout_ms)
    }

    pub fn notifications_enabled(&self) -> bool {
        self.config_file.notifications_enabled
    }

    /// Changes the toggle in memory. Call `save` to persist it.
    pub fn set_notifications_enabled(&mut self, enabled: bool) {
        self.config_file.notifications_enabled = enabled;
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "moneymanager",
///   "config_version": 1,
///   "completion": {
///     "base_url": "http://localhost:11434/",
///     "model": "qwen2.5:1.5b",
///     "timeout_ms": 30000
///   },
///   "category_timeout_ms": 2000,
///   "notifications_enabled": true
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "moneymanager"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    #[serde(default)]
    completion: CompletionSettings,

    /// How long to wait for the category list before continuing without it
    #[serde(default = "default_category_timeout_ms")]
    category_timeout_ms: u64,

    /// Global toggle for budget alerts
    #[serde(default = "default_true")]
    notifications_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct CompletionSettings {
    #[serde(default = "default_completion_url")]
    base_url: String,
    #[serde(default = "default_model")]
    model: String,
    #[serde(default = "default_completion_timeout_ms")]
    timeout_ms: u64,
}

impl CompletionSettings {
    /// Parses `base_url`. A missing trailing slash is added so that joining `api/generate` keeps
    /// any path prefix.
    fn url(&self) -> Res<Url> {
        let mut s = self.base_url.trim().to_string();
        if !s.ends_with('/') {
            s.push('/');
        }
        let url = Url::parse(&s)
            .with_context(|| format!("Invalid completion base_url '{}'", self.base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!(
                "The completion base_url must be http or https, got '{}'",
                self.base_url
            );
        }
        Ok(url)
    }
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            base_url: default_completion_url(),
            model: default_model(),
            timeout_ms: default_completion_timeout_ms(),
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            completion: CompletionSettings::default(),
            category_timeout_ms: default_category_timeout_ms(),
            notifications_enabled: true,
        }
    }
}

fn default_completion_url() -> String {
    DEFAULT_COMPLETION_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_completion_timeout_ms() -> u64 {
    DEFAULT_COMPLETION_TIMEOUT_MS
}

fn default_category_timeout_ms() -> u64 {
    DEFAULT_CATEGORY_TIMEOUT_MS
}

fn default_true() -> bool {
    true
}

impl ConfigFile {
    /// Loads a ConfigFile from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if `app_name` is wrong
    async fn load(path: &Path) -> Res<Self> {
        let config: ConfigFile = utils::deserialize(path).await?;

        // Validate app_name
        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    async fn save(&self, path: &Path) -> Res<()> {
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(path, data)
            .await
            .context("Unable to write config file")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_config_create_and_load() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("moneymanager");
        let created = Config::create(&home, Some("http://10.0.2.2:11434"), None)
            .await
            .unwrap();
        assert_eq!(created.completion_url().as_str(), "http://10.0.2.2:11434/");
        assert_eq!(created.model(), DEFAULT_MODEL);
        assert!(created.config_path().is_file());

        let loaded = Config::load(&home).await.unwrap();
        assert_eq!(loaded.completion_timeout(), Duration::from_secs(30));
        assert_eq!(loaded.category_timeout(), Duration::from_secs(2));
        assert!(loaded.notifications_enabled());
        assert_eq!(loaded.data_path(), loaded.root().join("data.json"));
    }

    #[tokio::test]
    async fn test_create_twice_fails() {
        let dir = TempDir::new().unwrap();
        Config::create(dir.path(), None, None).await.unwrap();
        let err = Config::create(dir.path(), None, None).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Config);
        assert!(err.to_string().contains("already exists"));
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let dir = TempDir::new().unwrap();
        assert!(Config::create(dir.path(), Some("not a url"), None)
            .await
            .is_err());
        let dir = TempDir::new().unwrap();
        assert!(Config::create(dir.path(), Some("ftp://example.com"), None)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_notification_toggle_persists() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::create(dir.path(), None, None).await.unwrap();
        config.set_notifications_enabled(false);
        config.save().await.unwrap();
        assert!(!Config::load(dir.path())
            .await
            .unwrap()
            .notifications_enabled());
    }

    #[tokio::test]
    async fn test_load_minimal_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_JSON);
        utils::write(&path, r#"{"app_name": "moneymanager", "config_version": 1}"#)
            .await
            .unwrap();
        let config = Config::load(dir.path()).await.unwrap();
        assert_eq!(config.completion_url().as_str(), DEFAULT_COMPLETION_URL);
        assert_eq!(config.model(), DEFAULT_MODEL);
        assert!(config.notifications_enabled());
    }

    #[tokio::test]
    async fn test_load_invalid_app_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_JSON);
        utils::write(&path, r#"{"app_name": "budgetapp", "config_version": 1}"#)
            .await
            .unwrap();
        let err = Config::load(dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("Invalid app_name"));
    }

    #[tokio::test]
    async fn test_load_missing_home() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(dir.path().join("nope")).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Config);
    }
}
