//! Configuration management for shellcache

pub mod schema;

pub use schema::Config;

use crate::error::{ShellCacheError, ShellCacheResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shellcache")
            .join("config.toml")
    }

    /// Get the default state directory path
    pub fn state_dir() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shellcache")
    }

    /// Load configuration, falling back to defaults if the file is missing
    pub async fn load(&self) -> ShellCacheResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> ShellCacheResult<Config> {
        let content = fs::read_to_string(path).await.map_err(|e| {
            ShellCacheError::io(format!("reading config from {}", path.display()), e)
        })?;

        toml::from_str(&content).map_err(|e| ShellCacheError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> ShellCacheResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            ShellCacheError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    async fn ensure_config_dir(&self) -> ShellCacheResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ShellCacheError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Files and directories kept under the state directory
#[derive(Debug, Clone)]
pub struct StateLayout {
    root: PathBuf,
}

impl StateLayout {
    /// Layout rooted at `root`
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// State directory root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding cache partitions, unless the config overrides it
    pub fn caches_dir(&self, config: &Config) -> PathBuf {
        config
            .storage
            .path
            .clone()
            .unwrap_or_else(|| self.root.join("caches"))
    }

    /// Persisted worker registration
    pub fn registration_path(&self) -> PathBuf {
        self.root.join("registration.json")
    }

    /// Lifecycle journal (JSON lines)
    pub fn journal_path(&self) -> PathBuf {
        self.root.join("journal.log")
    }

    /// Ensure the state directory exists
    pub async fn ensure(&self) -> ShellCacheResult<()> {
        fs::create_dir_all(&self.root).await.map_err(|e| {
            ShellCacheError::io(format!("creating directory {}", self.root.display()), e)
        })
    }
}

impl Default for StateLayout {
    fn default() -> Self {
        Self::new(ConfigManager::state_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_default_when_missing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nonexistent.toml");
        let manager = ConfigManager::with_path(path);

        let config = manager.load().await.unwrap();
        assert_eq!(config.site.name, "jeressar");
    }

    #[tokio::test]
    async fn save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");
        let manager = ConfigManager::with_path(path);

        let mut config = Config::default();
        config.site.name = "westfield".to_string();
        config.precache.assets = vec!["/".to_string()];

        manager.save(&config).await.unwrap();
        let loaded = manager.load().await.unwrap();

        assert_eq!(loaded.site.name, "westfield");
        assert_eq!(loaded.precache.assets, vec!["/".to_string()]);
    }

    #[tokio::test]
    async fn invalid_file_reports_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        tokio::fs::write(&path, "[site]\nversion = 3").await.unwrap();

        let err = ConfigManager::with_path(path.clone()).load().await.unwrap_err();
        match err {
            ShellCacheError::ConfigInvalid { path: p, .. } => assert_eq!(p, path),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn layout_paths() {
        let layout = StateLayout::new(PathBuf::from("/state"));
        let mut config = Config::default();

        assert_eq!(layout.caches_dir(&config), PathBuf::from("/state/caches"));
        assert_eq!(
            layout.registration_path(),
            PathBuf::from("/state/registration.json")
        );

        config.storage.path = Some(PathBuf::from("/elsewhere"));
        assert_eq!(layout.caches_dir(&config), PathBuf::from("/elsewhere"));
    }
}
