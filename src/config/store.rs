//! JSON configuration artifacts under the configuration directory.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use validator::Validate;

use crate::shared::error::ConfigError;

/// Default configuration directory, relative to the working directory.
pub const DEFAULT_CONFIG_DIR: &str = "config";

/// Filesystem location holding one JSON artifact per configuration object.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    root: PathBuf,
}

impl ConfigStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store rooted at `./config`
    pub fn in_working_dir() -> Self {
        Self::new(DEFAULT_CONFIG_DIR)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the artifact for a configuration name
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.json", name))
    }

    /// Create the configuration directory if it is missing.
    pub async fn ensure_exists(&self) -> Result<(), ConfigError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| ConfigError::io(&self.root, source))
    }

    pub async fn exists(&self, name: &str) -> Result<bool, ConfigError> {
        let path = self.path_for(name);
        tokio::fs::try_exists(&path)
            .await
            .map_err(|source| ConfigError::io(path, source))
    }

    /// Load the named artifact, or create and persist the default if absent.
    ///
    /// An existing artifact that fails to deserialize is reported as
    /// [`ConfigError::Corrupt`] and left untouched on disk.
    pub async fn load_existing_or_create<C>(&self, name: &str) -> Result<C, ConfigError>
    where
        C: Serialize + DeserializeOwned + Default + Validate,
    {
        self.load_existing_or_create_with(name, C::default).await
    }

    /// Like [`load_existing_or_create`](Self::load_existing_or_create), with
    /// the default built by `default` only when no artifact exists.
    pub async fn load_existing_or_create_with<C, F>(&self, name: &str, default: F) -> Result<C, ConfigError>
    where
        C: Serialize + DeserializeOwned + Validate,
        F: FnOnce() -> C,
    {
        let config = if self.exists(name).await? {
            self.load_existing(name).await?
        } else {
            let config = default();
            self.create_with(name, &config).await?;
            config
        };

        config.validate().map_err(|source| ConfigError::Invalid {
            name: name.to_string(),
            source,
        })?;

        Ok(config)
    }

    /// Deserialize an existing artifact.
    pub async fn load_existing<C: DeserializeOwned>(&self, name: &str) -> Result<C, ConfigError> {
        let path = self.path_for(name);
        let raw = tokio::fs::read(&path)
            .await
            .map_err(|source| ConfigError::io(&path, source))?;

        serde_json::from_slice(&raw).map_err(|source| ConfigError::Corrupt { path, source })
    }

    /// Persist `C::default()` as a new artifact. Fails if one already exists.
    pub async fn create_default<C>(&self, name: &str) -> Result<C, ConfigError>
    where
        C: Serialize + Default,
    {
        let config = C::default();
        self.create_with(name, &config).await?;
        Ok(config)
    }

    /// Persist `config` as a new artifact. Fails if one already exists.
    pub async fn create_with<C: Serialize>(&self, name: &str, config: &C) -> Result<(), ConfigError> {
        let path = self.path_for(name);
        let body = serde_json::to_vec_pretty(config)
            .map_err(|e| ConfigError::io(&path, std::io::Error::from(e)))?;

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|source| ConfigError::io(&path, source))?;
        file.write_all(&body)
            .await
            .map_err(|source| ConfigError::io(&path, source))?;
        file.flush()
            .await
            .map_err(|source| ConfigError::io(&path, source))?;

        tracing::info!(path = %path.display(), "Created default configuration");
        Ok(())
    }

    /// Overwrite the named artifact, going through a temporary file so a
    /// crash mid-write never leaves a truncated artifact behind.
    pub async fn save<C: Serialize>(&self, name: &str, config: &C) -> Result<(), ConfigError> {
        let path = self.path_for(name);
        let staging = self.root.join(format!("{}.json.tmp", name));
        let body = serde_json::to_vec_pretty(config)
            .map_err(|e| ConfigError::io(&path, std::io::Error::from(e)))?;

        tokio::fs::write(&staging, &body)
            .await
            .map_err(|source| ConfigError::io(&staging, source))?;
        tokio::fs::rename(&staging, &path)
            .await
            .map_err(|source| ConfigError::io(&path, source))
    }
}
