//! Configurable subsystem capability.
//!
//! Every subsystem with durable settings owns one configuration slot that is
//! filled exactly once from its JSON artifact (created with defaults on first
//! run). A second load is refused instead of re-reading or re-creating the
//! artifact.

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use serde::de::DeserializeOwned;
use serde::Serialize;
use validator::Validate;

use crate::config::ConfigStore;
use crate::shared::error::ConfigError;

#[async_trait]
pub trait Configurable: Send + Sync {
    type Config: Serialize + DeserializeOwned + Default + Validate + Send + Sync + 'static;

    /// Artifact name inside the configuration directory
    const CONFIG_NAME: &'static str;

    fn store(&self) -> &ConfigStore;

    fn config_slot(&self) -> &OnceCell<Self::Config>;

    /// Configuration persisted when no artifact exists yet
    fn default_config(&self) -> Self::Config {
        Self::Config::default()
    }

    /// Load the existing configuration or create and persist the default.
    ///
    /// # Errors
    ///
    /// `ConfigError::AlreadyLoaded` on a second call; `Corrupt`/`Invalid`
    /// for an unreadable artifact; `Io` when the default cannot be written.
    async fn load_configuration(&self) -> Result<&Self::Config, ConfigError> {
        if self.config_slot().get().is_some() {
            return Err(ConfigError::AlreadyLoaded(Self::CONFIG_NAME));
        }

        let config = self
            .store()
            .load_existing_or_create_with(Self::CONFIG_NAME, || self.default_config())
            .await?;

        tracing::debug!(name = Self::CONFIG_NAME, "Configuration loaded");
        self.config_slot()
            .try_insert(config)
            .map_err(|_| ConfigError::AlreadyLoaded(Self::CONFIG_NAME))
    }

    /// Loaded configuration, if any
    fn configuration(&self) -> Option<&Self::Config> {
        self.config_slot().get()
    }

    fn is_configured(&self) -> bool {
        self.config_slot().get().is_some()
    }
}
