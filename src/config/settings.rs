//! Core (process-wide) configuration.

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::store::ConfigStore;
use crate::shared::error::ConfigError;

/// Artifact name of the core configuration
pub const CORE_CONFIG_NAME: &str = "core";

/// Environment variable prefix for overrides (`MODBOT__TOKEN=...`)
pub const ENV_PREFIX: &str = "MODBOT";

/// Root configuration structure holding process-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct CoreConfig {
    /// Transport credential
    pub token: String,

    /// User exempt from automatic moderation (slowmode, rate limit and
    /// blacklist). Command permissions still come from roles.
    pub owner_id: Option<u64>,

    /// Seconds between unpunisher passes
    #[validate(range(min = 1))]
    pub unpunish_interval_secs: u64,

    /// Directory failure reports are written to
    #[validate(length(min = 1))]
    pub failure_log_dir: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            owner_id: None,
            unpunish_interval_secs: 30,
            failure_log_dir: "logs".to_string(),
        }
    }
}

impl CoreConfig {
    /// Load `core.json`, creating it with defaults first if it does not exist.
    ///
    /// The loading order is:
    /// 1. config/core.json
    /// 2. Environment variables prefixed with `MODBOT__` (highest priority)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the artifact cannot be created, parsed, or fails validation.
    pub async fn load_existing_or_create(store: &ConfigStore) -> Result<Self, ConfigError> {
        if !store.exists(CORE_CONFIG_NAME).await? {
            store.create_default::<Self>(CORE_CONFIG_NAME).await?;
        }
        Self::use_current(store)
    }

    /// Load the existing `core.json` layered with environment overrides.
    pub fn use_current(store: &ConfigStore) -> Result<Self, ConfigError> {
        let path = store.path_for(CORE_CONFIG_NAME);

        let settings: Self = Config::builder()
            .add_source(
                File::from(path.as_path())
                    .format(FileFormat::Json)
                    .required(true),
            )
            // MODBOT__TOKEN=abc -> token = "abc"
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|layered| layered.try_deserialize())
            .map_err(|source| ConfigError::Layered {
                path: path.clone(),
                source,
            })?;

        settings.validate().map_err(|source| ConfigError::Invalid {
            name: CORE_CONFIG_NAME.to_string(),
            source,
        })?;

        Ok(settings)
    }

    pub fn has_token(&self) -> bool {
        !self.token.trim().is_empty()
    }
}
