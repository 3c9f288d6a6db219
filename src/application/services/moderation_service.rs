//! Moderation Service
//!
//! General moderation settings shared by the punishment-issuing subsystems.

use chrono::Duration;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::configurable::Configurable;
use crate::config::ConfigStore;
use crate::domain::MAX_PUNISHMENT_MINUTES;

/// Persisted moderation settings (`moderation.json`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ModerationConfig {
    /// Role applied to muted members
    pub mute_role_id: Option<u64>,

    /// Mute length used when a moderator gives none, at most one year
    #[validate(range(min = 1, max = 525_600))]
    pub default_mute_minutes: u64,

    /// Whether banned users are told why
    pub dm_on_ban: bool,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            mute_role_id: None,
            default_mute_minutes: 60,
            dm_on_ban: true,
        }
    }
}

pub struct ModerationService {
    store: ConfigStore,
    config: OnceCell<ModerationConfig>,
}

impl ModerationService {
    pub fn new(store: ConfigStore) -> Self {
        Self {
            store,
            config: OnceCell::new(),
        }
    }

    pub fn mute_role(&self) -> Option<u64> {
        self.config.get().and_then(|c| c.mute_role_id)
    }

    pub fn default_mute_duration(&self) -> Duration {
        let minutes = self
            .config
            .get()
            .map(|c| c.default_mute_minutes)
            .unwrap_or_else(|| ModerationConfig::default().default_mute_minutes);
        Duration::minutes(minutes.min(MAX_PUNISHMENT_MINUTES) as i64)
    }
}

impl Configurable for ModerationService {
    type Config = ModerationConfig;
    const CONFIG_NAME: &'static str = "moderation";

    fn store(&self) -> &ConfigStore {
        &self.store
    }

    fn config_slot(&self) -> &OnceCell<ModerationConfig> {
        &self.config
    }
}
