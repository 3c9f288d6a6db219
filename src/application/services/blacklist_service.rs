//! Blacklist Service
//!
//! Matches messages against blacklisted words and escalates repeat offenders
//! to a temporary mute. Its configuration is keyed to a live guild, so it is
//! loaded from the transport-ready hook rather than during construction.

use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::modlog_service::ModLogService;
use super::record_service::RecordService;
use super::unpunish_service::UnpunishService;
use crate::application::configurable::Configurable;
use crate::config::{ConfigStore, CoreConfig};
use crate::domain::{checked_minutes, Punishment, PunishmentKind, PunishmentOrigin, RecordAction};
use crate::infrastructure::transport::Transport;
use crate::shared::error::{ConfigError, ModerationError};

/// Persisted blacklist settings (`blacklist.json`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct BlacklistConfig {
    /// Guild the blacklist applies to
    pub guild_id: Option<u64>,

    pub words: Vec<String>,

    /// Mute length, at most one year
    #[validate(range(min = 1, max = 525_600))]
    pub mute_minutes: u64,

    /// Matches tolerated before a mute
    #[validate(range(min = 1))]
    pub strikes_before_mute: u32,
}

impl Default for BlacklistConfig {
    fn default() -> Self {
        Self {
            guild_id: None,
            words: Vec::new(),
            mute_minutes: 10,
            strikes_before_mute: 3,
        }
    }
}

/// Outcome of screening one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlacklistVerdict {
    Clean,
    Warned { word: String, strikes: u32 },
    Muted { word: String },
}

pub struct BlacklistService {
    transport: Arc<dyn Transport>,
    unpunish: Arc<UnpunishService>,
    records: Arc<RecordService>,
    modlog: Arc<ModLogService>,
    store: ConfigStore,
    owner_id: Option<u64>,
    config: OnceCell<BlacklistConfig>,
    strikes: DashMap<u64, u32>,
}

impl BlacklistService {
    pub fn new(
        transport: Arc<dyn Transport>,
        unpunish: Arc<UnpunishService>,
        records: Arc<RecordService>,
        modlog: Arc<ModLogService>,
        store: ConfigStore,
        core: &CoreConfig,
    ) -> Self {
        Self {
            transport,
            unpunish,
            records,
            modlog,
            store,
            owner_id: core.owner_id,
            config: OnceCell::new(),
            strikes: DashMap::new(),
        }
    }

    /// Load the configuration once the transport is live and make sure it
    /// names a guild.
    pub async fn initialize(&self) -> Result<&BlacklistConfig, ConfigError> {
        let config = self.load_configuration().await?;
        if config.guild_id.is_none() {
            return Err(ConfigError::Unresolved {
                name: Self::CONFIG_NAME.to_string(),
                reason: "no guild is available on the live connection".to_string(),
            });
        }

        tracing::info!(words = config.words.len(), "Blacklist loaded");
        Ok(config)
    }

    /// First blacklisted word contained in `text`, case-insensitively
    pub fn check(&self, text: &str) -> Option<String> {
        let config = self.config.get()?;
        let text = text.to_lowercase();
        config
            .words
            .iter()
            .find(|word| !word.is_empty() && text.contains(&word.to_lowercase()))
            .cloned()
    }

    /// Screen a message and escalate to a mute after too many strikes.
    pub async fn handle_message(&self, user_id: u64, text: &str) -> Result<BlacklistVerdict, ModerationError> {
        if self.owner_id == Some(user_id) {
            return Ok(BlacklistVerdict::Clean);
        }
        let Some(word) = self.check(text) else {
            return Ok(BlacklistVerdict::Clean);
        };
        let config = self
            .config
            .get()
            .ok_or(ModerationError::NotConfigured("blacklist"))?;
        let guild_id = config
            .guild_id
            .ok_or(ModerationError::NotConfigured("blacklist guild"))?;

        let strikes = {
            let mut entry = self.strikes.entry(user_id).or_insert(0);
            *entry += 1;
            *entry
        };
        let reason = format!("Used blacklisted word `{}`", word);

        if strikes < config.strikes_before_mute {
            self.records
                .add(guild_id, user_id, None, RecordAction::Warn, reason);
            return Ok(BlacklistVerdict::Warned { word, strikes });
        }

        let duration = checked_minutes(config.mute_minutes).ok_or(ModerationError::DurationOutOfRange)?;
        let punishment = Punishment::new(
            guild_id,
            user_id,
            PunishmentKind::Mute,
            PunishmentOrigin::Blacklist,
            reason.clone(),
            duration,
        )?;
        self.unpunish.add(punishment).await?;
        self.records
            .add(guild_id, user_id, None, RecordAction::Mute, reason.clone());
        self.modlog
            .post(&format!("Muted user {}: {}", user_id, reason))
            .await?;

        Ok(BlacklistVerdict::Muted { word })
    }

    pub fn strikes(&self, user_id: u64) -> u32 {
        self.strikes.get(&user_id).map(|s| *s).unwrap_or(0)
    }

    /// Forget a user's strikes once their blacklist mute has run out
    pub fn reset_strikes(&self, user_id: u64) {
        self.strikes.remove(&user_id);
    }
}

impl Configurable for BlacklistService {
    type Config = BlacklistConfig;
    const CONFIG_NAME: &'static str = "blacklist";

    fn store(&self) -> &ConfigStore {
        &self.store
    }

    fn config_slot(&self) -> &OnceCell<BlacklistConfig> {
        &self.config
    }

    fn default_config(&self) -> BlacklistConfig {
        BlacklistConfig {
            guild_id: self.transport.guilds().first().copied(),
            ..BlacklistConfig::default()
        }
    }
}
