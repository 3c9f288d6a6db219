//! Alias Tracking Service
//!
//! Remembers the names a user has been seen with.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::configurable::Configurable;
use crate::config::ConfigStore;
use crate::domain::Alias;
use crate::infrastructure::transport::Transport;
use crate::shared::error::TransportError;

/// Persisted alias tracking settings (`aliases.json`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AliasConfig {
    pub enabled: bool,

    /// Names kept per user, oldest dropped first
    #[validate(range(min = 1, max = 500))]
    pub max_history: usize,
}

impl Default for AliasConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_history: 20,
        }
    }
}

pub struct AliasTrackingService {
    transport: Arc<dyn Transport>,
    store: ConfigStore,
    config: OnceCell<AliasConfig>,
    history: DashMap<u64, Vec<Alias>>,
}

impl AliasTrackingService {
    pub fn new(transport: Arc<dyn Transport>, store: ConfigStore) -> Self {
        Self {
            transport,
            store,
            config: OnceCell::new(),
            history: DashMap::new(),
        }
    }

    /// Record a name for a user. Returns false when tracking is off or the
    /// name matches the latest one already recorded.
    pub fn record(&self, user_id: u64, name: &str, now: DateTime<Utc>) -> bool {
        let Some(config) = self.config.get().filter(|c| c.enabled) else {
            return false;
        };

        let mut names = self.history.entry(user_id).or_default();
        if names.last().is_some_and(|alias| alias.name == name) {
            return false;
        }
        names.push(Alias {
            name: name.to_string(),
            seen_at: now,
        });
        if names.len() > config.max_history {
            let excess = names.len() - config.max_history;
            let kept = names.split_off(excess);
            *names = kept;
        }
        true
    }

    /// Names a user was seen with, oldest first
    pub fn aliases(&self, user_id: u64) -> Vec<Alias> {
        self.history
            .get(&user_id)
            .map(|names| names.clone())
            .unwrap_or_default()
    }

    /// Post a user's known names to a channel.
    pub async fn announce_aliases(&self, channel_id: u64, user_id: u64) -> Result<(), TransportError> {
        let names = self.aliases(user_id);
        let text = if names.is_empty() {
            format!("No known aliases for user {}", user_id)
        } else {
            let list: Vec<&str> = names.iter().map(|a| a.name.as_str()).collect();
            format!("Known aliases for user {}: {}", user_id, list.join(", "))
        };
        self.transport.send_message(channel_id, &text).await
    }
}

impl Configurable for AliasTrackingService {
    type Config = AliasConfig;
    const CONFIG_NAME: &'static str = "aliases";

    fn store(&self) -> &ConfigStore {
        &self.store
    }

    fn config_slot(&self) -> &OnceCell<AliasConfig> {
        &self.config
    }
}
