//! Mod Log Service
//!
//! Posts moderation events to the configured mod-log channel.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::configurable::Configurable;
use crate::config::ConfigStore;
use crate::infrastructure::transport::Transport;
use crate::shared::error::TransportError;

/// Persisted mod-log settings (`modlog.json`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ModLogConfig {
    pub channel_id: Option<u64>,
}

pub struct ModLogService {
    transport: Arc<dyn Transport>,
    store: ConfigStore,
    config: OnceCell<ModLogConfig>,
}

impl ModLogService {
    pub fn new(transport: Arc<dyn Transport>, store: ConfigStore) -> Self {
        Self {
            transport,
            store,
            config: OnceCell::new(),
        }
    }

    /// Post to the mod-log channel. Returns false when no channel is configured.
    pub async fn post(&self, text: &str) -> Result<bool, TransportError> {
        let Some(channel_id) = self.config.get().and_then(|c| c.channel_id) else {
            return Ok(false);
        };

        self.transport.send_message(channel_id, text).await?;
        Ok(true)
    }
}

impl Configurable for ModLogService {
    type Config = ModLogConfig;
    const CONFIG_NAME: &'static str = "modlog";

    fn store(&self) -> &ConfigStore {
        &self.store
    }

    fn config_slot(&self) -> &OnceCell<ModLogConfig> {
        &self.config
    }
}
