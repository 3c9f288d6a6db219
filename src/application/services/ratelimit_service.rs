//! Ratelimit Service
//!
//! Sliding-window message rate limiting. Users sending more than `limit`
//! messages inside the window are muted through the unpunisher.
//!
//! The service starts Disabled. It becomes Enabled either through
//! [`RatelimitService::enable`] at startup, when the persisted configuration
//! says so, or later from a command.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::modlog_service::ModLogService;
use super::record_service::RecordService;
use super::unpunish_service::UnpunishService;
use crate::application::configurable::Configurable;
use crate::config::{ConfigStore, CoreConfig};
use crate::domain::{checked_minutes, Punishment, PunishmentKind, PunishmentOrigin, RecordAction};
use crate::infrastructure::transport::Transport;
use crate::shared::error::ModerationError;

/// Persisted rate-limit settings (`ratelimit.json`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RatelimitConfig {
    pub is_enabled: bool,

    /// Messages allowed per window
    #[validate(range(min = 1))]
    pub limit: u32,

    /// Window length, at most one day
    #[validate(range(min = 1, max = 86_400))]
    pub window_secs: u64,

    /// Mute length, at most one year
    #[validate(range(min = 1, max = 525_600))]
    pub mute_minutes: u64,
}

impl Default for RatelimitConfig {
    fn default() -> Self {
        Self {
            is_enabled: false,
            limit: 5,
            window_secs: 5,
            mute_minutes: 10,
        }
    }
}

/// Tracked users above which idle histories are dropped
const PRUNE_THRESHOLD: usize = 1024;

/// Activation state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatelimitState {
    Disabled,
    Enabled { limit: u32 },
}

pub struct RatelimitService {
    transport: Arc<dyn Transport>,
    records: Arc<RecordService>,
    unpunish: Arc<UnpunishService>,
    modlog: Arc<ModLogService>,
    store: ConfigStore,
    owner_id: Option<u64>,
    config: OnceCell<RatelimitConfig>,
    state: RwLock<RatelimitState>,
    history: DashMap<u64, VecDeque<DateTime<Utc>>>,
}

impl RatelimitService {
    pub fn new(
        transport: Arc<dyn Transport>,
        core: &CoreConfig,
        records: Arc<RecordService>,
        unpunish: Arc<UnpunishService>,
        modlog: Arc<ModLogService>,
        store: ConfigStore,
    ) -> Self {
        Self {
            transport,
            records,
            unpunish,
            modlog,
            store,
            owner_id: core.owner_id,
            config: OnceCell::new(),
            state: RwLock::new(RatelimitState::Disabled),
            history: DashMap::new(),
        }
    }

    pub fn enable(&self, limit: u32) {
        *self.state.write() = RatelimitState::Enabled { limit: limit.max(1) };
        tracing::info!(limit, "Rate limiting enabled");
    }

    pub fn disable(&self) {
        *self.state.write() = RatelimitState::Disabled;
        self.history.clear();
        tracing::info!("Rate limiting disabled");
    }

    pub fn state(&self) -> RatelimitState {
        *self.state.read()
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self.state(), RatelimitState::Enabled { .. })
    }

    /// Active limit, if enabled
    pub fn limit(&self) -> Option<u32> {
        match self.state() {
            RatelimitState::Enabled { limit } => Some(limit),
            RatelimitState::Disabled => None,
        }
    }

    /// Count a message; returns the punishment when the user went over the limit.
    pub async fn record_message(
        &self,
        guild_id: u64,
        user_id: u64,
        now: DateTime<Utc>,
    ) -> Result<Option<Punishment>, ModerationError> {
        let Some(limit) = self.limit() else {
            return Ok(None);
        };
        if self.owner_id == Some(user_id) {
            return Ok(None);
        }

        let defaults = RatelimitConfig::default();
        let config = self.config.get().unwrap_or(&defaults);
        let cutoff = window_start(config, now)?;

        let exceeded = {
            let mut sent = self.history.entry(user_id).or_default();
            // Remove entries older than the window
            while sent.front().is_some_and(|t| *t <= cutoff) {
                sent.pop_front();
            }
            sent.push_back(now);
            let exceeded = sent.len() > limit as usize;
            if exceeded {
                sent.clear();
            }
            exceeded
        };
        if self.history.len() > PRUNE_THRESHOLD {
            self.prune(now)?;
        }
        if !exceeded {
            return Ok(None);
        }

        let reason = format!("Sent more than {} messages in {}s", limit, config.window_secs);
        let duration = checked_minutes(config.mute_minutes).ok_or(ModerationError::DurationOutOfRange)?;
        let punishment = Punishment::new(
            guild_id,
            user_id,
            PunishmentKind::Mute,
            PunishmentOrigin::Ratelimit,
            reason.clone(),
            duration,
        )?;
        self.unpunish.add(punishment.clone()).await?;
        self.records
            .add(guild_id, user_id, None, RecordAction::Mute, reason.clone());
        self.modlog
            .post(&format!("Muted user {}: {}", user_id, reason))
            .await?;

        Ok(Some(punishment))
    }

    /// Drop histories with no message inside the window; returns how many went.
    pub fn prune(&self, now: DateTime<Utc>) -> Result<usize, ModerationError> {
        let defaults = RatelimitConfig::default();
        let cutoff = window_start(self.config.get().unwrap_or(&defaults), now)?;
        let before = self.history.len();
        self.history
            .retain(|_, sent| sent.back().is_some_and(|t| *t > cutoff));
        Ok(before.saturating_sub(self.history.len()))
    }

    /// Users with a message history
    pub fn tracked_users(&self) -> usize {
        self.history.len()
    }

    /// Tell a channel the current rate-limit state
    pub async fn announce(&self, channel_id: u64) -> Result<(), ModerationError> {
        let text = match self.state() {
            RatelimitState::Enabled { limit } => format!("Rate limit is on: {} messages per window", limit),
            RatelimitState::Disabled => "Rate limit is off".to_string(),
        };
        self.transport.send_message(channel_id, &text).await?;
        Ok(())
    }
}

fn window_start(config: &RatelimitConfig, now: DateTime<Utc>) -> Result<DateTime<Utc>, ModerationError> {
    i64::try_from(config.window_secs)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|window| now.checked_sub_signed(window))
        .ok_or(ModerationError::DurationOutOfRange)
}

impl Configurable for RatelimitService {
    type Config = RatelimitConfig;
    const CONFIG_NAME: &'static str = "ratelimit";

    fn store(&self) -> &ConfigStore {
        &self.store
    }

    fn config_slot(&self) -> &OnceCell<RatelimitConfig> {
        &self.config
    }
}
