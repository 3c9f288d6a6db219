//! Slowmode Service
//!
//! Per-channel minimum interval between a user's messages. Users who keep
//! posting too fast are muted for a while.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use super::modlog_service::ModLogService;
use super::record_service::RecordService;
use super::unpunish_service::UnpunishService;
use crate::config::CoreConfig;
use crate::domain::{Punishment, PunishmentKind, PunishmentOrigin, RecordAction};
use crate::infrastructure::transport::Transport;
use crate::shared::error::ModerationError;

/// Throttled messages tolerated before a mute
pub const SLOWMODE_STRIKES: u32 = 3;

/// Mute length as a multiple of the channel interval
const MUTE_INTERVALS: i64 = 10;

/// Tracked posters above which stale entries are dropped
const PRUNE_THRESHOLD: usize = 1024;

/// Outcome of a slowmode check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlowmodeVerdict {
    Allowed,
    Throttled { retry_after: Duration },
    Muted,
}

pub struct SlowmodeService {
    transport: Arc<dyn Transport>,
    modlog: Arc<ModLogService>,
    unpunish: Arc<UnpunishService>,
    records: Arc<RecordService>,
    owner_id: Option<u64>,
    channels: DashMap<u64, Duration>,
    last_post: DashMap<(u64, u64), DateTime<Utc>>,
    strikes: DashMap<(u64, u64), u32>,
}

impl SlowmodeService {
    pub fn new(
        transport: Arc<dyn Transport>,
        modlog: Arc<ModLogService>,
        unpunish: Arc<UnpunishService>,
        records: Arc<RecordService>,
        core: &CoreConfig,
    ) -> Self {
        Self {
            transport,
            modlog,
            unpunish,
            records,
            owner_id: core.owner_id,
            channels: DashMap::new(),
            last_post: DashMap::new(),
            strikes: DashMap::new(),
        }
    }

    /// Enable slowmode on a channel and announce it there.
    pub async fn enable(&self, channel_id: u64, interval: Duration) -> Result<(), ModerationError> {
        self.channels.insert(channel_id, interval);
        self.transport
            .send_message(
                channel_id,
                &format!("Slow mode is on: one message every {} seconds", interval.num_seconds()),
            )
            .await?;
        self.modlog
            .post(&format!("Slow mode enabled in channel {}", channel_id))
            .await?;
        Ok(())
    }

    /// Disable slowmode; returns whether it was on.
    pub fn disable(&self, channel_id: u64) -> bool {
        self.last_post.retain(|(channel, _), _| *channel != channel_id);
        self.strikes.retain(|(channel, _), _| *channel != channel_id);
        self.channels.remove(&channel_id).is_some()
    }

    pub fn interval_for(&self, channel_id: u64) -> Option<Duration> {
        self.channels.get(&channel_id).map(|i| *i)
    }

    /// Forget posts whose interval has passed at `now`; returns how many went.
    pub fn prune(&self, now: DateTime<Utc>) -> usize {
        let before = self.last_post.len();
        self.last_post.retain(|(channel, _), last| {
            self.channels
                .get(channel)
                .is_some_and(|interval| now - *last < *interval)
        });
        self.strikes.retain(|key, _| self.last_post.contains_key(key));
        before.saturating_sub(self.last_post.len())
    }

    /// Check whether a user may post in a channel at `now`.
    pub async fn check(
        &self,
        guild_id: u64,
        channel_id: u64,
        user_id: u64,
        now: DateTime<Utc>,
    ) -> Result<SlowmodeVerdict, ModerationError> {
        let Some(interval) = self.interval_for(channel_id) else {
            return Ok(SlowmodeVerdict::Allowed);
        };
        if self.owner_id == Some(user_id) {
            return Ok(SlowmodeVerdict::Allowed);
        }

        let key = (channel_id, user_id);
        let last = self.last_post.get(&key).map(|t| *t);
        let retry_after = match last {
            Some(last) if now - last < interval => interval - (now - last),
            _ => {
                self.last_post.insert(key, now);
                self.strikes.remove(&key);
                if self.last_post.len() > PRUNE_THRESHOLD {
                    self.prune(now);
                }
                return Ok(SlowmodeVerdict::Allowed);
            }
        };

        let strikes = {
            let mut entry = self.strikes.entry(key).or_insert(0);
            *entry += 1;
            *entry
        };
        if strikes < SLOWMODE_STRIKES {
            return Ok(SlowmodeVerdict::Throttled { retry_after });
        }

        self.strikes.remove(&key);
        let reason = format!("Ignored slow mode in channel {}", channel_id);
        let duration = interval
            .num_seconds()
            .checked_mul(MUTE_INTERVALS)
            .and_then(Duration::try_seconds)
            .ok_or(ModerationError::DurationOutOfRange)?;
        self.unpunish
            .add(Punishment::new(
                guild_id,
                user_id,
                PunishmentKind::Mute,
                PunishmentOrigin::Slowmode,
                reason.clone(),
                duration,
            )?)
            .await?;
        self.records
            .add(guild_id, user_id, None, RecordAction::Mute, reason.clone());
        self.modlog
            .post(&format!("Muted user {}: {}", user_id, reason))
            .await?;
        Ok(SlowmodeVerdict::Muted)
    }
}
