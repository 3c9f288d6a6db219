//! Time-bound punishment entity.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::ModerationError;

/// Longest automatic punishment an operator may configure: one year
pub const MAX_PUNISHMENT_MINUTES: u64 = 525_600;

/// Convert a configured minute count, `None` when chrono cannot hold it.
pub fn checked_minutes(minutes: u64) -> Option<Duration> {
    i64::try_from(minutes).ok().and_then(Duration::try_minutes)
}

/// Kind of punishment applied through the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PunishmentKind {
    Mute,
    Ban,
}

/// Subsystem that issued a punishment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PunishmentOrigin {
    Moderator,
    Blacklist,
    Ratelimit,
    Slowmode,
}

/// A punishment that is reversed once it expires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Punishment {
    pub id: Uuid,
    pub guild_id: u64,
    pub user_id: u64,
    pub moderator_id: Option<u64>,
    pub kind: PunishmentKind,
    pub origin: PunishmentOrigin,
    pub reason: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Punishment {
    /// Issue a punishment now that expires after `duration`.
    ///
    /// # Errors
    ///
    /// Returns `ModerationError::DurationOutOfRange` when the expiry cannot
    /// be represented.
    pub fn new(
        guild_id: u64,
        user_id: u64,
        kind: PunishmentKind,
        origin: PunishmentOrigin,
        reason: impl Into<String>,
        duration: Duration,
    ) -> Result<Self, ModerationError> {
        let issued_at = Utc::now();
        let expires_at = issued_at
            .checked_add_signed(duration)
            .ok_or(ModerationError::DurationOutOfRange)?;
        Ok(Self {
            id: Uuid::new_v4(),
            guild_id,
            user_id,
            moderator_id: None,
            kind,
            origin,
            reason: reason.into(),
            issued_at,
            expires_at,
        })
    }

    pub fn with_moderator(mut self, moderator_id: u64) -> Self {
        self.moderator_id = Some(moderator_id);
        self
    }

    /// Whether the punishment has run its course at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
