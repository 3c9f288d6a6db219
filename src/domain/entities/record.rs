//! Moderation record entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Action captured in a moderation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordAction {
    Warn,
    Mute,
    Unmute,
    Ban,
    Unban,
    Kick,
}

/// A single moderation action taken against a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModRecord {
    pub id: u64,
    pub guild_id: u64,
    pub user_id: u64,
    /// None when the action was automatic
    pub moderator_id: Option<u64>,
    pub action: RecordAction,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}
