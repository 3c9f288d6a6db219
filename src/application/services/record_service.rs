//! Record Service
//!
//! Append-only history of moderation actions.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use dashmap::DashMap;

use crate::domain::{ModRecord, RecordAction};

pub struct RecordService {
    records: DashMap<u64, Vec<ModRecord>>,
    next_id: AtomicU64,
}

impl RecordService {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Append a record. `moderator_id` is None for automatic actions.
    pub fn add(
        &self,
        guild_id: u64,
        user_id: u64,
        moderator_id: Option<u64>,
        action: RecordAction,
        reason: impl Into<String>,
    ) -> ModRecord {
        let record = ModRecord {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            guild_id,
            user_id,
            moderator_id,
            action,
            reason: reason.into(),
            created_at: Utc::now(),
        };
        tracing::debug!(user_id, action = ?action, "Moderation record added");
        self.records.entry(user_id).or_default().push(record.clone());
        record
    }

    pub fn records_for(&self, user_id: u64) -> Vec<ModRecord> {
        self.records
            .get(&user_id)
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    pub fn count(&self) -> usize {
        self.records.iter().map(|entry| entry.value().len()).sum()
    }
}

impl Default for RecordService {
    fn default() -> Self {
        Self::new()
    }
}
