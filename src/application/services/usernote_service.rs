//! Usernote Service
//!
//! Moderator notes kept per user.

use chrono::Utc;
use dashmap::DashMap;

use crate::domain::Usernote;

#[derive(Default)]
pub struct UsernoteService {
    notes: DashMap<u64, Vec<Usernote>>,
}

impl UsernoteService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_note(&self, user_id: u64, author_id: u64, content: impl Into<String>) -> Usernote {
        let note = Usernote {
            user_id,
            author_id,
            content: content.into(),
            created_at: Utc::now(),
        };
        self.notes.entry(user_id).or_default().push(note.clone());
        note
    }

    /// Notes for a user, oldest first
    pub fn notes_for(&self, user_id: u64) -> Vec<Usernote> {
        self.notes
            .get(&user_id)
            .map(|notes| notes.clone())
            .unwrap_or_default()
    }

    /// Remove every note for a user, returning how many were removed
    pub fn clear(&self, user_id: u64) -> usize {
        self.notes.remove(&user_id).map(|(_, notes)| notes.len()).unwrap_or(0)
    }
}
