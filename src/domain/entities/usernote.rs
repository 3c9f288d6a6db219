//! Moderator notes attached to a user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usernote {
    pub user_id: u64,
    pub author_id: u64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
