//! Name history entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A username or nickname a user was seen with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias {
    pub name: String,
    pub seen_at: DateTime<Utc>,
}
