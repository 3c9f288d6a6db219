//! # Domain Entities
//!
//! Core moderation entities shared by the subsystems.
//!
//! - **Punishment**: Time-bound mute or ban reversed by the unpunisher
//! - **ModRecord**: History of moderation actions
//! - **Usernote**: Moderator notes about a user
//! - **Alias**: Previously seen user names

mod alias;
mod punishment;
mod record;
mod usernote;

pub use alias::Alias;
pub use punishment::{checked_minutes, Punishment, PunishmentKind, PunishmentOrigin, MAX_PUNISHMENT_MINUTES};
pub use record::{ModRecord, RecordAction};
pub use usernote::Usernote;
