//! Application Services
//!
//! The moderation subsystems. Each one is constructed once at startup and
//! shared through the service registry.
//!
//! ## Available Services
//!
//! - **ModerationService**: General moderation settings
//! - **UsernoteService**: Moderator notes per user
//! - **RecordService**: Moderation action history
//! - **TagService**: Named text snippets
//! - **ModLogService**: Mod-log channel posting
//! - **UnpunishService**: Expiry of time-bound punishments
//! - **SlowmodeService**: Per-channel posting interval
//! - **RatelimitService**: Per-user message rate limiting
//! - **BlacklistService**: Blacklisted word screening
//! - **AliasTrackingService**: Name history
//! - **PermissionsService**: Role to permission grants

pub mod alias_service;
pub mod blacklist_service;
pub mod moderation_service;
pub mod modlog_service;
pub mod permissions_service;
pub mod ratelimit_service;
pub mod record_service;
pub mod slowmode_service;
pub mod tag_service;
pub mod unpunish_service;
pub mod usernote_service;

pub use alias_service::{AliasConfig, AliasTrackingService};
pub use blacklist_service::{BlacklistConfig, BlacklistService, BlacklistVerdict};
pub use moderation_service::{ModerationConfig, ModerationService};
pub use modlog_service::{ModLogConfig, ModLogService};
pub use permissions_service::{PermissionsConfig, PermissionsService};
pub use ratelimit_service::{RatelimitConfig, RatelimitService, RatelimitState};
pub use record_service::RecordService;
pub use slowmode_service::{SlowmodeService, SlowmodeVerdict, SLOWMODE_STRIKES};
pub use tag_service::TagService;
pub use unpunish_service::{PunishmentLedger, UnpunishService, LEDGER_NAME};
pub use usernote_service::UsernoteService;
