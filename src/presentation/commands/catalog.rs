//! Command catalog.

/// A chat command and the permission required to run it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub permission: &'static str,
    pub summary: &'static str,
}

impl CommandSpec {
    const fn new(name: &'static str, permission: &'static str, summary: &'static str) -> Self {
        Self {
            name,
            permission,
            summary,
        }
    }
}

/// Every command the bot understands
pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec::new("ban", "mod.ban", "Ban a user, optionally for a limited time"),
    CommandSpec::new("unban", "mod.ban", "Lift a ban"),
    CommandSpec::new("kick", "mod.kick", "Remove a user from the guild"),
    CommandSpec::new("mute", "mod.mute", "Mute a user for a limited time"),
    CommandSpec::new("unmute", "mod.mute", "Lift a mute"),
    CommandSpec::new("warn", "mod.warn", "Add a warning to a user's record"),
    CommandSpec::new("records", "mod.records", "Show a user's moderation history"),
    CommandSpec::new("note", "mod.notes", "Add or list moderator notes"),
    CommandSpec::new("tag", "tags.use", "Show a tag"),
    CommandSpec::new("tagset", "tags.manage", "Create, edit or delete a tag"),
    CommandSpec::new("slowmode", "channel.slowmode", "Set a channel's slow mode interval"),
    CommandSpec::new("ratelimit", "guild.ratelimit", "Enable, disable or show rate limiting"),
    CommandSpec::new("blacklist", "guild.blacklist", "Manage blacklisted words"),
    CommandSpec::new("aliases", "mod.aliases", "List names a user was seen with"),
    CommandSpec::new("modlog", "guild.modlog", "Set the mod-log channel"),
    CommandSpec::new("permissions", "guild.permissions", "Grant or revoke role permissions"),
];

/// Look up a command by name, case-insensitively
pub fn find_command(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|c| c.name.eq_ignore_ascii_case(name))
}
