//! Chat Commands
//!
//! Static command catalog and the dispatcher that authorizes invocations
//! against the permissions subsystem.

mod catalog;
mod dispatcher;

pub use catalog::{find_command, CommandSpec, COMMANDS};
pub use dispatcher::CommandDispatcher;
