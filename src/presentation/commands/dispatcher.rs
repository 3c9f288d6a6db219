//! Command dispatcher.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use super::catalog::{find_command, CommandSpec, COMMANDS};
use crate::application::services::PermissionsService;
use crate::application::ServiceRegistry;
use crate::domain::AuthorizationResult;
use crate::infrastructure::metrics;
use crate::shared::error::RegistryError;

/// Authorizes command invocations. Commands are available once installed.
pub struct CommandDispatcher {
    registry: Arc<ServiceRegistry>,
    installed: OnceCell<HashMap<&'static str, &'static CommandSpec>>,
}

impl CommandDispatcher {
    pub fn new(registry: Arc<ServiceRegistry>) -> Self {
        Self {
            registry,
            installed: OnceCell::new(),
        }
    }

    /// Install the command catalog. Returns the number of commands installed.
    ///
    /// # Errors
    ///
    /// `RegistryError::Missing` when the permissions subsystem is not
    /// registered, `RegistryError::Duplicate` on a second install.
    pub fn install(&self) -> Result<usize, RegistryError> {
        let permissions = self.registry.require::<PermissionsService>()?;
        let known = permissions.known_permissions();

        let commands: HashMap<_, _> = COMMANDS.iter().map(|c| (c.name, c)).collect();
        for command in commands.values() {
            if !known.iter().any(|p| p == command.permission) {
                tracing::warn!(
                    command = command.name,
                    permission = command.permission,
                    "Command requires an unregistered permission"
                );
            }
        }

        let count = commands.len();
        self.installed
            .set(commands)
            .map_err(|_| RegistryError::Duplicate("CommandDispatcher"))?;

        tracing::info!(count, "Commands installed");
        Ok(count)
    }

    pub fn is_installed(&self) -> bool {
        self.installed.get().is_some()
    }

    /// Installed commands, sorted by name
    pub fn commands(&self) -> Vec<&'static CommandSpec> {
        let mut commands: Vec<_> = self
            .installed
            .get()
            .map(|c| c.values().copied().collect())
            .unwrap_or_default();
        commands.sort_by_key(|c| c.name);
        commands
    }

    /// Decide whether a member holding `roles` may run `command`.
    pub fn authorize(&self, roles: &[u64], command: &str) -> AuthorizationResult {
        let result = self.evaluate(roles, command);
        metrics::record_authorization(result.kind().as_str());
        tracing::debug!(command, outcome = result.kind().as_str(), "Command authorized");
        result
    }

    fn evaluate(&self, roles: &[u64], command: &str) -> AuthorizationResult {
        let Some(installed) = self.installed.get() else {
            return AuthorizationResult::failure("Commands are not installed yet");
        };
        let Some(found) = find_command(command).and_then(|c| installed.get(c.name)) else {
            return AuthorizationResult::failure(format!("Unknown command `{}`", command));
        };

        match self.registry.get::<PermissionsService>() {
            Some(permissions) => permissions.check(roles, found.permission),
            None => AuthorizationResult::failure("Permissions are unavailable"),
        }
    }
}
