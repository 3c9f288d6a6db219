//! Permissions Service
//!
//! Maps roles to permission names. The set of valid names comes from the
//! command catalog and is registered before the configuration is read.

use std::collections::{BTreeMap, HashSet};

use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::configurable::Configurable;
use crate::config::ConfigStore;
use crate::domain::services::{PermissionService, WILDCARD_PERMISSION};
use crate::domain::AuthorizationResult;

/// Persisted role grants (`permissions.json`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PermissionsConfig {
    /// Role id to granted permission names
    pub roles: BTreeMap<u64, Vec<String>>,
}

pub struct PermissionsService {
    store: ConfigStore,
    config: OnceCell<PermissionsConfig>,
    known: RwLock<HashSet<String>>,
}

impl PermissionsService {
    pub fn new(store: ConfigStore) -> Self {
        Self {
            store,
            config: OnceCell::new(),
            known: RwLock::new(HashSet::new()),
        }
    }

    /// Register permission names. The wildcard is always known.
    /// Returns how many names are registered afterwards.
    pub fn load_permissions<'a, I>(&self, permissions: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut known = self.known.write();
        known.insert(WILDCARD_PERMISSION.to_string());
        known.extend(permissions.into_iter().map(str::to_string));

        tracing::debug!(count = known.len(), "Permissions registered");
        known.len()
    }

    /// Registered permission names, sorted
    pub fn known_permissions(&self) -> Vec<String> {
        let mut names: Vec<_> = self.known.read().iter().cloned().collect();
        names.sort();
        names
    }

    /// Evaluate a permission for a member holding `roles`.
    pub fn check(&self, roles: &[u64], permission: &str) -> AuthorizationResult {
        let Some(config) = self.config.get() else {
            return AuthorizationResult::failure("Permissions are not configured");
        };

        let granted: HashSet<String> = roles
            .iter()
            .filter_map(|role| config.roles.get(role))
            .flatten()
            .cloned()
            .collect();

        PermissionService::evaluate(&self.known.read(), &granted, permission)
    }
}

impl Configurable for PermissionsService {
    type Config = PermissionsConfig;
    const CONFIG_NAME: &'static str = "permissions";

    fn store(&self) -> &ConfigStore {
        &self.store
    }

    fn config_slot(&self) -> &OnceCell<PermissionsConfig> {
        &self.config
    }
}
