//! Permission evaluation domain service.

use std::collections::HashSet;

use crate::domain::value_objects::AuthorizationResult;

/// Permission name that grants every other permission.
pub const WILDCARD_PERMISSION: &str = "all";

/// Domain service for evaluating a permission against a grant set.
pub struct PermissionService;

impl PermissionService {
    /// Evaluate `permission` for a member holding `granted`.
    ///
    /// Unknown permissions always fail so that a typo in a command catalog
    /// never silently authorizes anyone. A grant that only comes from the
    /// wildcard is reported as a warning.
    pub fn evaluate(
        known: &HashSet<String>,
        granted: &HashSet<String>,
        permission: &str,
    ) -> AuthorizationResult {
        if !known.contains(permission) {
            return AuthorizationResult::failure(format!(
                "Permission `{}` does not exist",
                permission
            ));
        }

        if granted.contains(permission) {
            AuthorizationResult::success(format!("Granted `{}`", permission))
        } else if granted.contains(WILDCARD_PERMISSION) {
            AuthorizationResult::warning(format!(
                "Granted `{}` through the `{}` wildcard",
                permission, WILDCARD_PERMISSION
            ))
        } else {
            AuthorizationResult::failure(format!("Missing permission `{}`", permission))
        }
    }
}
