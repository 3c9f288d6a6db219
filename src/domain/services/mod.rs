//! Domain Services
//!
//! Stateless business logic that does not belong to a single entity.

mod permission_service;

pub use permission_service::{PermissionService, WILDCARD_PERMISSION};
