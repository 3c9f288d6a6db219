//! # Domain Value Objects
//!
//! Immutable value types that represent domain concepts without identity.
//!
//! ## Value Objects
//!
//! - **AuthorizationResult**: Success/Warning/Failure outcome of a permission check

mod authorization;

pub use authorization::*;
