//! # Domain Layer
//!
//! Core moderation types, independent of the transport and storage.
//!
//! ## Structure
//!
//! - **entities**: Punishments, moderation records, notes, aliases
//! - **value_objects**: Immutable value types (AuthorizationResult)
//! - **services**: Permission evaluation

pub mod entities;
pub mod services;
pub mod value_objects;

// Re-export commonly used types
pub use entities::*;
pub use value_objects::*;
