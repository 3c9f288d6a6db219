//! Shared Utilities
//!
//! Common types used across all layers.

pub mod error;

pub use error::{ConfigError, ModerationError, RegistryError, SinkError, StartupError, TransportError};
