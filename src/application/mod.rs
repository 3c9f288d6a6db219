//! Application Layer
//!
//! The moderation subsystems, the capability they share for loading their
//! settings, and the registry they are published through.

pub mod configurable;
pub mod registry;
pub mod services;

pub use configurable::Configurable;
pub use registry::{ServiceRegistry, ServiceRegistryBuilder};
