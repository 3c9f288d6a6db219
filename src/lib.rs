//! # Moderation Bot Core
//!
//! Service core of a chat moderation bot:
//! - Startup orchestration of the moderation subsystems
//! - A diagnostic console sink that also persists failure reports
//! - Tri-state authorization results for command permission checks
//! - Per-subsystem JSON configuration, created with defaults on first run
//!
//! ## Architecture
//!
//! - **Domain Layer**: Punishments, records, authorization results
//! - **Application Layer**: Moderation subsystems and the service registry
//! - **Infrastructure Layer**: Chat transport and metrics
//! - **Presentation Layer**: Command catalog and dispatcher
//!
//! ## Module Structure
//!
//! ```text
//! modbot/
//! +-- config/         Core configuration and the configuration store
//! +-- domain/         Entities, value objects, permission evaluation
//! +-- application/    Subsystems, Configurable capability, registry
//! +-- infrastructure/ Transport and metrics
//! +-- presentation/   Chat commands
//! +-- shared/         Error types
//! +-- telemetry/      Tracing setup and the diagnostic sink
//! ```

// Configuration module
pub mod config;

// Domain layer - Core moderation types
pub mod domain;

// Application layer - Moderation subsystems
pub mod application;

// Infrastructure layer - Transport and metrics
pub mod infrastructure;

// Presentation layer - Chat commands
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup
pub mod startup;

// Telemetry and observability
pub mod telemetry;
