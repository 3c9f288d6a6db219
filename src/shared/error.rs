//! Application Error Types
//!
//! Centralized error taxonomy for configuration, diagnostics, transport and startup.

use std::path::PathBuf;

/// Configuration load/create errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration at {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration at {path} could not be layered: {source}")]
    Layered {
        path: PathBuf,
        #[source]
        source: config::ConfigError,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration {name} failed validation: {source}")]
    Invalid {
        name: String,
        #[source]
        source: validator::ValidationErrors,
    },

    #[error("Configuration {name} could not be resolved: {reason}")]
    Unresolved { name: String, reason: String },

    #[error("Configuration {0} was already loaded")]
    AlreadyLoaded(&'static str),
}

impl ConfigError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Diagnostic sink persistence errors
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Failed to persist failure report to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failure report {0} already exists")]
    Collision(PathBuf),
}

/// Transport errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    #[error("Transport is not logged in")]
    NotLoggedIn,

    #[error("Transport was already started")]
    AlreadyStarted,

    #[error("Transport action failed: {0}")]
    Action(String),
}

/// Errors raised while a subsystem acts on a user
#[derive(Debug, thiserror::Error)]
pub enum ModerationError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("Punishment duration is out of range")]
    DurationOutOfRange,
}

/// Capability registry errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Service {0} is already registered")]
    Duplicate(&'static str),

    #[error("Service {0} is not registered")]
    Missing(&'static str),
}

/// Startup failures
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Configuration is corrupt: {0}")]
    ConfigCorrupt(#[source] ConfigError),

    #[error("Configuration storage failed: {0}")]
    IoFailure(#[source] ConfigError),

    #[error("Failed to connect: {0}")]
    ConnectFailure(#[from] TransportError),

    #[error("Deferred initialization failed: {0}")]
    DeferredHook(#[source] ConfigError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
}

impl StartupError {
    /// Category name used for failure report files
    pub fn kind(&self) -> &'static str {
        match self {
            StartupError::ConfigCorrupt(_) => "ConfigCorrupt",
            StartupError::IoFailure(_) => "IoFailure",
            StartupError::ConnectFailure(_) => "ConnectFailure",
            StartupError::DeferredHook(_) => "DeferredHookFailure",
            StartupError::Registry(_) => "RegistryError",
        }
    }
}

impl From<ConfigError> for StartupError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Corrupt { .. }
            | ConfigError::Layered { .. }
            | ConfigError::Invalid { .. }
            | ConfigError::Unresolved { .. } => StartupError::ConfigCorrupt(err),
            ConfigError::Io { .. } | ConfigError::AlreadyLoaded(_) => StartupError::IoFailure(err),
        }
    }
}
