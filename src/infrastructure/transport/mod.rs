//! Chat Transport
//!
//! The connection to the chat platform. The orchestrator logs in, starts the
//! connection, listens for the `Ready` signal and forwards the transport's
//! own log feed to the diagnostic sink. Subsystems use it to act on users.

mod loopback;

pub use loopback::{LoopbackTransport, TransportAction, LOOPBACK_GUILD_ID};

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::domain::Punishment;
use crate::shared::error::TransportError;
use crate::telemetry::DiagnosticMessage;

/// Events published by a transport
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// Handshake completed and initial state is populated
    Ready,
    /// Diagnostic produced by the transport itself
    Log(DiagnosticMessage),
}

/// Chat platform connection
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Authenticate with the platform
    async fn login(&self, credential: &str) -> Result<(), TransportError>;

    /// Open the connection; `Ready` is published once it is live
    async fn start(&self) -> Result<(), TransportError>;

    /// Subscribe to transport events
    fn subscribe(&self) -> broadcast::Receiver<TransportEvent>;

    /// Guilds visible on the live connection (empty before ready)
    fn guilds(&self) -> Vec<u64>;

    /// Post a message to a channel
    async fn send_message(&self, channel_id: u64, content: &str) -> Result<(), TransportError>;

    /// Apply a mute or ban
    async fn apply_punishment(&self, punishment: &Punishment) -> Result<(), TransportError>;

    /// Reverse a mute or ban
    async fn lift_punishment(&self, punishment: &Punishment) -> Result<(), TransportError>;
}
