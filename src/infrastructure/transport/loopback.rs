//! In-process transport.
//!
//! Keeps the whole connection lifecycle local: login checks the credential
//! shape, `start` publishes `Ready` exactly once, and every action is recorded
//! instead of being sent anywhere.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::{Transport, TransportEvent};
use crate::domain::Punishment;
use crate::shared::error::TransportError;
use crate::telemetry::{DiagnosticMessage, Severity};

/// Guild the default loopback transport reports once started
pub const LOOPBACK_GUILD_ID: u64 = 1;

const EVENT_CAPACITY: usize = 256;
/// Most recent actions kept; older ones are dropped
const ACTION_HISTORY: usize = 1024;
const LOG_SOURCE: &str = "Gateway";

/// Action a transport was asked to perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportAction {
    Message { channel_id: u64, content: String },
    Apply(Uuid),
    Lift(Uuid),
}

#[derive(Debug, Default)]
struct ConnectionState {
    logged_in: bool,
    started: bool,
}

/// Transport that never leaves the process
pub struct LoopbackTransport {
    guilds: Vec<u64>,
    state: Mutex<ConnectionState>,
    actions: Mutex<VecDeque<TransportAction>>,
    events: broadcast::Sender<TransportEvent>,
}

impl LoopbackTransport {
    pub fn new(guilds: Vec<u64>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            guilds,
            state: Mutex::new(ConnectionState::default()),
            actions: Mutex::new(VecDeque::new()),
            events,
        }
    }

    /// Most recent actions, oldest first
    pub fn actions(&self) -> Vec<TransportAction> {
        self.actions.lock().iter().cloned().collect()
    }

    pub fn is_started(&self) -> bool {
        self.state.lock().started
    }

    fn log(&self, severity: Severity, text: impl Into<String>) {
        // No subscribers is fine
        let _ = self
            .events
            .send(TransportEvent::Log(DiagnosticMessage::new(severity, LOG_SOURCE, text)));
    }

    fn record(&self, action: TransportAction) -> Result<(), TransportError> {
        if !self.state.lock().started {
            return Err(TransportError::Action("transport is not connected".to_string()));
        }
        let mut actions = self.actions.lock();
        if actions.len() == ACTION_HISTORY {
            actions.pop_front();
        }
        actions.push_back(action);
        Ok(())
    }
}

impl Default for LoopbackTransport {
    fn default() -> Self {
        Self::new(vec![LOOPBACK_GUILD_ID])
    }
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn login(&self, credential: &str) -> Result<(), TransportError> {
        if credential.chars().any(char::is_whitespace) {
            return Err(TransportError::InvalidCredential(
                "credential contains whitespace".to_string(),
            ));
        }
        if credential.is_empty() {
            self.log(Severity::Warning, "Logging in without a credential");
        }

        self.state.lock().logged_in = true;
        self.log(Severity::Verbose, "Logged in");
        Ok(())
    }

    async fn start(&self) -> Result<(), TransportError> {
        {
            let mut state = self.state.lock();
            if !state.logged_in {
                return Err(TransportError::NotLoggedIn);
            }
            if state.started {
                return Err(TransportError::AlreadyStarted);
            }
            state.started = true;
        }

        self.log(Severity::Info, "Connected");
        let _ = self.events.send(TransportEvent::Ready);
        tracing::debug!(guilds = self.guilds.len(), "Loopback transport ready");
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
        self.events.subscribe()
    }

    fn guilds(&self) -> Vec<u64> {
        if self.state.lock().started {
            self.guilds.clone()
        } else {
            Vec::new()
        }
    }

    async fn send_message(&self, channel_id: u64, content: &str) -> Result<(), TransportError> {
        self.record(TransportAction::Message {
            channel_id,
            content: content.to_string(),
        })
    }

    async fn apply_punishment(&self, punishment: &Punishment) -> Result<(), TransportError> {
        self.record(TransportAction::Apply(punishment.id))
    }

    async fn lift_punishment(&self, punishment: &Punishment) -> Result<(), TransportError> {
        self.record(TransportAction::Lift(punishment.id))
    }
}
