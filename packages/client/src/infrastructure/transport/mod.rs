//! Transport: one persistent websocket connection with heartbeat and
//! reconnect-with-backoff.
//!
//! The [`TransportManager`] owns the connection lifecycle. Consumers talk to it
//! through a cloneable [`TransportHandle`] and receive [`TransportEvent`]s on
//! an unbounded channel, strictly in arrival order.

mod manager;
mod websocket;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::infrastructure::dto::InboundEnvelope;

pub use manager::{TransportHandle, TransportManager};
pub use websocket::{WebSocketConnection, WebSocketConnector};

/// Transport faults. None of these reach callers of `send`; they drive the
/// reconnect policy and are logged.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("failed to send frame: {0}")]
    Send(String),

    #[error("failed to receive frame: {0}")]
    Receive(String),

    #[error("failed to close connection: {0}")]
    Close(String),

    #[error("failed to serialize outbound frame: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Opens connections. Implemented by the websocket connector and by test doubles.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Connection: Connection;

    async fn connect(&self) -> Result<Self::Connection, TransportError>;
}

/// One open, text-framed connection.
///
/// `recv` must be cancellation safe: it is polled inside `tokio::select!`.
#[async_trait]
pub trait Connection: Send + 'static {
    async fn send(&mut self, text: String) -> Result<(), TransportError>;

    /// Next text frame; `None` once the peer has closed the connection.
    async fn recv(&mut self) -> Option<Result<String, TransportError>>;

    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Tunables for the connection lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Route tag stamped on every outbound envelope.
    pub route: String,
    pub heartbeat_interval: Duration,
    pub reconnect_initial_delay: Duration,
    pub reconnect_max_delay: Duration,
    pub max_reconnect_attempts: u32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            route: "game".to_string(),
            heartbeat_interval: Duration::from_secs(30),
            reconnect_initial_delay: Duration::from_secs(1),
            reconnect_max_delay: Duration::from_secs(30),
            max_reconnect_attempts: 5,
        }
    }
}

impl TransportConfig {
    /// Delay before reconnect attempt `attempt` (0-based):
    /// `min(initial * 2^attempt, max)`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.reconnect_initial_delay.checked_mul(factor))
            .map_or(self.reconnect_max_delay, |delay| {
                delay.min(self.reconnect_max_delay)
            })
    }
}

/// Lifecycle state of the managed connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Idle,
    Connecting,
    Open,
    Reconnecting,
    Closed,
    Failed,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ConnectionStatus::Idle => "idle",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Open => "open",
            ConnectionStatus::Reconnecting => "reconnecting",
            ConnectionStatus::Closed => "closed",
            ConnectionStatus::Failed => "failed",
        };
        write!(f, "{label}")
    }
}

/// Notifications from the transport to its owner.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// A connection opened. `reconnected` is true for every open after the first.
    Opened { reconnected: bool },
    /// One inbound frame, parsed.
    Envelope(InboundEnvelope),
    /// The connection dropped without the owner asking for it.
    Closed { reason: Option<String> },
    /// A reconnect attempt is scheduled after `delay`.
    Reconnecting { attempt: u32, delay: Duration },
    /// Reconnect attempts are exhausted. Emitted once; nothing further is tried.
    Failed,
}
