/// Connection identity, lifecycle state and the RAII unregister guard
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;

use super::codec::Frame;
use super::metrics::{ConnectionMetrics, ConnectionMetricsSnapshot};
use crate::logger::{self, LogTag};

/// Connection ID (unique per process, issued by the hub)
pub type ConnectionId = u64;

/// Per-connection outbound queue sender
pub type ConnectionSender = mpsc::Sender<Frame>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// WebSocket
    Duplex,
    /// Server-sent events
    Stream,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Duplex => write!(f, "duplex"),
            TransportKind::Stream => write!(f, "stream"),
        }
    }
}

// ============================================================================
// REGISTRY ENTRY
// ============================================================================

/// Hub-side view of a connection: what fan-out needs to reach it
#[derive(Debug)]
pub struct ConnectionSlot {
    pub id: ConnectionId,
    pub user_address: String,
    pub kind: TransportKind,
    pub connected_at: DateTime<Utc>,
    pub sender: ConnectionSender,
    pub metrics: Arc<ConnectionMetrics>,
}

impl ConnectionSlot {
    pub fn info(&self) -> ConnectionInfo {
        ConnectionInfo {
            id: self.id,
            user_address: self.user_address.clone(),
            kind: self.kind,
            connected_at: self.connected_at,
            queued: self.sender.max_capacity() - self.sender.capacity(),
            metrics: self.metrics.snapshot(),
        }
    }
}

/// Serializable description of a registered connection
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionInfo {
    pub id: ConnectionId,
    pub user_address: String,
    pub kind: TransportKind,
    pub connected_at: DateTime<Utc>,
    /// Frames waiting in the outbound queue
    pub queued: usize,
    pub metrics: ConnectionMetricsSnapshot,
}

// ============================================================================
// STATE MACHINE
// ============================================================================

/// CONNECTING -> REGISTERED -> UNREGISTERED (terminal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Registered,
    Unregistered,
}

impl ConnectionState {
    /// Apply a transition; returns false and leaves the state unchanged when
    /// the transition is not allowed
    pub fn transition(&mut self, next: ConnectionState) -> bool {
        let allowed = matches!(
            (*self, next),
            (ConnectionState::Connecting, ConnectionState::Registered)
                | (ConnectionState::Connecting, ConnectionState::Unregistered)
                | (ConnectionState::Registered, ConnectionState::Unregistered)
        );
        if allowed {
            *self = next;
        }
        allowed
    }

    pub fn is_terminal(&self) -> bool {
        *self == ConnectionState::Unregistered
    }
}

// ============================================================================
// UNREGISTER GUARD
// ============================================================================

/// Request for the dispatch loop to drop a connection
#[derive(Debug)]
pub struct UnregisterRequest {
    pub id: ConnectionId,
    pub ack: Option<tokio::sync::oneshot::Sender<()>>,
}

/// Owned by a connection's task; unregisters on `close` or on drop
///
/// Drop covers early returns and panics: the request is fire-and-forget on
/// an unbounded channel, so it never blocks or fails inside `Drop`.
#[derive(Debug)]
pub struct ConnectionGuard {
    id: ConnectionId,
    kind: TransportKind,
    state: ConnectionState,
    unregister_tx: mpsc::UnboundedSender<UnregisterRequest>,
}

impl ConnectionGuard {
    pub(crate) fn new(
        id: ConnectionId,
        kind: TransportKind,
        unregister_tx: mpsc::UnboundedSender<UnregisterRequest>,
    ) -> Self {
        let mut state = ConnectionState::Connecting;
        state.transition(ConnectionState::Registered);
        Self {
            id,
            kind,
            state,
            unregister_tx,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Move to UNREGISTERED and notify the hub; later calls are no-ops
    pub fn close(&mut self, reason: &str) {
        if !self.state.transition(ConnectionState::Unregistered) {
            return;
        }

        logger::debug(
            LogTag::Hub,
            &format!(
                "Connection {} ({}) closing: {}",
                self.id, self.kind, reason
            ),
        );

        // Hub already gone: nothing left to unregister from
        let _ = self.unregister_tx.send(UnregisterRequest {
            id: self.id,
            ack: None,
        });
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.close("guard dropped");
    }
}
