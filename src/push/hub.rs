/// Event hub - single dispatch loop owning the connection registry
///
/// The loop consumes three inputs with no fixed priority:
/// - register requests (acknowledged once the connection is visible to fan-out)
/// - unregister requests (fire-and-forget from guards, or acknowledged)
/// - publish requests (bounded; the only producer-side backpressure)
///
/// Fan-out never waits on a connection: each target gets a `try_send` and a
/// full queue drops the frame for that connection only.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use super::codec::{self, Frame};
use super::connection::{
    ConnectionGuard, ConnectionId, ConnectionInfo, ConnectionSlot, TransportKind,
    UnregisterRequest,
};
use super::message::PushEvent;
use super::metrics::{ConnectionMetrics, HubMetrics};
use super::registry::ConnectionRegistry;
use crate::config::HubConfig;
use crate::errors::HubError;
use crate::logger::{self, LogTag};

// ============================================================================
// HUB TYPES
// ============================================================================

struct RegisterRequest {
    slot: Arc<ConnectionSlot>,
    ack: oneshot::Sender<()>,
}

/// Everything a transport needs after a successful register
#[derive(Debug)]
pub struct Registration {
    pub id: ConnectionId,
    pub user_address: String,
    pub receiver: mpsc::Receiver<Frame>,
    pub guard: ConnectionGuard,
    pub metrics: Arc<ConnectionMetrics>,
}

// ============================================================================
// HUB HANDLE
// ============================================================================

/// Cloneable entry point for producers and transports
///
/// The dispatch loop runs until every handle is dropped or shutdown fires.
#[derive(Clone)]
pub struct HubHandle {
    register_tx: mpsc::Sender<RegisterRequest>,
    unregister_tx: mpsc::UnboundedSender<UnregisterRequest>,
    publish_tx: mpsc::Sender<PushEvent>,
    registry: Arc<ConnectionRegistry>,
    metrics: Arc<HubMetrics>,
    next_conn_id: Arc<AtomicU64>,
    queue_capacity: usize,
}

impl HubHandle {
    /// Queue an event for fan-out, waiting only if the hub's input buffer is full
    pub async fn publish(&self, event: PushEvent) -> Result<(), HubError> {
        self.publish_tx
            .send(event)
            .await
            .map_err(|_| HubError::Closed)
    }

    /// Queue an event without waiting
    pub fn try_publish(&self, event: PushEvent) -> Result<(), HubError> {
        self.publish_tx.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => HubError::Busy,
            mpsc::error::TrySendError::Closed(_) => HubError::Closed,
        })
    }

    /// Create a connection and make it visible to fan-out
    ///
    /// Returns once the dispatch loop has inserted it into the registry.
    pub async fn register(
        &self,
        user_address: &str,
        kind: TransportKind,
    ) -> Result<Registration, HubError> {
        let id = self.next_conn_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel(self.queue_capacity);
        let metrics = ConnectionMetrics::new();

        let slot = Arc::new(ConnectionSlot {
            id,
            user_address: user_address.to_string(),
            kind,
            connected_at: Utc::now(),
            sender,
            metrics: metrics.clone(),
        });

        let (ack_tx, ack_rx) = oneshot::channel();
        self.register_tx
            .send(RegisterRequest { slot, ack: ack_tx })
            .await
            .map_err(|_| HubError::Closed)?;
        ack_rx.await.map_err(|_| HubError::Closed)?;

        Ok(Registration {
            id,
            user_address: user_address.to_string(),
            receiver,
            guard: ConnectionGuard::new(id, kind, self.unregister_tx.clone()),
            metrics,
        })
    }

    /// Remove a connection and wait until the registry reflects it
    ///
    /// Idempotent; unknown ids are ignored.
    pub async fn unregister(&self, id: ConnectionId) -> Result<(), HubError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.unregister_tx
            .send(UnregisterRequest {
                id,
                ack: Some(ack_tx),
            })
            .map_err(|_| HubError::Closed)?;
        ack_rx.await.map_err(|_| HubError::Closed)
    }

    pub fn active_connection_count(&self) -> usize {
        self.registry.connection_count()
    }

    pub fn user_connection_count(&self, user_address: &str) -> usize {
        self.registry.user_connection_count(user_address)
    }

    pub fn connected_user_count(&self) -> usize {
        self.registry.user_count()
    }

    pub fn connections(&self) -> Vec<ConnectionInfo> {
        self.registry.connections()
    }

    pub fn metrics(&self) -> Arc<HubMetrics> {
        self.metrics.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.publish_tx.is_closed()
    }
}

// ============================================================================
// EVENT HUB
// ============================================================================

/// Dispatch loop state
pub struct EventHub {
    registry: Arc<ConnectionRegistry>,
    metrics: Arc<HubMetrics>,
    register_rx: mpsc::Receiver<RegisterRequest>,
    unregister_rx: mpsc::UnboundedReceiver<UnregisterRequest>,
    publish_rx: mpsc::Receiver<PushEvent>,
    shutdown: watch::Receiver<bool>,
}

impl EventHub {
    /// Spawn the dispatch loop and return a handle to it
    pub fn spawn(config: &HubConfig, shutdown: watch::Receiver<bool>) -> (HubHandle, JoinHandle<()>) {
        let input_buffer = config.input_buffer.max(1);
        let (register_tx, register_rx) = mpsc::channel(input_buffer);
        let (unregister_tx, unregister_rx) = mpsc::unbounded_channel();
        let (publish_tx, publish_rx) = mpsc::channel(input_buffer);

        let registry = Arc::new(ConnectionRegistry::new());
        let metrics = HubMetrics::new();

        let hub = EventHub {
            registry: registry.clone(),
            metrics: metrics.clone(),
            register_rx,
            unregister_rx,
            publish_rx,
            shutdown,
        };

        let handle = HubHandle {
            register_tx,
            unregister_tx,
            publish_tx,
            registry,
            metrics,
            next_conn_id: Arc::new(AtomicU64::new(1)),
            queue_capacity: config.connection_queue_capacity.max(1),
        };

        (handle, tokio::spawn(hub.run()))
    }

    async fn run(mut self) {
        logger::info(LogTag::Hub, "Dispatch loop started");

        let mut shutdown_open = true;
        if *self.shutdown.borrow() {
            self.close();
            return;
        }

        loop {
            tokio::select! {
                Some(request) = self.register_rx.recv() => {
                    self.handle_register(request);
                }
                Some(request) = self.unregister_rx.recv() => {
                    self.handle_unregister(request);
                }
                event = self.publish_rx.recv() => match event {
                    Some(event) => self.handle_publish(event),
                    None => {
                        logger::debug(LogTag::Hub, "All hub handles dropped");
                        break;
                    }
                },
                changed = self.shutdown.changed(), if shutdown_open => match changed {
                    Ok(()) if *self.shutdown.borrow() => {
                        logger::debug(LogTag::Hub, "Shutdown signal received");
                        break;
                    }
                    Ok(()) => {}
                    Err(_) => shutdown_open = false,
                },
            }
        }

        self.close();
    }

    fn close(&mut self) {
        let cleared = self.registry.clear();
        self.metrics.connections_cleared();
        logger::info(
            LogTag::Hub,
            &format!("Dispatch loop stopped ({} connections closed)", cleared),
        );
    }

    fn handle_register(&mut self, request: RegisterRequest) {
        let slot = request.slot;
        let (id, user, kind) = (slot.id, slot.user_address.clone(), slot.kind);

        self.registry.register(slot);
        self.metrics.connection_opened();

        logger::debug(
            LogTag::Hub,
            &format!(
                "Connection {} ({}) registered for {} (user_connections={}, active={})",
                id,
                kind,
                user,
                self.registry.user_connection_count(&user),
                self.registry.connection_count()
            ),
        );

        // Requester was cancelled before its guard existed: nothing else owns the slot
        if request.ack.send(()).is_err() {
            self.drop_connection(id, "register cancelled");
        }
    }

    /// Remove a slot from both maps; unknown ids are ignored
    fn drop_connection(&mut self, id: ConnectionId, reason: &str) {
        if let Some(slot) = self.registry.unregister(id) {
            self.metrics.connection_closed();
            logger::debug(
                LogTag::Hub,
                &format!(
                    "Connection {} removed for {}: {} (active={})",
                    slot.id,
                    slot.user_address,
                    reason,
                    self.registry.connection_count()
                ),
            );
        }
    }

    fn handle_unregister(&mut self, request: UnregisterRequest) {
        self.drop_connection(request.id, "unregistered");

        if let Some(ack) = request.ack {
            let _ = ack.send(());
        }
    }

    fn handle_publish(&mut self, mut event: PushEvent) {
        self.metrics.event_published();
        event.payload.enrich();

        let targets = self.registry.lookup(&event.user_address);
        if targets.is_empty() {
            self.metrics.no_connection();
            logger::debug(
                LogTag::Hub,
                &format!(
                    "No connections for user {} ({} dropped)",
                    event.user_address,
                    event.kind()
                ),
            );
            return;
        }

        let frame = match codec::encode_event(&event) {
            Ok(frame) => frame,
            Err(e) => {
                self.metrics.encode_failed();
                logger::error(
                    LogTag::Hub,
                    &format!(
                        "Failed to encode {} {}: {}",
                        event.kind(),
                        event.message_id,
                        e
                    ),
                );
                return;
            }
        };

        logger::verbose(LogTag::Hub, &format!("Frame {}: {}", event.message_id, frame));

        let mut sent = 0;
        let mut dropped = 0;

        for slot in &targets {
            match slot.sender.try_send(frame.clone()) {
                Ok(()) => {
                    sent += 1;
                    slot.metrics.inc_enqueued();
                    self.metrics.frame_delivered();
                }
                Err(mpsc::error::TrySendError::Full(_)) => {
                    dropped += 1;
                    slot.metrics.inc_dropped();
                    self.metrics.frame_dropped();
                    logger::warning(
                        LogTag::Hub,
                        &format!(
                            "Queue full, dropped {} for connection {} (user {})",
                            event.kind(),
                            slot.id,
                            slot.user_address
                        ),
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    // Receiver is gone; a guard's unregister may still be queued
                    dropped += 1;
                    self.drop_connection(slot.id, "queue closed before delivery");
                }
            }
        }

        logger::debug(
            LogTag::Hub,
            &format!(
                "Delivered {} {} to {} (sent={}, dropped={}, total={})",
                event.kind(),
                event.message_id,
                event.user_address,
                sent,
                dropped,
                targets.len()
            ),
        );
    }
}
