/// Push delivery metrics
///
/// Lock-free counters shared between the dispatch loop and connection tasks.
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use serde::Serialize;

// ============================================================================
// CONNECTION METRICS
// ============================================================================

/// Per-connection counters (thread-safe)
#[derive(Debug, Default)]
pub struct ConnectionMetrics {
    /// Frames accepted into the outbound queue
    frames_enqueued: AtomicU64,

    /// Frames dropped because the outbound queue was full
    frames_dropped: AtomicU64,

    /// Frames written to the transport
    frames_written: AtomicU64,

    /// Heartbeats / pings written to the transport
    heartbeats_written: AtomicU64,
}

impl ConnectionMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_enqueued(&self) {
        self.frames_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_written(&self) {
        self.frames_written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_heartbeat(&self) {
        self.heartbeats_written.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot for API
    pub fn snapshot(&self) -> ConnectionMetricsSnapshot {
        ConnectionMetricsSnapshot {
            frames_enqueued: self.frames_enqueued.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            frames_written: self.frames_written.load(Ordering::Relaxed),
            heartbeats_written: self.heartbeats_written.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot (serializable)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionMetricsSnapshot {
    pub frames_enqueued: u64,
    pub frames_dropped: u64,
    pub frames_written: u64,
    pub heartbeats_written: u64,
}

// ============================================================================
// HUB METRICS
// ============================================================================

/// Hub-level metrics (aggregate across all connections)
#[derive(Debug, Default)]
pub struct HubMetrics {
    /// Connections ever registered
    total_connections: AtomicU64,

    /// Currently registered connections
    active_connections: AtomicUsize,

    /// Publish requests processed by the dispatch loop
    events_published: AtomicU64,

    /// Frames accepted into connection queues
    frames_delivered: AtomicU64,

    /// Frames dropped on full connection queues
    frames_dropped: AtomicU64,

    /// Events that failed to serialize
    encode_failures: AtomicU64,

    /// Events addressed to users with no connection
    publishes_without_connection: AtomicU64,
}

impl HubMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn connection_opened(&self) {
        self.total_connections.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        let _ = self
            .active_connections
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    /// Registry cleared at shutdown
    pub fn connections_cleared(&self) {
        self.active_connections.store(0, Ordering::Relaxed);
    }

    pub fn event_published(&self) {
        self.events_published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frame_delivered(&self) {
        self.frames_delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frame_dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn encode_failed(&self) {
        self.encode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn no_connection(&self) {
        self.publishes_without_connection
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> HubMetricsSnapshot {
        HubMetricsSnapshot {
            total_connections: self.total_connections.load(Ordering::Relaxed),
            active_connections: self.active_connections.load(Ordering::Relaxed),
            events_published: self.events_published.load(Ordering::Relaxed),
            frames_delivered: self.frames_delivered.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            encode_failures: self.encode_failures.load(Ordering::Relaxed),
            publishes_without_connection: self
                .publishes_without_connection
                .load(Ordering::Relaxed),
        }
    }
}

/// Hub metrics snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HubMetricsSnapshot {
    pub total_connections: u64,
    pub active_connections: usize,
    pub events_published: u64,
    pub frames_delivered: u64,
    pub frames_dropped: u64,
    pub encode_failures: u64,
    pub publishes_without_connection: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_metrics() {
        let metrics = ConnectionMetrics::new();

        metrics.inc_enqueued();
        metrics.inc_enqueued();
        metrics.inc_dropped();
        metrics.inc_written();
        metrics.inc_heartbeat();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.frames_enqueued, 2);
        assert_eq!(snapshot.frames_dropped, 1);
        assert_eq!(snapshot.frames_written, 1);
        assert_eq!(snapshot.heartbeats_written, 1);
    }

    #[test]
    fn test_hub_metrics() {
        let metrics = HubMetrics::new();

        metrics.connection_opened();
        metrics.connection_opened();
        metrics.event_published();
        metrics.frame_delivered();
        metrics.frame_dropped();
        metrics.no_connection();
        metrics.connection_closed();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_connections, 2);
        assert_eq!(snapshot.active_connections, 1);
        assert_eq!(snapshot.events_published, 1);
        assert_eq!(snapshot.frames_delivered, 1);
        assert_eq!(snapshot.frames_dropped, 1);
        assert_eq!(snapshot.publishes_without_connection, 1);
    }

    #[test]
    fn test_active_connections_never_underflow() {
        let metrics = HubMetrics::new();
        metrics.connection_closed();
        assert_eq!(metrics.snapshot().active_connections, 0);
    }
}
