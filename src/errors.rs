/// Error types for the push hub, its transports and the sync scheduler
use thiserror::Error;

/// Failures surfaced to event producers
#[derive(Error, Debug)]
pub enum HubError {
    #[error("Event hub is closed")] Closed,

    #[error("Event hub input buffer is full")] Busy,

    #[error("Failed to encode event: {0}")] Encode(#[from] serde_json::Error),
}

/// Terminal conditions of a single client connection
///
/// These never leave the connection's own task; they are logged and the
/// connection is torn down.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Send failed: {0}")] Send(String),

    #[error("Connection closed by peer")] Closed,

    #[error("No successful write for {secs} seconds")] IdleTimeout {
        secs: u64,
    },

    #[error("No frame received for {secs} seconds")] ReadTimeout {
        secs: u64,
    },

    #[error("Receive failed: {0}")] Receive(String),

    #[error("Server shutting down")] Shutdown,
}

/// Scheduler lifecycle misuse
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("Scheduler already started")] AlreadyStarted,

    #[error("Scheduler not started")] NotStarted,
}
