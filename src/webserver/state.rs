/// Shared application state for the webserver
///
/// Holds the configuration snapshot, the hub handle every transport
/// registers through, and the process shutdown signal.
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::config::Config;
use crate::push::HubHandle;

/// Shared application state passed to all route handlers
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<Config>,

    /// Push hub handle
    pub hub: HubHandle,

    /// Server startup time
    pub startup_time: DateTime<Utc>,

    /// Process shutdown signal; stream connections end when it fires
    pub shutdown: watch::Receiver<bool>,
}

impl AppState {
    pub fn new(config: Config, hub: HubHandle, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            config: Arc::new(config),
            hub,
            startup_time: Utc::now(),
            shutdown,
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        (Utc::now() - self.startup_time).num_seconds().max(0) as u64
    }
}
