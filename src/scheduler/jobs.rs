use async_trait::async_trait;

use super::SyncJob;
use crate::logger::{self, LogTag};
use crate::push::HubHandle;

/// Logs a one-line summary of hub traffic on every tick
pub struct HubStatsJob {
    hub: HubHandle,
}

impl HubStatsJob {
    pub fn new(hub: HubHandle) -> Self {
        Self { hub }
    }

    fn summary(&self) -> String {
        let snapshot = self.hub.metrics().snapshot();
        format!(
            "Hub stats: {} connections across {} users, {} events published, {} frames delivered, {} dropped, {} encode failures",
            self.hub.active_connection_count(),
            self.hub.connected_user_count(),
            snapshot.events_published,
            snapshot.frames_delivered,
            snapshot.frames_dropped,
            snapshot.encode_failures
        )
    }
}

#[async_trait]
impl SyncJob for HubStatsJob {
    fn name(&self) -> &'static str {
        "hub_stats"
    }

    async fn run(&self) -> Result<(), String> {
        if self.hub.is_closed() {
            return Err("hub is closed".to_string());
        }
        logger::info(LogTag::Scheduler, &self.summary());
        Ok(())
    }
}
