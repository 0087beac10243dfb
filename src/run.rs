// Process lifecycle: config, hub, scheduler, webserver, shutdown

use std::sync::Arc;
use std::time::Duration;

use crate::{
    config::{self, Config},
    logger::{self, LogTag},
    push::EventHub,
    scheduler::{HubStatsJob, Scheduler},
    shutdown::{install_shutdown_handler, ShutdownTrigger},
    webserver::{self, AppState},
};

/// Grace period for the dispatch loop after the shutdown signal
const HUB_STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Main execution function - runs until Ctrl+C or a fatal webserver error
pub async fn run_server() -> Result<(), String> {
    // 1. Load configuration
    let config = config::load_config().map_err(|e| format!("Failed to load config: {}", e))?;
    log_startup_config(&config);

    // 2. Shutdown signal
    let (trigger, shutdown) = ShutdownTrigger::new();
    install_shutdown_handler(trigger.clone())?;

    // 3. Dispatch loop
    let (hub, hub_task) = EventHub::spawn(&config.hub, shutdown.clone());
    logger::info(LogTag::System, "Event hub started");

    // 4. Scheduler
    let mut scheduler = Scheduler::new(&config.scheduler);
    if let Some(every) = config.scheduler.stats_interval() {
        scheduler
            .register(Arc::new(HubStatsJob::new(hub.clone())), every)
            .map_err(|e| format!("Failed to register hub stats job: {}", e))?;
    }
    scheduler
        .start()
        .map_err(|e| format!("Failed to start scheduler: {}", e))?;

    // 5. Webserver (blocks until shutdown)
    let state = Arc::new(AppState::new(config, hub, shutdown));
    let served = webserver::start_server(state).await;

    // 6. Stop everything else, whichever way the server ended
    trigger.trigger("webserver stopped");

    if let Err(e) = scheduler.stop().await {
        logger::warning(LogTag::System, &format!("Scheduler stop: {}", e));
    }

    match tokio::time::timeout(HUB_STOP_TIMEOUT, hub_task).await {
        Ok(Ok(())) => logger::debug(LogTag::System, "Event hub stopped"),
        Ok(Err(e)) => logger::error(LogTag::System, &format!("Event hub task failed: {}", e)),
        Err(_) => logger::warning(
            LogTag::System,
            &format!(
                "Event hub did not stop within {}s",
                HUB_STOP_TIMEOUT.as_secs()
            ),
        ),
    }

    served
}

fn log_startup_config(config: &Config) {
    let addr = config.webserver.bind_address();
    logger::info(LogTag::System, &format!("Configuration loaded (bind {})", addr));

    if config.webserver.host == "0.0.0.0" {
        logger::warning(
            LogTag::System,
            "Binding to 0.0.0.0 allows remote access - ensure firewall is configured",
        );
    }

    logger::debug(
        LogTag::Config,
        &format!(
            "Hub: input_buffer={}, queue_capacity={}; WebSocket: ping={}s, read_timeout={}s; Stream: heartbeat={}s, idle_timeout={}s",
            config.hub.input_buffer,
            config.hub.connection_queue_capacity,
            config.websocket.ping_interval_secs,
            config.websocket.read_timeout_secs,
            config.stream.heartbeat_secs,
            config.stream.idle_timeout_secs
        ),
    );
}
