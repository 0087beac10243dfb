/// Configuration schemas - every section defined once with its defaults
use std::time::Duration;

use crate::config_struct;

// ============================================================================
// WEBSERVER CONFIGURATION
// ============================================================================

config_struct! {
    /// HTTP listener serving the push endpoints
    pub struct WebserverConfig {
        /// Host/IP address to bind (127.0.0.1 = localhost only, 0.0.0.0 = all interfaces)
        host: String = "127.0.0.1".to_string(),

        /// Port to bind
        port: u16 = 8080,

        /// Permissive CORS layer for browser clients on other origins
        enable_cors: bool = true,
    }
}

impl WebserverConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ============================================================================
// HUB CONFIGURATION
// ============================================================================

config_struct! {
    /// Dispatch loop and per-connection queue sizing
    pub struct HubConfig {
        /// Pending publish requests before `publish` waits
        input_buffer: usize = 256,

        /// Outbound frames buffered per connection before drops start
        connection_queue_capacity: usize = 256,
    }
}

// ============================================================================
// TRANSPORT CONFIGURATION
// ============================================================================

config_struct! {
    /// Duplex (WebSocket) liveness settings
    pub struct WebsocketConfig {
        /// Keepalive ping period
        ping_interval_secs: u64 = 54,

        /// Read deadline, extended by every inbound frame
        read_timeout_secs: u64 = 60,

        /// Deadline for a single frame write
        write_timeout_secs: u64 = 10,
    }
}

impl WebsocketConfig {
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }
}

config_struct! {
    /// One-way event stream liveness settings
    pub struct StreamConfig {
        /// Heartbeat frame period
        heartbeat_secs: u64 = 30,

        /// Close the stream after this long without a successful write
        idle_timeout_secs: u64 = 60,
    }
}

impl StreamConfig {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

// ============================================================================
// SCHEDULER CONFIGURATION
// ============================================================================

config_struct! {
    /// Periodic sync job runner
    pub struct SchedulerConfig {
        /// Upper bound for one job invocation
        job_timeout_secs: u64 = 300,
        /// Period of the built-in hub stats job; 0 disables it
        stats_interval_secs: u64 = 300,
    }
}

impl SchedulerConfig {
    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_secs)
    }

    pub fn stats_interval(&self) -> Option<Duration> {
        (self.stats_interval_secs > 0).then(|| Duration::from_secs(self.stats_interval_secs))
    }
}

// ============================================================================
// ROOT CONFIGURATION
// ============================================================================

config_struct! {
    /// Root configuration structure containing all sub-configurations
    pub struct Config {
        webserver: WebserverConfig = WebserverConfig::default(),
        hub: HubConfig = HubConfig::default(),
        websocket: WebsocketConfig = WebsocketConfig::default(),
        stream: StreamConfig = StreamConfig::default(),
        scheduler: SchedulerConfig = SchedulerConfig::default(),
    }
}

impl Config {
    /// Reject settings the runtime cannot honor
    pub fn validate(&self) -> Result<(), String> {
        if self.hub.input_buffer == 0 {
            return Err("hub.input_buffer must be greater than 0".to_string());
        }
        if self.hub.connection_queue_capacity == 0 {
            return Err("hub.connection_queue_capacity must be greater than 0".to_string());
        }
        if self.websocket.ping_interval_secs == 0
            || self.websocket.read_timeout_secs == 0
            || self.websocket.write_timeout_secs == 0
        {
            return Err("websocket intervals must be greater than 0".to_string());
        }
        if self.websocket.ping_interval_secs >= self.websocket.read_timeout_secs {
            return Err(format!(
                "websocket.ping_interval_secs ({}) must be shorter than read_timeout_secs ({})",
                self.websocket.ping_interval_secs, self.websocket.read_timeout_secs
            ));
        }
        if self.stream.heartbeat_secs == 0 || self.stream.idle_timeout_secs == 0 {
            return Err("stream intervals must be greater than 0".to_string());
        }
        if self.stream.heartbeat_secs >= self.stream.idle_timeout_secs {
            return Err(format!(
                "stream.heartbeat_secs ({}) must be shorter than idle_timeout_secs ({})",
                self.stream.heartbeat_secs, self.stream.idle_timeout_secs
            ));
        }
        if self.scheduler.job_timeout_secs == 0 {
            return Err("scheduler.job_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}
