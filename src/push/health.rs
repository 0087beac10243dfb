/// Connection liveness tracking
///
/// One tracker per deadline: the stream transport resets it on every
/// successful write, the duplex reader on every inbound frame.
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct ConnectionHealth {
    /// Last write (stream) or last inbound frame (duplex)
    last_activity: Instant,

    timeout: Duration,
}

impl ConnectionHealth {
    pub fn new(timeout: Duration) -> Self {
        Self {
            last_activity: Instant::now(),
            timeout,
        }
    }

    pub fn record_activity(&mut self) {
        self.last_activity = Instant::now();
    }

    /// Instant at which the connection is presumed dead
    pub fn deadline(&self) -> Instant {
        self.last_activity + self.timeout
    }

    #[cfg(test)]
    pub fn idle_for(&self) -> Duration {
        self.last_activity.elapsed()
    }

    #[cfg(test)]
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline()
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout.as_secs()
    }
}
