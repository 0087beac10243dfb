/// Process shutdown signal
///
/// One `watch` channel is shared by the webserver, the hub and the scheduler.
/// Ctrl+C flips it to `true`; a second Ctrl+C exits immediately.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

use crate::logger::{self, LogTag};

static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Sender side of the shutdown signal
#[derive(Clone)]
pub struct ShutdownTrigger {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownTrigger {
    pub fn new() -> (Self, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        (Self { tx: Arc::new(tx) }, rx)
    }

    /// Flip the signal; repeated calls are no-ops
    pub fn trigger(&self, reason: &str) {
        if *self.tx.borrow() {
            return;
        }
        logger::info(
            LogTag::System,
            &format!("Initiating graceful shutdown ({})", reason),
        );
        // Nobody listening means everything already stopped
        let _ = self.tx.send(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// Install the Ctrl+C handler for graceful shutdown
pub fn install_shutdown_handler(trigger: ShutdownTrigger) -> Result<(), String> {
    ctrlc::set_handler(move || {
        if SHUTDOWN_REQUESTED.swap(true, Ordering::SeqCst) {
            logger::warning(LogTag::System, "Second Ctrl+C received, exiting immediately");
            std::process::exit(1);
        }
        trigger.trigger("Ctrl+C");
    })
    .map_err(|e| format!("Failed to install Ctrl+C handler: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_reaches_every_subscriber() {
        let (trigger, mut first) = ShutdownTrigger::new();
        let mut second = trigger.subscribe();
        assert!(!trigger.is_triggered());

        trigger.clone().trigger("test");
        trigger.trigger("test again");

        first.changed().await.unwrap();
        second.changed().await.unwrap();
        assert!(*first.borrow());
        assert!(*second.borrow());
        assert!(trigger.is_triggered());
    }
}
