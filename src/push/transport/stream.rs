/// Server-sent event transport - one task per connection
///
/// The task multiplexes:
/// - outbound queue frames, written as `data: <json>\n\n`
/// - heartbeat frames on a fixed period
/// - an idle deadline reset by every successful write
/// - client disconnect (response body dropped) and server shutdown
///
/// Writes go into a capacity-1 body channel, so a client that stops reading
/// leaves the write pending; a write still pending at the idle deadline
/// closes the connection.
use std::convert::Infallible;

use axum::body::{Body, Bytes};
use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, sleep_until, timeout_at, Instant, MissedTickBehavior};

use crate::config::StreamConfig;
use crate::errors::TransportError;
use crate::logger::{self, LogTag};
use crate::push::codec::{self, Frame};
use crate::push::health::ConnectionHealth;
use crate::push::hub::Registration;

/// Response body fed by a connection task
pub fn open_event_stream() -> (mpsc::Sender<Bytes>, Body) {
    let (body_tx, body_rx) = mpsc::channel::<Bytes>(1);
    let stream = futures::stream::unfold(body_rx, |mut rx| async move {
        rx.recv().await.map(|chunk| (Ok::<_, Infallible>(chunk), rx))
    });
    (body_tx, Body::from_stream(stream))
}

/// Drive a registered stream connection until it ends
pub async fn run_stream(
    body: mpsc::Sender<Bytes>,
    registration: Registration,
    config: StreamConfig,
    mut shutdown: watch::Receiver<bool>,
) {
    let Registration {
        id,
        user_address,
        mut receiver,
        mut guard,
        metrics,
    } = registration;

    logger::info(
        LogTag::Stream,
        &format!("Stream {} opened for {}", id, user_address),
    );

    let mut health = ConnectionHealth::new(config.idle_timeout());
    let period = config.heartbeat_interval();
    let mut heartbeat = interval_at(Instant::now() + period, period);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut shutdown_open = true;

    let outcome: Result<&'static str, TransportError> = 'conn: {
        match codec::welcome_frame(&user_address, id) {
            Ok(frame) => {
                if let Err(e) = write(&body, &frame, &mut health, &mut shutdown).await {
                    break 'conn Err(e);
                }
                metrics.inc_written();
            }
            Err(e) => logger::error(
                LogTag::Stream,
                &format!("Stream {}: failed to encode welcome frame: {}", id, e),
            ),
        }

        loop {
            tokio::select! {
                _ = body.closed() => break 'conn Ok("client disconnected"),
                changed = shutdown.changed(), if shutdown_open => match changed {
                    Ok(()) if *shutdown.borrow() => break 'conn Ok("server shutdown"),
                    Ok(()) => {}
                    Err(_) => shutdown_open = false,
                },
                frame = receiver.recv() => match frame {
                    Some(frame) => {
                        if let Err(e) = write(&body, &frame, &mut health, &mut shutdown).await {
                            break 'conn Err(e);
                        }
                        metrics.inc_written();
                    }
                    None => break 'conn Ok("unregistered"),
                },
                _ = heartbeat.tick() => {
                    let frame = codec::heartbeat_frame(Utc::now());
                    if let Err(e) = write(&body, &frame, &mut health, &mut shutdown).await {
                        break 'conn Err(e);
                    }
                    metrics.inc_heartbeat();
                    logger::debug(LogTag::Stream, &format!("Stream {}: heartbeat sent", id));
                }
                _ = sleep_until(health.deadline()) => {
                    break 'conn Err(TransportError::IdleTimeout { secs: health.timeout_secs() });
                }
            }
        }
    };

    let reason = match outcome {
        Ok(reason) => reason.to_string(),
        Err(TransportError::Shutdown) => "server shutdown".to_string(),
        Err(e) => {
            logger::warning(LogTag::Stream, &format!("Stream {}: {}", id, e));
            e.to_string()
        }
    };

    guard.close(&reason);

    let snapshot = metrics.snapshot();
    logger::info(
        LogTag::Stream,
        &format!(
            "Stream {} closed for {} ({}; written={}, dropped={}, heartbeats={})",
            id,
            user_address,
            reason,
            snapshot.frames_written,
            snapshot.frames_dropped,
            snapshot.heartbeats_written
        ),
    );
}

/// Single write path: success resets the idle deadline, a write still
/// pending at the deadline fails, shutdown abandons a pending write
async fn write(
    body: &mpsc::Sender<Bytes>,
    frame: &Frame,
    health: &mut ConnectionHealth,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<(), TransportError> {
    let chunk = Bytes::from(codec::sse_frame(frame));
    let result = tokio::select! {
        result = timeout_at(health.deadline(), body.send(chunk)) => result,
        _ = shutdown_requested(shutdown) => return Err(TransportError::Shutdown),
    };

    match result {
        Ok(Ok(())) => {
            health.record_activity();
            Ok(())
        }
        Ok(Err(_)) => Err(TransportError::Closed),
        Err(_) => Err(TransportError::IdleTimeout {
            secs: health.timeout_secs(),
        }),
    }
}

/// Resolves once shutdown is signalled; never if the signal is gone
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    if shutdown.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::push::connection::TransportKind;
    use crate::push::hub::HubHandle;
    use crate::push::message::{EventPayload, PushEvent, StatusSyncData};
    use crate::push::testing::{spawn_test_hub, wait_until};
    use serde_json::Value;
    use std::time::Duration;
    use tokio::task::JoinHandle;
    use tokio::time::sleep;

    async fn open(
        hub: &HubHandle,
        body_capacity: usize,
    ) -> (mpsc::Receiver<Bytes>, watch::Sender<bool>, JoinHandle<()>) {
        let registration = hub.register("alice", TransportKind::Stream).await.unwrap();
        let (body_tx, body_rx) = mpsc::channel(body_capacity);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run_stream(
            body_tx,
            registration,
            StreamConfig::default(),
            shutdown_rx,
        ));
        (body_rx, shutdown_tx, task)
    }

    fn parse_chunk(chunk: &Bytes) -> Value {
        let text = std::str::from_utf8(chunk).unwrap();
        assert!(text.starts_with("data: "));
        assert!(text.ends_with("\n\n"));
        serde_json::from_str(&text["data: ".len()..text.len() - 2]).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_frames_are_sse_framed() {
        let (hub, _join, _shutdown) = spawn_test_hub(8);
        let (mut body, _stop, _task) = open(&hub, 1).await;

        let welcome = parse_chunk(&body.recv().await.unwrap());
        assert_eq!(welcome["type"], "connection_established");

        hub.publish(PushEvent::new(
            "alice",
            EventPayload::StatusSync(StatusSyncData {
                checkbooks: Vec::new(),
                checks: Vec::new(),
                sync_time: "now".into(),
            }),
        ))
        .await
        .unwrap();

        let frame = parse_chunk(&body.recv().await.unwrap());
        assert_eq!(frame["type"], "status_sync");
        assert_eq!(frame["user_address"], "alice");
    }

    #[tokio::test(start_paused = true)]
    async fn test_draining_client_stays_open_on_heartbeats() {
        let (hub, _join, _shutdown) = spawn_test_hub(8);
        let (mut body, _stop, _task) = open(&hub, 1).await;

        let reader = tokio::spawn(async move {
            let mut heartbeats = 0u32;
            while let Some(chunk) = body.recv().await {
                if parse_chunk(&chunk)["type"] == "heartbeat" {
                    heartbeats += 1;
                }
            }
            heartbeats
        });

        sleep(Duration::from_secs(600)).await;
        assert_eq!(hub.active_connection_count(), 1);
        assert!(!reader.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_client_closed_at_idle_deadline() {
        let (hub, _join, _shutdown) = spawn_test_hub(8);
        // Body never read: the welcome fills the slot, the first heartbeat stalls
        let (_body, _stop, task) = open(&hub, 1).await;

        sleep(Duration::from_secs(59)).await;
        assert_eq!(hub.active_connection_count(), 1);

        sleep(Duration::from_secs(2)).await;
        task.await.unwrap();
        wait_until(|| hub.active_connection_count() == 0).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_disconnect_unregisters_promptly() {
        let (hub, _join, _shutdown) = spawn_test_hub(8);
        let (body, _stop, task) = open(&hub, 1).await;

        drop(body);
        task.await.unwrap();
        wait_until(|| hub.active_connection_count() == 0).await;
        assert!(hub.metrics().snapshot().total_connections == 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_signal_ends_stream() {
        let (hub, _join, _shutdown) = spawn_test_hub(8);
        let (mut body, stop, task) = open(&hub, 4).await;

        stop.send(true).unwrap();
        task.await.unwrap();

        // Welcome, then end of body
        assert!(body.recv().await.is_some());
        assert!(body.recv().await.is_none());
        wait_until(|| hub.active_connection_count() == 0).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_interrupts_stalled_write() {
        let (hub, _join, _shutdown) = spawn_test_hub(8);
        // Body never read: the first heartbeat write is left pending
        let (_body, stop, task) = open(&hub, 1).await;

        sleep(Duration::from_secs(35)).await;
        assert!(!task.is_finished());

        let signalled_at = Instant::now();
        stop.send(true).unwrap();
        task.await.unwrap();

        assert!(signalled_at.elapsed() < Duration::from_secs(1));
        wait_until(|| hub.active_connection_count() == 0).await;
    }
}
