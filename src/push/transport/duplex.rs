/// WebSocket transport - writer/reader task pair under a supervisor
///
/// - Writer: drains the outbound queue and sends keepalive pings
/// - Reader: liveness only; every inbound frame extends the read deadline
/// - Supervisor: first task to finish wins, the other is aborted, the
///   connection is unregistered
use std::fmt::Display;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{interval_at, timeout, timeout_at, Instant, MissedTickBehavior};

use crate::config::WebsocketConfig;
use crate::errors::TransportError;
use crate::logger::{self, LogTag};
use crate::push::codec::{self, Frame};
use crate::push::connection::{ConnectionId, TransportKind};
use crate::push::health::ConnectionHealth;
use crate::push::hub::{HubHandle, Registration};
use crate::push::metrics::ConnectionMetrics;
use std::sync::Arc;

/// Inbound frames carry no application data; anything larger is a protocol error
pub const MAX_INBOUND_MESSAGE_SIZE: usize = 512;

/// Register an upgraded socket and run it to completion
pub async fn serve_websocket(
    socket: WebSocket,
    hub: HubHandle,
    user_address: String,
    config: WebsocketConfig,
) {
    let registration = match hub.register(&user_address, TransportKind::Duplex).await {
        Ok(registration) => registration,
        Err(e) => {
            logger::warning(
                LogTag::Websocket,
                &format!("Rejecting WebSocket for {}: {}", user_address, e),
            );
            // Best-effort close; the hub is shutting down
            let mut socket = socket;
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
    };

    let (sink, stream) = socket.split();
    run_duplex(sink, stream, registration, config).await;
}

/// Drive a registered duplex connection until it ends
pub async fn run_duplex<W, R, E>(
    mut sink: W,
    stream: R,
    registration: Registration,
    config: WebsocketConfig,
) where
    W: Sink<Message> + Unpin + Send + 'static,
    W::Error: Display + Send,
    R: Stream<Item = Result<Message, E>> + Unpin + Send + 'static,
    E: Display + Send + 'static,
{
    let Registration {
        id,
        user_address,
        receiver,
        mut guard,
        metrics,
    } = registration;

    logger::info(
        LogTag::Websocket,
        &format!("Connection {} opened for {}", id, user_address),
    );

    match codec::welcome_frame(&user_address, id) {
        Ok(frame) => {
            if let Err(e) = send_frame(&mut sink, text(&frame), config.write_timeout()).await {
                logger::warning(
                    LogTag::Websocket,
                    &format!("Connection {}: welcome frame failed: {}", id, e),
                );
                guard.close("welcome write failed");
                return;
            }
            metrics.inc_written();
        }
        Err(e) => logger::error(
            LogTag::Websocket,
            &format!("Connection {}: failed to encode welcome frame: {}", id, e),
        ),
    }

    let mut writer = tokio::spawn(write_loop(sink, receiver, metrics.clone(), config.clone(), id));
    let mut reader = tokio::spawn(read_loop(stream, config.read_timeout(), id));

    let (role, outcome) = tokio::select! {
        res = &mut writer => {
            reader.abort();
            ("writer", res)
        }
        res = &mut reader => {
            writer.abort();
            ("reader", res)
        }
    };

    let reason = match outcome {
        Ok(Ok(())) => format!("{} finished", role),
        Ok(Err(e)) => {
            match e {
                TransportError::Closed => logger::debug(
                    LogTag::Websocket,
                    &format!("Connection {}: peer went away", id),
                ),
                ref other => logger::warning(
                    LogTag::Websocket,
                    &format!("Connection {}: {} ended: {}", id, role, other),
                ),
            }
            e.to_string()
        }
        Err(join_err) => {
            if join_err.is_panic() {
                logger::error(
                    LogTag::Websocket,
                    &format!("Connection {}: {} task panicked", id, role),
                );
            }
            format!("{} task aborted", role)
        }
    };

    guard.close(&reason);

    let snapshot = metrics.snapshot();
    logger::info(
        LogTag::Websocket,
        &format!(
            "Connection {} closed for {} ({}; written={}, dropped={}, pings={})",
            id,
            user_address,
            reason,
            snapshot.frames_written,
            snapshot.frames_dropped,
            snapshot.heartbeats_written
        ),
    );
}

fn text(frame: &Frame) -> Message {
    Message::Text(frame.to_string())
}

/// Send one message under the write deadline
async fn send_frame<W>(sink: &mut W, message: Message, limit: Duration) -> Result<(), TransportError>
where
    W: Sink<Message> + Unpin,
    W::Error: Display,
{
    match timeout(limit, sink.send(message)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(TransportError::Send(e.to_string())),
        Err(_) => Err(TransportError::Send(format!(
            "write timed out after {}s",
            limit.as_secs()
        ))),
    }
}

async fn write_loop<W>(
    mut sink: W,
    mut queue: mpsc::Receiver<Frame>,
    metrics: Arc<ConnectionMetrics>,
    config: WebsocketConfig,
    id: ConnectionId,
) -> Result<(), TransportError>
where
    W: Sink<Message> + Unpin,
    W::Error: Display,
{
    let write_timeout = config.write_timeout();
    let period = config.ping_interval();
    let mut ping = interval_at(Instant::now() + period, period);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            frame = queue.recv() => match frame {
                Some(frame) => {
                    send_frame(&mut sink, text(&frame), write_timeout).await?;
                    metrics.inc_written();
                }
                None => {
                    // Unregistered: the hub dropped our sender
                    let _ = send_frame(&mut sink, Message::Close(None), write_timeout).await;
                    return Ok(());
                }
            },
            _ = ping.tick() => {
                send_frame(&mut sink, Message::Ping(Vec::new()), write_timeout).await?;
                metrics.inc_heartbeat();
                logger::debug(LogTag::Websocket, &format!("Connection {}: ping sent", id));
            }
        }
    }
}

async fn read_loop<R, E>(
    mut stream: R,
    read_timeout: Duration,
    id: ConnectionId,
) -> Result<(), TransportError>
where
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let mut health = ConnectionHealth::new(read_timeout);

    loop {
        let next = match timeout_at(health.deadline(), stream.next()).await {
            Ok(next) => next,
            Err(_) => {
                return Err(TransportError::ReadTimeout {
                    secs: health.timeout_secs(),
                })
            }
        };

        match next {
            Some(Ok(Message::Close(_))) => {
                logger::debug(LogTag::Websocket, &format!("Connection {}: close frame received", id));
                return Ok(());
            }
            Some(Ok(message)) => {
                health.record_activity();
                if matches!(message, Message::Text(_) | Message::Binary(_)) {
                    logger::debug(
                        LogTag::Websocket,
                        &format!("Connection {}: discarded inbound payload", id),
                    );
                }
            }
            Some(Err(e)) => return Err(TransportError::Receive(e.to_string())),
            None => return Err(TransportError::Closed),
        }
    }
}
