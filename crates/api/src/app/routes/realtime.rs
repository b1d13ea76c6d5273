//! `/ws`: one observer session per WebSocket connection.
//!
//! Server push only. Inbound frames are read to notice close, errors and liveness;
//! their content is ignored. No resumption or replay across reconnects.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        Extension,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep_until};
use tokio_stream::wrappers::ReceiverStream;

use pricewatch_realtime::{ObserverSession, SessionId, SessionReceiver};

use crate::app::services::AppServices;
use crate::config::RealtimeSettings;

pub async fn ws_upgrade(
    ws: WebSocketUpgrade,
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    ws.on_upgrade(move |socket| serve_session(socket, services))
        .into_response()
}

/// Bind a connection to the hub for its whole lifetime.
pub async fn serve_session(socket: WebSocket, services: Arc<AppServices>) {
    let settings = services.realtime.clone();
    let (session, queue) = ObserverSession::channel(settings.session_buffer);
    let id = session.id();

    if let Err(e) = services.hub.register(session) {
        tracing::error!(session = %id, error = %e, "failed to register observer session");
        return;
    }
    tracing::info!(session = %id, sessions = services.hub.session_count(), "observer connected");

    let (sink, mut inbound) = socket.split();
    let (control_tx, control_rx) = mpsc::channel::<Message>(8);
    let mut writer = tokio::spawn(write_loop(id, sink, queue, control_rx, settings.send_timeout));

    let reason = read_loop(&mut inbound, &mut writer, &control_tx, &settings).await;

    // Unregister before anything else so no broadcast targets a closing socket.
    let _ = services.hub.unregister(id);
    writer.abort();

    tracing::info!(
        session = %id,
        reason,
        sessions = services.hub.session_count(),
        "observer disconnected"
    );
}

async fn read_loop(
    inbound: &mut futures_util::stream::SplitStream<WebSocket>,
    writer: &mut tokio::task::JoinHandle<()>,
    control_tx: &mpsc::Sender<Message>,
    settings: &RealtimeSettings,
) -> &'static str {
    let mut ping = interval_at(Instant::now() + settings.ping_interval, settings.ping_interval);
    ping.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_seen = Instant::now();

    loop {
        let idle_deadline = settings.idle_timeout.map(|t| last_seen + t);

        tokio::select! {
            biased;

            _ = &mut *writer => return "writer finished",

            frame = inbound.next() => match frame {
                Some(Ok(Message::Close(_))) | None => return "closed by peer",
                Some(Ok(_)) => last_seen = Instant::now(),
                Some(Err(e)) => {
                    tracing::debug!(error = %e, "websocket read failed");
                    return "read error";
                }
            },

            _ = idle(idle_deadline) => return "idle timeout",

            _ = ping.tick() => {
                if control_tx.try_send(Message::Ping(Vec::new())).is_err() {
                    return "writer gone";
                }
            }
        }
    }
}

async fn idle(deadline: Option<Instant>) {
    match deadline {
        Some(d) => sleep_until(d).await,
        None => std::future::pending().await,
    }
}

/// Drain the session queue (and control frames) into the socket, one bounded write at a
/// time. Ends when a write fails or times out, or when the hub drops the session.
async fn write_loop(
    id: SessionId,
    mut sink: SplitSink<WebSocket, Message>,
    queue: SessionReceiver,
    mut control: mpsc::Receiver<Message>,
    send_timeout: Duration,
) {
    let mut outbound = ReceiverStream::new(queue).map(Message::Text);

    loop {
        let msg = tokio::select! {
            biased;
            msg = outbound.next() => match msg {
                Some(m) => m,
                None => {
                    tracing::debug!(session = %id, "session dropped by hub; closing socket");
                    let _ = tokio::time::timeout(send_timeout, sink.send(Message::Close(None))).await;
                    return;
                }
            },
            Some(msg) = control.recv() => msg,
        };

        match tokio::time::timeout(send_timeout, sink.send(msg)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::debug!(session = %id, error = %e, "websocket write failed");
                return;
            }
            Err(_) => {
                tracing::warn!(session = %id, timeout_ms = send_timeout.as_millis() as u64, "websocket write timed out");
                return;
            }
        }
    }
}
