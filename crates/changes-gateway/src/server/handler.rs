//! Events socket handler
//!
//! Upgrades `/changes/events`, binds the socket to the client's session and
//! pumps change messages, heartbeats and subscription commands.

use crate::connection::Session;
use crate::protocol::{CommandRequest, ServerFrame};
use crate::server::GatewayState;
use crate::transport::{OutboundQueue, WsTransport};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use changes_core::ChangeMessage;
use futures_util::{Sink, SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use uuid::Uuid;

/// Query string of the events endpoint
#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub id: Option<String>,
}

/// WebSocket events handler
pub async fn events_handler(
    State(state): State<GatewayState>,
    Query(query): Query<EventsQuery>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let connection_id = query
        .id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    ws.on_upgrade(move |socket| handle_socket(state, socket, connection_id))
}

/// Handle an upgraded events socket
async fn handle_socket(state: GatewayState, socket: WebSocket, connection_id: String) {
    let (mut ws_sink, mut ws_stream) = socket.split();

    // The id has to reach the client before any change message.
    let connected = match ServerFrame::connected(&connection_id).to_json() {
        Ok(json) => json,
        Err(e) => {
            tracing::error!(connection_id = %connection_id, error = %e, "Failed to encode Connected frame");
            return;
        }
    };
    if ws_sink.send(Message::Text(connected)).await.is_err() {
        tracing::warn!(connection_id = %connection_id, "Failed to send Connected frame");
        return;
    }

    let (transport, mut outbound) =
        WsTransport::channel(connection_id.clone(), state.config().outbound_buffer);
    let session = state.registry().register(&connection_id, transport.clone());

    tracing::info!(connection_id = %connection_id, "Events socket connected");

    // Writer: queued change messages plus periodic heartbeats
    let heartbeat = state.config().heartbeat_interval();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let connection_id_send = connection_id.clone();
    let mut send_task = tokio::spawn(async move {
        let unsent = write_frames(&mut ws_sink, &mut outbound, heartbeat, stop_rx).await;
        if unsent.is_some() {
            tracing::warn!(
                connection_id = %connection_id_send,
                "Failed to write to events socket"
            );
        }
        let _ = ws_sink.close().await;
        (outbound, unsent)
    });

    // Reader: subscription commands
    let connection_id_recv = connection_id.clone();
    let session_recv = Arc::clone(&session);
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = ws_stream.next().await {
            match msg {
                Ok(Message::Text(text)) => handle_command(&session_recv, &text),
                Ok(Message::Binary(_)) => {
                    tracing::debug!(
                        connection_id = %connection_id_recv,
                        "Binary frames are not supported"
                    );
                }
                Ok(Message::Ping(_) | Message::Pong(_)) => {
                    // Pong is handled automatically by axum
                }
                Ok(Message::Close(_)) => {
                    tracing::debug!(connection_id = %connection_id_recv, "Client closed events socket");
                    break;
                }
                Err(e) => {
                    tracing::warn!(
                        connection_id = %connection_id_recv,
                        error = %e,
                        "Events socket error"
                    );
                    break;
                }
            }
        }
    });

    // Never abort the writer: its queue is recovered below.
    let writer = tokio::select! {
        result = &mut send_task => {
            recv_task.abort();
            result
        }
        _ = &mut recv_task => {
            let _ = stop_tx.send(());
            send_task.await
        }
    };

    match writer {
        Ok((outbound, unsent)) => return_undelivered(&session, outbound, unsent),
        Err(e) => {
            tracing::error!(connection_id = %connection_id, error = %e, "Events writer task failed");
        }
    }

    transport.mark_disconnected();
    tracing::info!(connection_id = %connection_id, "Events socket disconnected");
}

/// Write queued change messages and heartbeats until told to stop
///
/// Returns the message whose write failed, if any. Messages still in
/// `outbound` are left for the caller.
async fn write_frames<S>(
    sink: &mut S,
    outbound: &mut OutboundQueue,
    heartbeat: Duration,
    mut stop: oneshot::Receiver<()>,
) -> Option<ChangeMessage>
where
    S: Sink<Message> + Unpin,
{
    let mut ticker = interval_at(Instant::now() + heartbeat, heartbeat);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let (frame, message) = tokio::select! {
            queued = outbound.recv() => {
                let Some(message) = queued else { return None };
                match message.to_json() {
                    Ok(json) => (json, Some(message)),
                    Err(e) => {
                        tracing::error!(message = %message, error = %e, "Dropping unencodable message");
                        continue;
                    }
                }
            }
            _ = ticker.tick() => match ServerFrame::Heartbeat.to_json() {
                Ok(json) => (json, None),
                Err(_) => continue,
            },
            _ = &mut stop => return None,
        };

        if sink.send(Message::Text(frame)).await.is_err() {
            return message;
        }
    }
}

/// Put everything the writer never got onto the socket back into the session
fn return_undelivered(session: &Session, outbound: OutboundQueue, unsent: Option<ChangeMessage>) {
    let mut undelivered: Vec<ChangeMessage> = unsent.into_iter().collect();
    undelivered.extend(outbound.close_and_drain());
    session.requeue(undelivered);
}

/// Apply a subscription command received on the socket
fn handle_command(session: &Arc<Session>, text: &str) {
    let command = serde_json::from_str::<CommandRequest>(text)
        .map_err(|e| e.to_string())
        .and_then(|request| request.parse().map_err(|e| e.to_string()));

    match command {
        Ok(command) => command.apply(session),
        Err(error) => {
            tracing::warn!(
                connection_id = %session.id(),
                error = %error,
                "Ignoring invalid command frame"
            );
        }
    }
}
