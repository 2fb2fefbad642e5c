use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use lifeline_types::events::{Command, RoomCommand};

use crate::GatewayState;
use crate::commands::{SessionContext, dispatch};
use crate::rooms;

/// Heartbeat interval: server sends a Ping every 15 seconds.
/// If 2 consecutive Pongs are missed (~30s), the connection is dropped.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Drive one authenticated socket until either side closes.
///
/// The token was validated at the HTTP upgrade, so the session joins its
/// presence group immediately. Commands are handled one at a time, each to
/// completion, in arrival order.
pub async fn handle_session(socket: WebSocket, state: GatewayState, session: SessionContext) {
    let (session_id, frames) = state.router.join(&session.username).await;
    info!(
        "{} ({}) connected to gateway [session {}]",
        session.username, session.user_id, session_id
    );

    let handler_state = state.clone();
    let handler_session = session.clone();
    pump(socket, frames, move |text| {
        let state = handler_state.clone();
        let session = handler_session.clone();
        async move {
            match serde_json::from_str::<Command>(&text) {
                Ok(cmd) => dispatch(&state, &session, cmd).await,
                Err(e) => {
                    // Unknown sources land here too; they are ignored
                    debug!(
                        "{} sent unhandled frame: {} -- raw: {}",
                        session.username,
                        e,
                        truncate(&text, 200)
                    );
                }
            }
        }
    })
    .await;

    state.router.leave(&session.username, session_id).await;
    info!(
        "{} ({}) disconnected from gateway [session {}]",
        session.username, session.user_id, session_id
    );
}

/// Drive a group chat socket for `group`. The room is fixed when the socket
/// opens; a later profile move needs a reconnect.
pub async fn handle_room_session(
    socket: WebSocket,
    state: GatewayState,
    session: SessionContext,
    group: String,
) {
    let room = match rooms::resolve_room(&state, &session, &group).await {
        Ok(room) => room,
        Err(e) => {
            warn!("{} cannot join group {}: {}", session.username, group, e);
            return;
        }
    };

    let (session_id, events) = state.rooms.join(&room).await;
    info!("{} joined room {} [session {}]", session.username, room, session_id);

    let handler_state = state.clone();
    let handler_session = session.clone();
    let handler_room = room.clone();
    pump(socket, events, move |text| {
        let state = handler_state.clone();
        let session = handler_session.clone();
        let room = handler_room.clone();
        async move {
            match serde_json::from_str::<RoomCommand>(&text) {
                Ok(RoomCommand::SendMessage { message }) => {
                    let reached = rooms::send_group_message(&state, &session, &room, &message).await;
                    debug!("{} -> {} reached {} sessions", session.username, room, reached);
                }
                Err(e) => debug!(
                    "{} sent unhandled room frame: {} -- raw: {}",
                    session.username,
                    e,
                    truncate(&text, 200)
                ),
            }
        }
    })
    .await;

    state.rooms.leave(&room, session_id).await;
    info!("{} left room {} [session {}]", session.username, room, session_id);
}

/// Run the socket: forward `outbound` to the client with a heartbeat, and
/// hand each inbound text frame to `on_text`, awaiting it before reading
/// the next. Returns when either direction stops.
async fn pump<T, H, Fut>(socket: WebSocket, mut outbound: mpsc::UnboundedReceiver<T>, mut on_text: H)
where
    T: Serialize + Send + 'static,
    H: FnMut(String) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    let (mut sender, mut receiver) = socket.split();

    let pong_received = Arc::new(AtomicBool::new(true));
    let pong_flag_send = pong_received.clone();
    let pong_flag_recv = pong_received.clone();

    // Forward routed payloads to the client, with heartbeat
    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        heartbeat.tick().await;
        let mut missed_heartbeats: u8 = 0;

        loop {
            tokio::select! {
                payload = outbound.recv() => {
                    let Some(payload) = payload else { break };
                    let text = match serde_json::to_string(&payload) {
                        Ok(text) => text,
                        Err(e) => {
                            warn!("Failed to encode outbound frame: {}", e);
                            continue;
                        }
                    };
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                _ = heartbeat.tick() => {
                    if pong_flag_send.swap(false, Ordering::Acquire) {
                        missed_heartbeats = 0;
                    } else {
                        missed_heartbeats += 1;
                        if missed_heartbeats >= 2 {
                            warn!("Heartbeat timeout (missed {} pongs), dropping connection", missed_heartbeats);
                            break;
                        }
                    }
                    if sender.send(Message::Ping(vec![].into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Read frames from client
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => on_text(text.as_str().to_owned()).await,
                Message::Pong(_) => {
                    pong_flag_recv.store(true, Ordering::Release);
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
}

/// Cut `text` to at most `max` bytes on a char boundary.
fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
