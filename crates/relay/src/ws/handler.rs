// Per-connection protocol handling for the room coordinator.
//
// Each accepted WebSocket runs one task: a join-first handshake, then a
// select loop over the heartbeat timer, the member's outbound queue,
// and inbound frames. Departure cleanup (roster removal plus the
// DISCONNECTED broadcast) runs on every exit path of the loop.

use crate::room::RoomStore;
use crate::ws::protocol as ws_protocol;
use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::Utc;
use coderoom_common::protocol::ws::WsMessage;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

pub(crate) const HEARTBEAT_INTERVAL_MS: u32 = 15_000;
pub(crate) const HEARTBEAT_TIMEOUT_MS: u64 = 10_000;
pub(crate) const MAX_FRAME_BYTES: u32 = 262_144;

pub fn router(room_store: RoomStore) -> Router {
    Router::new().route("/ws", get(ws_upgrade)).with_state(room_store)
}

async fn ws_upgrade(
    State(room_store): State<RoomStore>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.max_frame_size(MAX_FRAME_BYTES as usize)
        .on_upgrade(move |socket| handle_socket(room_store, socket))
}

/// Trim and validate a join request. The room key and display name are
/// both required to be non-empty after trimming.
pub(crate) fn validate_join(room_id: &str, username: &str) -> Result<(String, String), WsMessage> {
    let room_id = room_id.trim();
    let username = username.trim();
    if room_id.is_empty() || username.is_empty() {
        return Err(WsMessage::Error {
            code: "ROOM_JOIN_INVALID".to_string(),
            message: "room id and username must be non-empty".to_string(),
            retryable: false,
        });
    }
    Ok((room_id.to_string(), username.to_string()))
}

fn frame_size_exceeded_reason() -> String {
    format!("websocket frame exceeds maximum size of {MAX_FRAME_BYTES} bytes")
}

fn is_frame_size_violation(error: &axum::Error) -> bool {
    let message = error.to_string().to_ascii_lowercase();
    message.contains("message too long")
        || message.contains("frame too long")
        || message.contains("too large")
        || message.contains("too big")
        || message.contains("size limit")
}

async fn close_frame_too_large(socket: &mut WebSocket) {
    let _ = socket
        .send(Message::Close(Some(CloseFrame {
            code: close_code::SIZE,
            reason: frame_size_exceeded_reason().into(),
        })))
        .await;
}

async fn handle_socket(room_store: RoomStore, mut socket: WebSocket) {
    // Join-first handshake: nothing else is valid on a fresh connection.
    let (room_id, username) = match socket.recv().await {
        Some(Ok(Message::Text(raw_message))) => {
            if raw_message.len() > MAX_FRAME_BYTES as usize {
                close_frame_too_large(&mut socket).await;
                return;
            }

            match ws_protocol::decode_message(&raw_message) {
                Ok(WsMessage::Join { room_id, username }) => {
                    match validate_join(&room_id, &username) {
                        Ok(valid) => valid,
                        Err(error_frame) => {
                            let _ = ws_protocol::send_ws_message(&mut socket, &error_frame).await;
                            let _ = socket.send(Message::Close(None)).await;
                            return;
                        }
                    }
                }
                Ok(_) => {
                    let _ = ws_protocol::send_ws_message(
                        &mut socket,
                        &WsMessage::Error {
                            code: "ROOM_JOIN_REQUIRED".to_string(),
                            message: "first frame on a connection must be join".to_string(),
                            retryable: false,
                        },
                    )
                    .await;
                    let _ = socket.send(Message::Close(None)).await;
                    return;
                }
                Err(_) => {
                    let _ = ws_protocol::send_ws_message(
                        &mut socket,
                        &WsMessage::Error {
                            code: "ROOM_INVALID_MESSAGE".to_string(),
                            message: "invalid websocket frame payload".to_string(),
                            retryable: false,
                        },
                    )
                    .await;
                    let _ = socket.send(Message::Close(None)).await;
                    return;
                }
            }
        }
        Some(Err(error)) if is_frame_size_violation(&error) => {
            close_frame_too_large(&mut socket).await;
            return;
        }
        _ => return,
    };

    // Join acceptance: the assigned connection id travels to the joiner
    // before anything room-scoped does.
    let socket_id = Uuid::new_v4();
    let welcome = WsMessage::Welcome { socket_id, server_time: Utc::now().to_rfc3339() };
    if ws_protocol::send_ws_message(&mut socket, &welcome).await.is_err() {
        return;
    }

    let (outbound_sender, mut outbound_receiver) = mpsc::unbounded_channel::<WsMessage>();
    let roster = room_store.join(&room_id, socket_id, &username, outbound_sender).await;
    info!(
        room_id = %room_id,
        socket_id = %socket_id,
        username = %username,
        members = roster.len(),
        "participant joined"
    );

    // Full roster snapshot to the whole room (joiner included), then the
    // backlog replay addressed to the joiner alone.
    room_store
        .broadcast(
            &room_id,
            WsMessage::Joined { clients: roster, username: username.clone(), socket_id },
        )
        .await;
    let backlog = room_store.history(&room_id).await;
    room_store.send_to(&room_id, socket_id, WsMessage::ChatHistory { messages: backlog }).await;

    // Heartbeat: server pings every HEARTBEAT_INTERVAL_MS, disconnects
    // if no pong arrives within HEARTBEAT_TIMEOUT_MS.
    let mut heartbeat_interval =
        tokio::time::interval(std::time::Duration::from_millis(HEARTBEAT_INTERVAL_MS as u64));
    heartbeat_interval.reset(); // skip immediate first tick
    let mut last_pong = Instant::now();
    let heartbeat_timeout = std::time::Duration::from_millis(HEARTBEAT_TIMEOUT_MS);

    loop {
        tokio::select! {
            _ = heartbeat_interval.tick() => {
                if last_pong.elapsed() > heartbeat_timeout {
                    warn!(
                        room_id = %room_id,
                        socket_id = %socket_id,
                        "heartbeat timeout, disconnecting"
                    );
                    break;
                }
                if socket.send(Message::Ping(vec![].into())).await.is_err() {
                    break;
                }
            }
            maybe_outbound = outbound_receiver.recv() => {
                match maybe_outbound {
                    Some(outbound_message) => {
                        if ws_protocol::send_ws_message(&mut socket, &outbound_message).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            maybe_message = socket.recv() => {
                let Some(message) = maybe_message else {
                    break;
                };

                match message {
                    Ok(Message::Text(raw_message)) => {
                        if raw_message.len() > MAX_FRAME_BYTES as usize {
                            close_frame_too_large(&mut socket).await;
                            break;
                        }

                        let inbound = match ws_protocol::decode_message(&raw_message) {
                            Ok(message) => message,
                            Err(_) => {
                                if ws_protocol::send_ws_message(
                                    &mut socket,
                                    &WsMessage::Error {
                                        code: "ROOM_INVALID_MESSAGE".to_string(),
                                        message: "invalid websocket frame payload".to_string(),
                                        retryable: true,
                                    },
                                )
                                .await
                                .is_err()
                                {
                                    break;
                                }
                                continue;
                            }
                        };

                        match inbound {
                            WsMessage::SendMessage { room_id: target_room, message } => {
                                let content = message.trim();
                                // Blank input and frames for a room this
                                // connection never joined are dropped, not
                                // errored.
                                if content.is_empty() || target_room != room_id {
                                    continue;
                                }
                                if let Some(stored) = room_store
                                    .append_message(&room_id, content, &username, socket_id)
                                    .await
                                {
                                    room_store
                                        .broadcast(
                                            &room_id,
                                            WsMessage::ReceiveMessage {
                                                content: stored.content,
                                                sender: stored.sender,
                                                sender_id: stored.sender_id,
                                                timestamp: stored.timestamp,
                                            },
                                        )
                                        .await;
                                }
                            }
                            WsMessage::SyncCode { code, socket_id: target } => {
                                // Addressed routing; a vanished target is
                                // not an error for the sender.
                                room_store
                                    .send_to(
                                        &room_id,
                                        target,
                                        WsMessage::SyncCode { code, socket_id: target },
                                    )
                                    .await;
                            }
                            _ => {
                                if ws_protocol::send_ws_message(
                                    &mut socket,
                                    &WsMessage::Error {
                                        code: "ROOM_UNSUPPORTED_MESSAGE".to_string(),
                                        message: "frame is not valid after join".to_string(),
                                        retryable: true,
                                    },
                                )
                                .await
                                .is_err()
                                {
                                    break;
                                }
                            }
                        }
                    }
                    Ok(Message::Ping(payload)) => {
                        if socket.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Ok(Message::Pong(_)) => {
                        last_pong = Instant::now();
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(error) => {
                        if is_frame_size_violation(&error) {
                            close_frame_too_large(&mut socket).await;
                        }
                        break;
                    }
                }
            }
        }
    }

    if let Some(departed) = room_store.remove(&room_id, socket_id).await {
        info!(
            room_id = %room_id,
            socket_id = %socket_id,
            username = %departed.username,
            "participant left"
        );
        room_store
            .broadcast(
                &room_id,
                WsMessage::Disconnected { socket_id, username: departed.username },
            )
            .await;
    }
}
