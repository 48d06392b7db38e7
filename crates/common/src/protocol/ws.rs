// WebSocket message types for the coderoom room protocol.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{ChatMessage, Participant};

/// All message types exchanged over a room session.
///
/// Frames are JSON text messages tagged by `type`. Ordering is
/// guaranteed per connection in arrival order; nothing is guaranteed
/// across distinct message types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    /// Client -> Relay: request to enter a room. Must be the first
    /// frame on a connection.
    Join { room_id: String, username: String },

    /// Relay -> Client (addressed): join acceptance carrying the
    /// connection id assigned to this session.
    Welcome { socket_id: Uuid, server_time: String },

    /// Relay -> Clients: full roster broadcast to every member of the
    /// room, including the participant that just joined. Always a
    /// complete snapshot, never a delta.
    Joined { clients: Vec<Participant>, username: String, socket_id: Uuid },

    /// Client -> Client (addressed, relayed): document snapshot sent to
    /// a specific newly joined peer. `socket_id` names the addressee.
    SyncCode { code: String, socket_id: Uuid },

    /// Relay -> Clients: one participant departed.
    Disconnected { socket_id: Uuid, username: String },

    /// Client -> Relay: outbound chat message.
    SendMessage { room_id: String, message: String },

    /// Relay -> Clients: broadcast chat message, stamped with the
    /// sender's identity and the canonical instant.
    ReceiveMessage {
        content: String,
        sender: String,
        sender_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// Relay -> Client (addressed, on join): backlog replay.
    ChatHistory { messages: Vec<ChatMessage> },

    /// Relay -> Client: protocol error.
    Error { code: String, message: String, retryable: bool },
}

pub fn decode_message(raw: &str) -> Result<WsMessage, serde_json::Error> {
    serde_json::from_str::<WsMessage>(raw)
}

pub fn encode_message(message: &WsMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(message)
}
