// Room state: the authoritative roster and chat history per room.
//
// The relay is the single owner of "who is in the room" and "what has
// been said". Clients hold disposable read-through caches rebuilt from
// the snapshots broadcast here.

use chrono::Utc;
use coderoom_common::protocol::ws::WsMessage;
use coderoom_common::types::{ChatMessage, Participant};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

/// Upper bound on retained chat history per room. Oldest entries are
/// dropped first; replay to late joiners is verbatim within the cap.
pub(crate) const MAX_HISTORY_MESSAGES: usize = 500;

/// All rooms known to this relay, keyed by the externally supplied room
/// key. A room exists while it has at least one member; the last leave
/// discards it, history included.
#[derive(Debug, Clone, Default)]
pub struct RoomStore {
    rooms: Arc<RwLock<HashMap<String, RoomState>>>,
}

#[derive(Debug, Default)]
struct RoomState {
    members: Vec<MemberRecord>,
    history: Vec<ChatMessage>,
}

#[derive(Debug)]
struct MemberRecord {
    socket_id: Uuid,
    username: String,
    outbound: mpsc::UnboundedSender<WsMessage>,
}

impl MemberRecord {
    fn participant(&self) -> Participant {
        Participant { socket_id: self.socket_id, username: self.username.clone() }
    }
}

impl RoomStore {
    /// Register a member and return the full roster snapshot after the
    /// insert, in join order.
    pub async fn join(
        &self,
        room_id: &str,
        socket_id: Uuid,
        username: &str,
        outbound: mpsc::UnboundedSender<WsMessage>,
    ) -> Vec<Participant> {
        let mut guard = self.rooms.write().await;
        let room = guard.entry(room_id.to_string()).or_default();
        room.members.push(MemberRecord {
            socket_id,
            username: username.to_string(),
            outbound,
        });
        room.members.iter().map(MemberRecord::participant).collect()
    }

    /// Remove exactly one member matching `socket_id`. No-op when the
    /// member (or the room) is absent, so duplicate or late disconnect
    /// notices are harmless. An emptied room is pruned.
    pub async fn remove(&self, room_id: &str, socket_id: Uuid) -> Option<Participant> {
        let mut guard = self.rooms.write().await;
        let room = guard.get_mut(room_id)?;
        let position = room.members.iter().position(|member| member.socket_id == socket_id)?;
        let removed = room.members.remove(position);
        if room.members.is_empty() {
            guard.remove(room_id);
        }
        Some(removed.participant())
    }

    /// Current roster snapshot for a room, in join order.
    pub async fn roster(&self, room_id: &str) -> Vec<Participant> {
        let guard = self.rooms.read().await;
        guard
            .get(room_id)
            .map(|room| room.members.iter().map(MemberRecord::participant).collect())
            .unwrap_or_default()
    }

    /// Stamp an inbound chat message with sender identity and the
    /// canonical instant, append it to the room history, and return the
    /// stored message for broadcast.
    pub async fn append_message(
        &self,
        room_id: &str,
        content: &str,
        sender: &str,
        sender_id: Uuid,
    ) -> Option<ChatMessage> {
        let mut guard = self.rooms.write().await;
        let room = guard.get_mut(room_id)?;
        let message = ChatMessage {
            content: content.to_string(),
            sender: sender.to_string(),
            sender_id,
            timestamp: Utc::now(),
        };
        room.history.push(message.clone());
        if room.history.len() > MAX_HISTORY_MESSAGES {
            let excess = room.history.len() - MAX_HISTORY_MESSAGES;
            room.history.drain(..excess);
        }
        Some(message)
    }

    /// Chat backlog for a room, oldest first.
    pub async fn history(&self, room_id: &str) -> Vec<ChatMessage> {
        let guard = self.rooms.read().await;
        guard.get(room_id).map(|room| room.history.clone()).unwrap_or_default()
    }

    /// Deliver a frame to every member of a room. Returns the number of
    /// members whose outbound channel accepted it.
    pub async fn broadcast(&self, room_id: &str, message: WsMessage) -> usize {
        let recipients = self.outbound_senders(room_id).await;
        let mut sent_count = 0;
        for recipient in recipients {
            if recipient.send(message.clone()).is_ok() {
                sent_count += 1;
            }
        }
        sent_count
    }

    /// Deliver a frame to the single addressed member. Returns false
    /// when the addressee is not (or no longer) in the room.
    pub async fn send_to(&self, room_id: &str, socket_id: Uuid, message: WsMessage) -> bool {
        let guard = self.rooms.read().await;
        let Some(room) = guard.get(room_id) else {
            return false;
        };
        room.members
            .iter()
            .find(|member| member.socket_id == socket_id)
            .is_some_and(|member| member.outbound.send(message).is_ok())
    }

    async fn outbound_senders(&self, room_id: &str) -> Vec<mpsc::UnboundedSender<WsMessage>> {
        let guard = self.rooms.read().await;
        guard
            .get(room_id)
            .map(|room| room.members.iter().map(|member| member.outbound.clone()).collect())
            .unwrap_or_default()
    }
}
