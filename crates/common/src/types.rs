// Core domain types shared across all coderoom crates.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One connected member of a room.
///
/// Identity is the connection id assigned by the relay when the
/// connection is accepted. It is unique only within a room and only for
/// the lifetime of the connection; reconnecting yields a new id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Participant {
    pub socket_id: Uuid,
    pub username: String,
}

/// A single chat message as stored in room history and broadcast to
/// members.
///
/// `timestamp` is the canonical instant stamped by the relay; display
/// formatting is layered on top via [`ChatMessage::clock_time`] so the
/// stored value stays sortable and re-formattable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub content: String,
    pub sender: String,
    pub sender_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Whether this message was authored by the session holding
    /// `session_id`.
    ///
    /// The comparison happens at the point of use with the current
    /// session id passed explicitly. Nothing stores a `self` bit, so a
    /// reconnect that changes the local id is reflected consistently
    /// wherever messages are rendered.
    pub fn is_from(&self, session_id: Uuid) -> bool {
        self.sender_id == session_id
    }

    /// Hour:minute rendering of the canonical instant in local time.
    pub fn clock_time(&self) -> String {
        self.timestamp.with_timezone(&Local).format("%H:%M").to_string()
    }
}
