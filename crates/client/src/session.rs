// Session lifecycle controller.
//
// Orchestrates one room visit: acquire the transport, request entry,
// then pump inbound frames into the roster, chat, and document caches.
// Everything runs on the task calling `next_event`, so no two handlers
// ever execute concurrently and teardown can never race a handler.

use crate::chat::ChatLog;
use crate::document::DocumentBuffer;
use crate::roster::Roster;
use crate::transport::{validate_ws_url, SessionTransport, TransportError};
use coderoom_common::protocol::ws::WsMessage;
use coderoom_common::types::{ChatMessage, Participant};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Connection parameters for one room visit.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// Coordinator WebSocket url (e.g. "ws://127.0.0.1:4000/ws").
    pub ws_url: String,
    /// Externally supplied room key.
    pub room_id: String,
    /// Display name to enter the room under.
    pub username: String,
}

/// Current state of the session.
///
/// `Errored` is terminal for this visit: transport failures are fatal
/// and never retried automatically. Recovery is a fresh session
/// initiated by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Joining,
    Joined,
    Errored,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("join rejected: {code}: {message}")]
    JoinRejected { code: String, message: String },
    #[error("connection closed during join handshake")]
    HandshakeClosed,
    #[error("unexpected frame during join handshake")]
    HandshakeProtocol,
    #[error("session is not joined")]
    NotJoined,
}

/// What one pumped frame meant, for the caller's surface layer.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The roster snapshot was replaced because `username` joined.
    ParticipantJoined { username: String, socket_id: Uuid },
    /// `username` departed and was dropped from the roster.
    ParticipantLeft { username: String, socket_id: Uuid },
    /// The chat backlog was replayed, replacing the local list.
    HistoryReplaced { message_count: usize },
    /// One chat message was appended.
    MessageReceived(ChatMessage),
    /// The document cache was overwritten by a peer's snapshot.
    DocumentSynced,
    /// The coordinator reported a protocol error. Non-retryable errors
    /// end the session.
    RoomError { code: String, message: String, retryable: bool },
    /// The coordinator closed the connection; the session is over.
    ConnectionClosed,
}

/// One participant's view of a room.
pub struct RoomSession<T: SessionTransport> {
    config: RoomConfig,
    transport: T,
    state: SessionState,
    socket_id: Option<Uuid>,
    roster: Roster,
    chat: ChatLog,
    document: DocumentBuffer,
}

impl<T: SessionTransport> RoomSession<T> {
    pub fn new(config: RoomConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            state: SessionState::Disconnected,
            socket_id: None,
            roster: Roster::default(),
            chat: ChatLog::default(),
            document: DocumentBuffer::default(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The connection id assigned at join acceptance.
    pub fn socket_id(&self) -> Option<Uuid> {
        self.socket_id
    }

    pub fn roster(&self) -> &[Participant] {
        self.roster.participants()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.chat.messages()
    }

    /// The latest known document snapshot.
    pub fn document(&self) -> Option<&str> {
        self.document.snapshot()
    }

    /// Whether `message` was authored by this session, judged against
    /// the live assigned id at the moment of the call.
    pub fn is_self(&self, message: &ChatMessage) -> bool {
        self.socket_id.is_some_and(|session_id| message.is_from(session_id))
    }

    /// Connect the transport, request entry, and await acceptance.
    ///
    /// On success the session is `Joined` and holds its assigned
    /// connection id; the roster snapshot and backlog arrive as the
    /// first pumped events. Every failure path lands in `Errored`.
    pub async fn connect(&mut self) -> Result<(), SessionError> {
        validate_ws_url(&self.config.ws_url)?;

        self.state = SessionState::Connecting;
        if let Err(error) = self.transport.connect(&self.config.ws_url).await {
            self.state = SessionState::Errored;
            return Err(error.into());
        }

        self.state = SessionState::Joining;
        let join = WsMessage::Join {
            room_id: self.config.room_id.clone(),
            username: self.config.username.clone(),
        };
        if let Err(error) = self.transport.send(&join).await {
            self.state = SessionState::Errored;
            return Err(error.into());
        }

        match self.transport.recv().await {
            Ok(Some(WsMessage::Welcome { socket_id, .. })) => {
                info!(
                    room_id = %self.config.room_id,
                    socket_id = %socket_id,
                    "room session established"
                );
                self.socket_id = Some(socket_id);
                self.state = SessionState::Joined;
                Ok(())
            }
            Ok(Some(WsMessage::Error { code, message, .. })) => {
                self.transport.close().await;
                self.state = SessionState::Errored;
                Err(SessionError::JoinRejected { code, message })
            }
            Ok(Some(_)) => {
                self.transport.close().await;
                self.state = SessionState::Errored;
                Err(SessionError::HandshakeProtocol)
            }
            Ok(None) => {
                self.state = SessionState::Errored;
                Err(SessionError::HandshakeClosed)
            }
            Err(error) => {
                self.transport.close().await;
                self.state = SessionState::Errored;
                Err(error.into())
            }
        }
    }

    /// Pump exactly one inbound frame and apply it to local state.
    ///
    /// `Ok(None)` means a frame arrived that carries nothing for this
    /// client (ignored). A closed connection yields
    /// [`SessionEvent::ConnectionClosed`] and ends the session.
    pub async fn next_event(&mut self) -> Result<Option<SessionEvent>, SessionError> {
        if self.state != SessionState::Joined {
            return Err(SessionError::NotJoined);
        }

        match self.transport.recv().await {
            Ok(Some(frame)) => self.apply_frame(frame).await,
            Ok(None) => {
                self.state = SessionState::Errored;
                Ok(Some(SessionEvent::ConnectionClosed))
            }
            Err(error) => {
                self.state = SessionState::Errored;
                Err(error.into())
            }
        }
    }

    async fn apply_frame(&mut self, frame: WsMessage) -> Result<Option<SessionEvent>, SessionError> {
        match frame {
            WsMessage::Joined { clients, username, socket_id } => {
                self.roster.apply_snapshot(clients);
                // Answer someone else's join with the cached document,
                // addressed to the joiner alone. The joiner itself has
                // nothing to push.
                if self.socket_id != Some(socket_id) {
                    if let Some(code) = self.document.snapshot() {
                        let sync = WsMessage::SyncCode { code: code.to_string(), socket_id };
                        if let Err(error) = self.transport.send(&sync).await {
                            self.state = SessionState::Errored;
                            return Err(error.into());
                        }
                    }
                }
                Ok(Some(SessionEvent::ParticipantJoined { username, socket_id }))
            }
            WsMessage::Disconnected { socket_id, username } => {
                // Absent entries are fine: duplicate or late notices.
                self.roster.remove(socket_id);
                Ok(Some(SessionEvent::ParticipantLeft { username, socket_id }))
            }
            WsMessage::ChatHistory { messages } => {
                let message_count = messages.len();
                self.chat.apply_history(messages);
                Ok(Some(SessionEvent::HistoryReplaced { message_count }))
            }
            WsMessage::ReceiveMessage { content, sender, sender_id, timestamp } => {
                let message = ChatMessage { content, sender, sender_id, timestamp };
                self.chat.push(message.clone());
                Ok(Some(SessionEvent::MessageReceived(message)))
            }
            WsMessage::SyncCode { code, .. } => {
                self.document.set(code);
                Ok(Some(SessionEvent::DocumentSynced))
            }
            WsMessage::Error { code, message, retryable } => {
                warn!(code = %code, retryable, "coordinator reported an error");
                if !retryable {
                    self.state = SessionState::Errored;
                }
                Ok(Some(SessionEvent::RoomError { code, message, retryable }))
            }
            WsMessage::Join { .. } | WsMessage::Welcome { .. } | WsMessage::SendMessage { .. } => {
                debug!("ignoring frame not addressed to a participant");
                Ok(None)
            }
        }
    }

    /// Stage chat input (mirrors the input field).
    pub fn set_draft(&mut self, draft: impl Into<String>) {
        self.chat.set_draft(draft);
    }

    pub fn draft(&self) -> &str {
        self.chat.draft()
    }

    /// Send the current draft to the room.
    ///
    /// Whitespace-only drafts never reach the transport: the call
    /// returns `Ok(false)` and the outbound stream is untouched. On a
    /// successful send the draft buffer is cleared; the message itself
    /// appears in the local list only when the coordinator's broadcast
    /// comes back.
    pub async fn send_draft(&mut self) -> Result<bool, SessionError> {
        if self.state != SessionState::Joined {
            return Err(SessionError::NotJoined);
        }
        let Some(content) = self.chat.take_draft() else {
            return Ok(false);
        };

        let frame = WsMessage::SendMessage {
            room_id: self.config.room_id.clone(),
            message: content,
        };
        match self.transport.send(&frame).await {
            Ok(()) => Ok(true),
            Err(error) => {
                self.state = SessionState::Errored;
                Err(error.into())
            }
        }
    }

    /// Record a local edit in the document cache.
    pub fn set_local_code(&mut self, code: impl Into<String>) {
        self.document.set(code);
    }

    /// Tear the session down: close the transport and discard all
    /// room-scoped state. Safe from every state and idempotent; once it
    /// returns, no event can be observed from this session.
    pub async fn leave(&mut self) {
        self.transport.close().await;
        self.roster.clear();
        self.chat.clear();
        self.document.clear();
        self.socket_id = None;
        self.state = SessionState::Disconnected;
    }
}
