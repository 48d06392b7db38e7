// coderoom-client: the participant half of a room session.
//
// A `RoomSession` joins a shared room over one WebSocket, mirrors the
// coordinator's roster and chat history, answers late joiners with its
// cached document snapshot, and surfaces everything it observes as
// typed session events. All state mutation happens on the task pumping
// `next_event`, so handlers are implicitly mutually exclusive.

pub mod chat;
pub mod document;
pub mod roster;
pub mod session;
pub mod transport;

pub use chat::ChatLog;
pub use document::DocumentBuffer;
pub use roster::Roster;
pub use session::{RoomConfig, RoomSession, SessionError, SessionEvent, SessionState};
pub use transport::{SessionTransport, TransportError, WsTransport};
