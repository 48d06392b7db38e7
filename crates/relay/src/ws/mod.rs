// WebSocket surface of the room coordinator.

pub(crate) mod handler;
pub(crate) mod protocol;

pub use handler::router;
