// Transport session: one full-duplex frame channel per room visit.
//
// The session logic is written against `SessionTransport` so it can be
// driven by a queue-backed mock in tests; `WsTransport` is the
// production implementation over tokio-tungstenite.

use coderoom_common::protocol::ws::{decode_message, encode_message, WsMessage};
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async, tungstenite::Message as WsFrame, MaybeTlsStream, WebSocketStream,
};
use url::Url;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid websocket url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("send failed: {0}")]
    Send(String),
    #[error("receive failed: {0}")]
    Recv(String),
    #[error("transport is not connected")]
    NotConnected,
}

/// One bidirectional frame channel to the room coordinator.
///
/// `send` is fire-and-forget: a returned `Ok` means the frame was
/// handed to the channel, not that anyone received it. `recv` yields
/// frames in arrival order and `Ok(None)` exactly once on clean close.
/// `close` is idempotent; no frame is yielded after it returns.
#[allow(async_fn_in_trait)]
pub trait SessionTransport {
    async fn connect(&mut self, ws_url: &str) -> Result<(), TransportError>;
    async fn send(&mut self, message: &WsMessage) -> Result<(), TransportError>;
    async fn recv(&mut self) -> Result<Option<WsMessage>, TransportError>;
    async fn close(&mut self);
}

/// Reject anything that is not a `ws`/`wss` url before dialing.
pub(crate) fn validate_ws_url(value: &str) -> Result<(), TransportError> {
    let parsed = Url::parse(value).map_err(|error| TransportError::InvalidUrl {
        url: value.to_string(),
        reason: error.to_string(),
    })?;
    match parsed.scheme() {
        "ws" | "wss" => Ok(()),
        other => Err(TransportError::InvalidUrl {
            url: value.to_string(),
            reason: format!("unsupported scheme `{other}`"),
        }),
    }
}

/// Production transport over tokio-tungstenite.
#[derive(Debug, Default)]
pub struct WsTransport {
    stream: Option<WebSocketStream<MaybeTlsStream<TcpStream>>>,
}

impl WsTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionTransport for WsTransport {
    async fn connect(&mut self, ws_url: &str) -> Result<(), TransportError> {
        validate_ws_url(ws_url)?;
        let (stream, _) = connect_async(ws_url)
            .await
            .map_err(|error| TransportError::Connect(error.to_string()))?;
        self.stream = Some(stream);
        Ok(())
    }

    async fn send(&mut self, message: &WsMessage) -> Result<(), TransportError> {
        let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;
        let raw = encode_message(message).map_err(|error| TransportError::Send(error.to_string()))?;
        stream
            .send(WsFrame::Text(raw.into()))
            .await
            .map_err(|error| TransportError::Send(error.to_string()))
    }

    async fn recv(&mut self) -> Result<Option<WsMessage>, TransportError> {
        loop {
            let Some(stream) = self.stream.as_mut() else {
                return Ok(None);
            };
            let Some(next) = stream.next().await else {
                self.stream = None;
                return Ok(None);
            };

            match next {
                Ok(WsFrame::Text(payload)) => {
                    return decode_message(&payload)
                        .map(Some)
                        .map_err(|error| TransportError::Recv(error.to_string()));
                }
                Ok(WsFrame::Binary(payload)) => {
                    return serde_json::from_slice::<WsMessage>(&payload)
                        .map(Some)
                        .map_err(|error| TransportError::Recv(error.to_string()));
                }
                Ok(WsFrame::Ping(payload)) => {
                    let _ = stream.send(WsFrame::Pong(payload)).await;
                }
                Ok(WsFrame::Pong(_)) => {}
                Ok(WsFrame::Close(_)) => {
                    self.stream = None;
                    return Ok(None);
                }
                Ok(_) => {}
                Err(error) => {
                    self.stream = None;
                    return Err(TransportError::Recv(error.to_string()));
                }
            }
        }
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.close(None).await;
        }
    }
}
