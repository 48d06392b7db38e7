// coderoom CLI: a terminal participant for a shared room.
//
// Joins a room, mirrors roster and chat activity to stdout, and sends
// stdin lines as chat messages. `/quit` (or EOF) leaves the room.

use anyhow::Context;
use clap::Parser;
use coderoom_client::{RoomConfig, RoomSession, SessionEvent, SessionTransport, WsTransport};
use coderoom_common::types::ChatMessage;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "coderoom", about = "Real-time collaborative rooms from the terminal")]
struct Cli {
    /// Coordinator WebSocket url.
    #[arg(long, default_value = "ws://127.0.0.1:4000/ws")]
    relay_url: String,
    /// Room key to join.
    #[arg(long)]
    room: String,
    /// Display name to enter the room under.
    #[arg(long)]
    name: String,
}

enum Input {
    Event(Result<Option<SessionEvent>, coderoom_client::SessionError>),
    Line(Option<String>),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = RoomConfig {
        ws_url: cli.relay_url,
        room_id: cli.room.clone(),
        username: cli.name.clone(),
    };
    let mut session = RoomSession::new(config, WsTransport::new());

    session
        .connect()
        .await
        .context("could not join the room, try again later")?;
    println!("joined room {} as {}", cli.room, cli.name);
    println!("type a message and press enter to chat; /quit to leave");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let input = tokio::select! {
            event = session.next_event() => Input::Event(event),
            line = lines.next_line() => Input::Line(line.context("failed to read stdin")?),
        };

        match input {
            Input::Event(Ok(Some(event))) => {
                if print_event(&session, event) {
                    break;
                }
            }
            Input::Event(Ok(None)) => {}
            Input::Event(Err(error)) => {
                eprintln!("session failed: {error}");
                break;
            }
            Input::Line(Some(line)) => {
                if line.trim() == "/quit" {
                    break;
                }
                session.set_draft(line);
                session.send_draft().await?;
            }
            Input::Line(None) => break,
        }
    }

    session.leave().await;
    println!("left room {}", cli.room);
    Ok(())
}

/// Render one session event. Returns true when the session is over and
/// the user should be taken back to the entry point.
fn print_event<T: SessionTransport>(session: &RoomSession<T>, event: SessionEvent) -> bool {
    match event {
        SessionEvent::ParticipantJoined { username, socket_id } => {
            if session.socket_id() != Some(socket_id) {
                println!("* {username} joined the room");
            }
            let names: Vec<&str> =
                session.roster().iter().map(|p| p.username.as_str()).collect();
            println!("* online: {}", names.join(", "));
            false
        }
        SessionEvent::ParticipantLeft { username, .. } => {
            println!("* {username} left the room");
            false
        }
        SessionEvent::HistoryReplaced { .. } => {
            for message in session.messages() {
                print_message(session, message);
            }
            false
        }
        SessionEvent::MessageReceived(message) => {
            print_message(session, &message);
            false
        }
        SessionEvent::DocumentSynced => {
            let size = session.document().map_or(0, str::len);
            println!("* document updated ({size} bytes)");
            false
        }
        SessionEvent::RoomError { code, message, retryable } => {
            eprintln!("! room error {code}: {message}");
            !retryable
        }
        SessionEvent::ConnectionClosed => {
            eprintln!("! connection closed by the relay");
            true
        }
    }
}

fn print_message<T: SessionTransport>(session: &RoomSession<T>, message: &ChatMessage) {
    let sender = if session.is_self(message) { "You" } else { message.sender.as_str() };
    println!("[{}] {}: {}", message.clock_time(), sender, message.content);
}
