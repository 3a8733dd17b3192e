//! Room-based Telnet Chat Server Library
//!
//! A telnet chat server built with tokio: clients connect with any telnet
//! or raw TCP client, join a named room, and exchange lines with everyone
//! else in that room.
//!
//! # Commands
//! - `join <room>`: join a room (leaving the current one)
//! - `leave`: leave the current room
//! - `send <text...>`: send a line to the other members of your room
//! - `help`, `exit`
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `ChatServer` is the central actor owning the `ChatRegistry`
//!   (room → members and session → room, always updated together)
//! - Each connection has a `handler` task communicating with the server
//! - Outbound text is queued per session without waiting, so a slow client
//!   never stalls the others
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use room_chat_server::{serve, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let listener = TcpListener::bind("127.0.0.1:5555").await?;
//!     serve(listener, Config::default()).await;
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod command;
pub mod config;
pub mod error;
pub mod handler;
pub mod membership;
pub mod registry;
pub mod room;
pub mod server;
pub mod session;
pub mod types;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{error, info};

// Re-export main types for convenience
pub use codec::TelnetLineCodec;
pub use command::Command;
pub use config::Config;
pub use error::{AppError, CodecError, CommandError, SendError};
pub use handler::handle_connection;
pub use membership::MembershipTracker;
pub use registry::{ChatRegistry, JoinOutcome};
pub use room::{Room, RoomRegistry};
pub use server::{ChatServer, ServerCommand};
pub use session::{Outbound, Session};
pub use types::{RoomName, SessionId};

/// Channel buffer size for server commands
const CHANNEL_BUFFER_SIZE: usize = 256;

/// Start the ChatServer actor and accept connections on `listener` forever.
pub async fn serve(listener: TcpListener, config: Config) {
    let config = Arc::new(config);

    // Create ChatServer actor channel and start
    let (cmd_tx, cmd_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
    let server = ChatServer::new(cmd_rx, &config);
    tokio::spawn(server.run());

    info!("ChatServer actor started");

    // Connection accept loop
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                info!("New connection from {}", addr);
                let cmd_tx = cmd_tx.clone();
                let config = Arc::clone(&config);

                // Spawn handler task for each connection
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, cmd_tx, config).await {
                        error!("Connection handler error: {}", e);
                    }
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
