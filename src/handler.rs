//! Telnet connection handler
//!
//! Handles individual client connections: line framing, command parsing,
//! and bidirectional communication with the ChatServer.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::Framed;
use tracing::{debug, error, info};

use crate::codec::TelnetLineCodec;
use crate::command::Command;
use crate::config::Config;
use crate::error::{AppError, CodecError};
use crate::server::ServerCommand;
use crate::session::{Outbound, Session};
use crate::types::{RoomName, SessionId};

/// Handle a new TCP connection
///
/// Registers the session, runs the read and write tasks, and always
/// reports the disconnect so the session is evicted from its room.
pub async fn handle_connection(
    stream: TcpStream,
    cmd_tx: mpsc::Sender<ServerCommand>,
    config: Arc<Config>,
) -> Result<(), AppError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    let framed = Framed::new(stream, TelnetLineCodec::new(config.max_line_length.get()));
    let (mut line_sink, mut line_stream) = framed.split::<String>();

    // Generate session ID
    let session_id = SessionId::new();
    info!("Session {} connected from {}", session_id, peer_addr);

    // Create channel for server -> client output
    let (out_tx, mut out_rx) = mpsc::channel::<Outbound>(config.outbound_buffer.get());

    // Register with ChatServer
    if cmd_tx
        .send(ServerCommand::Connect {
            session: Session::new(session_id, out_tx),
        })
        .await
        .is_err()
    {
        error!("Failed to register session {} - server closed", session_id);
        return Err(AppError::ChannelSend);
    }

    // Clone cmd_tx for read task
    let cmd_tx_read = cmd_tx.clone();

    // Spawn read task (socket lines -> ServerCommand)
    let mut read_task = tokio::spawn(async move {
        while let Some(line_result) = line_stream.next().await {
            let line = line_result?;
            let cmd = line_to_command(session_id, &line);
            if cmd_tx_read.send(cmd).await.is_err() {
                debug!("Server closed, ending read task for {}", session_id);
                break;
            }
        }
        debug!("Read task ended for {}", session_id);
        Ok::<(), CodecError>(())
    });

    // Spawn write task (Outbound -> socket)
    let mut write_task = tokio::spawn(async move {
        while let Some(item) = out_rx.recv().await {
            match item {
                Outbound::Line(text) => {
                    if let Err(e) = line_sink.send(text).await {
                        debug!("Write failed for {}: {}", session_id, e);
                        break;
                    }
                }
                Outbound::Close => {
                    debug!("Close requested for {}", session_id);
                    break;
                }
            }
        }
        debug!("Write task ended for {}", session_id);

        // Flush and shut down the write half
        let _ = line_sink.close().await;
    });

    // Wait for either task to complete, then stop the other
    let mut read_error = None;
    tokio::select! {
        result = &mut read_task => {
            debug!("Read task completed for {}", session_id);
            write_task.abort();
            if let Ok(Err(e)) = result {
                read_error = Some(e);
            }
        }
        _ = &mut write_task => {
            debug!("Write task completed for {}", session_id);
            read_task.abort();
        }
    }

    // Send disconnect command
    let _ = cmd_tx
        .send(ServerCommand::Disconnect { session_id })
        .await;

    info!("Session {} disconnected", session_id);

    match read_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

/// Convert one input line to a ServerCommand
fn line_to_command(session_id: SessionId, line: &str) -> ServerCommand {
    match Command::parse(line) {
        Ok(Some(Command::Join { room })) => ServerCommand::Join {
            session_id,
            room: RoomName::from(room),
        },
        Ok(Some(Command::Leave)) => ServerCommand::Leave { session_id },
        Ok(Some(Command::Send { text })) => ServerCommand::Send { session_id, text },
        Ok(Some(Command::Help)) => ServerCommand::Help { session_id },
        Ok(Some(Command::Exit)) => ServerCommand::Exit { session_id },
        Ok(None) => ServerCommand::Prompt { session_id },
        Err(error) => ServerCommand::Rejected { session_id, error },
    }
}
