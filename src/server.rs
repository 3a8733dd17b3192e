//! ChatServer Actor implementation
//!
//! The central actor that owns all shared state: the session table and the
//! room membership registry. Connection handlers never touch that state
//! directly; they send `ServerCommand`s and the actor applies them one at a
//! time, so every join/leave/send is atomic with respect to the others.
//!
//! Writes to sessions are queued with `try_send` and never awaited, so a
//! slow client cannot stall the actor.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::command::HELP_TEXT;
use crate::config::Config;
use crate::error::{AppError, CommandError};
use crate::registry::ChatRegistry;
use crate::session::Session;
use crate::types::{RoomName, SessionId};

/// Commands sent from handlers to the ChatServer actor
#[derive(Debug)]
pub enum ServerCommand {
    /// New session connected
    Connect { session: Session },
    /// Session disconnected (or asked to exit and has been closed)
    Disconnect { session_id: SessionId },
    /// Join a room, leaving the current one
    Join { session_id: SessionId, room: RoomName },
    /// Leave the current room
    Leave { session_id: SessionId },
    /// Broadcast text to the current room
    Send { session_id: SessionId, text: String },
    /// List commands
    Help { session_id: SessionId },
    /// Say goodbye and close the session
    Exit { session_id: SessionId },
    /// Input that did not parse into a command
    Rejected {
        session_id: SessionId,
        error: CommandError,
    },
    /// Blank input line
    Prompt { session_id: SessionId },
}

/// The main ChatServer actor
pub struct ChatServer {
    /// All connected sessions: SessionId -> Session
    sessions: HashMap<SessionId, Session>,
    /// Room and membership state
    registry: ChatRegistry,
    /// Command receiver channel
    receiver: mpsc::Receiver<ServerCommand>,
    prompt: String,
    welcome: String,
    goodbye: String,
}

impl ChatServer {
    /// Create a new ChatServer with the given command receiver
    pub fn new(receiver: mpsc::Receiver<ServerCommand>, config: &Config) -> Self {
        Self {
            sessions: HashMap::new(),
            registry: ChatRegistry::new(),
            receiver,
            prompt: config.prompt.clone(),
            welcome: config.welcome.clone(),
            goodbye: config.goodbye.clone(),
        }
    }

    /// Run the ChatServer event loop
    ///
    /// Continuously receives and processes commands until all senders are dropped.
    pub async fn run(mut self) {
        info!("ChatServer started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!("ChatServer shutting down");
    }

    /// Process a single command
    fn handle_command(&mut self, cmd: ServerCommand) {
        match cmd {
            ServerCommand::Connect { session } => self.handle_connect(session),
            ServerCommand::Disconnect { session_id } => self.handle_disconnect(session_id),
            ServerCommand::Join { session_id, room } => self.handle_join(session_id, room),
            ServerCommand::Leave { session_id } => self.handle_leave(session_id),
            ServerCommand::Send { session_id, text } => self.handle_send(session_id, text),
            ServerCommand::Help { session_id } => {
                self.reply(session_id, HELP_TEXT);
                self.prompt(session_id);
            }
            ServerCommand::Exit { session_id } => self.handle_exit(session_id),
            ServerCommand::Rejected { session_id, error } => {
                debug!("Rejected input from {}: {}", session_id, error);
                let hint = match &error {
                    CommandError::Unknown(_) => "\nType 'help' for a list of commands.",
                    CommandError::Usage(_) => "",
                };
                self.reply(session_id, &format!("{error}{hint}\n"));
                self.prompt(session_id);
            }
            ServerCommand::Prompt { session_id } => self.prompt(session_id),
        }
    }

    /// Handle new session connection
    fn handle_connect(&mut self, session: Session) {
        info!("Session {} connected", session.id);
        let session_id = session.id;
        self.sessions.insert(session_id, session);
        self.reply(session_id, &self.welcome);
        self.prompt(session_id);
        debug!(
            "Total sessions: {}, Total rooms: {}",
            self.sessions.len(),
            self.registry.room_count()
        );
    }

    /// Handle session disconnection
    fn handle_disconnect(&mut self, session_id: SessionId) {
        info!("Session {} disconnected", session_id);

        // Evict from room if in one
        self.registry.disconnect(session_id);

        self.sessions.remove(&session_id);

        debug!(
            "Total sessions: {}, Total rooms: {}",
            self.sessions.len(),
            self.registry.room_count()
        );
    }

    /// Handle room joining
    fn handle_join(&mut self, session_id: SessionId, room: RoomName) {
        let Some(session) = self.sessions.get(&session_id) else {
            return;
        };

        let outcome = self.registry.join(session, room);

        let mut text = String::new();
        if let Some(left) = &outcome.left {
            text.push_str(&format!("Left room {left}\n"));
        }
        text.push_str(&format!("Joined room {}\n", outcome.room));
        self.reply(session_id, &text);
        self.prompt(session_id);
    }

    /// Handle voluntary room leaving
    fn handle_leave(&mut self, session_id: SessionId) {
        let text = match self.registry.leave(session_id) {
            Some(room) => format!("Left room {room}\n"),
            None => "You are not in any room\n".to_string(),
        };
        self.reply(session_id, &text);
        self.prompt(session_id);
    }

    /// Handle chat message
    fn handle_send(&mut self, session_id: SessionId, text: String) {
        match self.registry.send(session_id, &format!("{text}\n")) {
            Ok(_) => {}
            Err(AppError::NotInRoom) => self.reply(session_id, "You are not in a room\n"),
            Err(e) => warn!("Send from {} failed: {}", session_id, e),
        }
        self.prompt(session_id);
    }

    /// Handle `exit`: goodbye, then close.
    ///
    /// The session is evicted here, dropping every sender the server holds
    /// for it. The write task then ends once the queue drains, even when the
    /// `Close` marker did not fit. The handler's later `Disconnect` is a no-op.
    fn handle_exit(&mut self, session_id: SessionId) {
        let Some(session) = self.sessions.get(&session_id) else {
            return;
        };

        info!("Session {} exiting", session_id);

        if let Err(e) = session.write(self.goodbye.as_str()) {
            debug!("Goodbye to {} dropped: {}", session_id, e);
        }
        if let Err(e) = session.close() {
            debug!("Close marker for {} dropped: {}", session_id, e);
        }

        self.handle_disconnect(session_id);
    }

    /// Helper: write text to one session, logging failures
    fn reply(&self, session_id: SessionId, text: &str) {
        let Some(session) = self.sessions.get(&session_id) else {
            return;
        };
        if let Err(e) = session.write(text) {
            warn!("Dropped reply to {}: {}", session_id, e);
        }
    }

    fn prompt(&self, session_id: SessionId) {
        self.reply(session_id, &self.prompt);
    }
}
