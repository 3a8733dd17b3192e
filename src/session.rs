//! Session handle
//!
//! Represents one connected client: its identity plus the capability to
//! queue bytes for it and to close it.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::error::SendError;
use crate::types::SessionId;

/// Item queued for a session's write task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Text to write to the client as-is
    Line(String),
    /// Flush what is queued and close the connection
    Close,
}

/// Connected session handle
///
/// Cheap to clone; every clone refers to the same connection. Identity is
/// the `SessionId`, never the channel.
#[derive(Debug, Clone)]
pub struct Session {
    /// Unique identifier for this session
    pub id: SessionId,
    /// Server → client queue, drained by the connection's write task
    sender: mpsc::Sender<Outbound>,
}

impl Session {
    /// Create a new session with the given ID and outbound channel
    pub fn new(id: SessionId, sender: mpsc::Sender<Outbound>) -> Self {
        Self { id, sender }
    }

    /// Queue text for this session without waiting.
    ///
    /// Fails if the client is gone or its queue is full; the text is dropped
    /// in both cases.
    pub fn write(&self, text: impl Into<String>) -> Result<(), SendError> {
        self.push(Outbound::Line(text.into()))
    }

    /// Ask the write task to close the connection once queued text is out.
    pub fn close(&self) -> Result<(), SendError> {
        self.push(Outbound::Close)
    }

    /// Check whether the connection's write task has gone away
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    fn push(&self, item: Outbound) -> Result<(), SendError> {
        self.sender.try_send(item).map_err(|e| match e {
            TrySendError::Full(_) => SendError::ChannelFull,
            TrySendError::Closed(_) => SendError::ChannelClosed,
        })
    }
}

impl PartialEq for Session {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Session {}
