//! Error types for the chat server
//!
//! Defines application-level errors, per-recipient delivery errors,
//! line codec errors and command usage errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Application-level errors
///
/// Covers both fatal errors (connection termination) and
/// reportable conditions (a notice line is sent to the session).
#[derive(Debug, Error)]
pub enum AppError {
    /// Line framing or socket read error (fatal for the connection)
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Channel send error (fatal - internal channel broken)
    #[error("Channel send error")]
    ChannelSend,

    /// Session is not in any room
    #[error("Not in room")]
    NotInRoom,
}

/// Message send errors
///
/// Occurs when writing to a session's outbound queue. Always isolated to
/// the one recipient.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,

    /// The recipient is not draining its queue fast enough
    #[error("Channel full")]
    ChannelFull,
}

/// Telnet line codec errors
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An input line exceeded the configured maximum length
    #[error("Line exceeds {max} bytes")]
    LineTooLong { max: usize },
}

/// Command parsing errors
///
/// Reported to the issuing session as a human-readable line; never a
/// system failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommandError {
    /// A required argument is missing
    #[error("Usage: {0}")]
    Usage(&'static str),

    /// The verb is not one of the known commands
    #[error("Unknown command: {0}")]
    Unknown(String),
}
