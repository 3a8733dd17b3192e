//! Command definitions
//!
//! One input line is one command: a verb followed by its arguments. The set
//! of verbs is closed. `send` keeps the rest of the line as typed.

use crate::error::CommandError;

pub const JOIN_USAGE: &str = "join <room>";
pub const SEND_USAGE: &str = "send <text...>";

/// Help text listing every command
pub const HELP_TEXT: &str = "\
Commands:
  join <room>      join a room, leaving the current one
  leave            leave the current room
  send <text...>   send a message to everyone else in your room
  help             show this list
  exit             disconnect
";

/// Client → server command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Join a room by name
    Join { room: String },
    /// Leave the current room
    Leave,
    /// Broadcast text to the current room
    Send { text: String },
    /// List commands
    Help,
    /// Close the session
    Exit,
}

impl Command {
    /// Parse one input line.
    ///
    /// Returns `Ok(None)` for a blank line.
    pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
        let line = line.trim_start_matches(|c: char| c.is_ascii_whitespace());
        if line.is_empty() {
            return Ok(None);
        }
        let (verb, rest) = line
            .split_once(|c: char| c.is_ascii_whitespace())
            .unwrap_or((line, ""));
        let rest = rest.trim_start_matches(|c: char| c.is_ascii_whitespace());

        let command = match verb {
            "join" => {
                let room = rest
                    .split_ascii_whitespace()
                    .next()
                    .ok_or(CommandError::Usage(JOIN_USAGE))?;
                Command::Join {
                    room: room.to_string(),
                }
            }
            "leave" => Command::Leave,
            "send" => {
                if rest.is_empty() {
                    return Err(CommandError::Usage(SEND_USAGE));
                }
                Command::Send {
                    text: rest.to_string(),
                }
            }
            "help" => Command::Help,
            "exit" => Command::Exit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };

        Ok(Some(command))
    }
}
