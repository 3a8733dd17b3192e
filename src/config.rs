//! Server configuration
//!
//! Every option can come from the command line or the environment.

use std::num::NonZeroUsize;

use clap::Parser;

/// Default server address
pub const DEFAULT_ADDR: &str = "0.0.0.0:5555";

pub const DEFAULT_PROMPT: &str = "> ";

pub const DEFAULT_WELCOME: &str =
    "Welcome to the chat server!\nType 'help' for a list of commands.\n";

pub const DEFAULT_GOODBYE: &str = "Good Bye!\n";

/// Per-session outbound queue depth
pub const DEFAULT_OUTBOUND_BUFFER: NonZeroUsize = non_zero(64);

pub const DEFAULT_MAX_LINE_LENGTH: NonZeroUsize = non_zero(4096);

pub const DEFAULT_LOG_LEVEL: &str = "room_chat_server=info";

/// Room-based telnet chat server
#[derive(Parser, Debug, Clone)]
#[command(name = "room_chat_server")]
#[command(about = "Room-based telnet chat server")]
#[command(version)]
pub struct Config {
    /// Address to bind to
    #[arg(short, long, env = "CHAT_BIND", default_value = DEFAULT_ADDR)]
    pub bind: String,

    /// Prompt written after every command
    #[arg(long, env = "CHAT_PROMPT", default_value = DEFAULT_PROMPT)]
    pub prompt: String,

    /// Banner written when a client connects
    #[arg(long, env = "CHAT_WELCOME", default_value = DEFAULT_WELCOME)]
    pub welcome: String,

    /// Message written before closing on `exit`
    #[arg(long, env = "CHAT_GOODBYE", default_value = DEFAULT_GOODBYE)]
    pub goodbye: String,

    /// Lines queued per client before further messages to it are dropped
    #[arg(long, default_value_t = DEFAULT_OUTBOUND_BUFFER)]
    pub outbound_buffer: NonZeroUsize,

    /// Longest accepted input line in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_LINE_LENGTH)]
    pub max_line_length: NonZeroUsize,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,
}

const fn non_zero(n: usize) -> NonZeroUsize {
    match NonZeroUsize::new(n) {
        Some(n) => n,
        None => panic!("zero default"),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: DEFAULT_ADDR.to_string(),
            prompt: DEFAULT_PROMPT.to_string(),
            welcome: DEFAULT_WELCOME.to_string(),
            goodbye: DEFAULT_GOODBYE.to_string(),
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}
