//! Room-based Telnet Chat Server - Entry Point
//!
//! Parses configuration, binds the TCP listener and hands it to `serve`.

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use room_chat_server::{serve, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();

    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=room_chat_server=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    // Bind failure is fatal
    let listener = TcpListener::bind(&config.bind).await?;
    info!("Telnet Chat Server listening on {}", listener.local_addr()?);

    serve(listener, config).await;

    Ok(())
}
