//! Peerlink Signaling Server
//!
//! Two-party WebRTC signaling relay over WebSockets.
//!
//! # Usage
//!
//! ```bash
//! # Defaults (port 3000, or the PORT environment variable)
//! peerlink-signal
//!
//! # Explicit port and faster room expiry
//! peerlink-signal --port 8080 --room-ttl 600 --sweep-interval 60
//! ```

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use peerlink_core::Config;
use peerlink_signal::SignalServer;

#[derive(Parser, Debug)]
#[command(name = "peerlink-signal")]
#[command(about = "Two-party WebRTC signaling relay")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Bind address
    #[arg(short, long)]
    bind: Option<String>,

    /// Configuration file (defaults to the per-user config path)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Room time-to-live in seconds
    #[arg(long)]
    room_ttl: Option<u64>,

    /// Seconds between room expiry sweeps
    #[arg(long)]
    sweep_interval: Option<u64>,

    /// Print a sample configuration file and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let args = Args::parse();

    if args.print_config {
        print!("{}", Config::sample());
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };

    // CLI flags override the config file
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(bind) = &args.bind {
        config.server.bind = bind.parse::<IpAddr>()?;
    }
    if let Some(ttl) = args.room_ttl {
        config.rooms.ttl_secs = ttl;
    }
    if let Some(interval) = args.sweep_interval {
        config.rooms.sweep_interval_secs = interval;
    }

    let addr = SocketAddr::new(config.server.bind, config.server.port);

    info!("Starting Peerlink signaling server");
    info!(
        "Rooms expire after {}s, swept every {}s",
        config.rooms.ttl_secs, config.rooms.sweep_interval_secs
    );

    let server = SignalServer::new(config.rooms);
    server.serve(addr).await?;

    Ok(())
}
