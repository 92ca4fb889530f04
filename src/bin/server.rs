//! # Server Binary Entry Point
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin server -- --config config/server.toml
//! cargo run --bin server -- --address 0.0.0.0:30001 --shared-dir ./shared
//! ```
//!
//! The server will:
//! 1. Load configuration (defaults when no file is given)
//! 2. Create the shared directory if needed and log its contents
//! 3. Answer discovery broadcasts
//! 4. Serve stream connections until Ctrl-C

use clap::Parser;
use log::info;
use std::path::PathBuf;

use lan_share::common::config::load_config_or_default;
use lan_share::common::logging::init_logger;
use lan_share::server::{Server, ServerConfig};

/// Command-line arguments for the server binary
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the server configuration file (TOML format)
    #[arg(short, long)]
    config: Option<String>,

    /// Listen address, overrides the config file
    #[arg(short, long)]
    address: Option<String>,

    /// Shared directory, overrides the config file
    #[arg(short, long)]
    shared_dir: Option<PathBuf>,

    /// Maximum concurrent sessions, overrides the config file
    #[arg(long)]
    max_connections: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    let args = Args::parse();

    let mut config: ServerConfig = load_config_or_default(args.config.as_deref())?;
    if let Some(address) = args.address {
        config.server.address = address;
    }
    if let Some(shared_dir) = args.shared_dir {
        config.server.shared_dir = shared_dir;
    }
    if let Some(max_connections) = args.max_connections {
        config.server.max_connections = max_connections;
    }

    let server = Server::new(config);

    // Dropping the server future aborts every open session.
    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => info!("🛑 Shutting down"),
    }

    Ok(())
}
