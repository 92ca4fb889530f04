//! # Client Binary Entry Point
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin client -- --config config/client.toml
//! ```
//!
//! Then at the prompt:
//!
//! ```text
//! scan
//! connect 192.168.1.20 30001
//! rlist
//! get notes.txt
//! put photo.png
//! bye
//! exit
//! ```

use clap::Parser;
use std::path::PathBuf;

use lan_share::client::{ClientConfig, Shell};
use lan_share::common::config::load_config_or_default;
use lan_share::common::logging::init_logger;

/// Command-line arguments for the client binary
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the client configuration file (TOML format)
    #[arg(short, long)]
    config: Option<String>,

    /// Local shared directory, overrides the config file
    #[arg(short, long)]
    shared_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    let args = Args::parse();

    let mut config: ClientConfig = load_config_or_default(args.config.as_deref())?;
    if let Some(shared_dir) = args.shared_dir {
        config.client.shared_dir = shared_dir;
    }

    let mut shell = Shell::new(config)?;
    shell.run().await
}
