use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::discovery::DiscoveryConfig;

/// Complete server configuration loaded from TOML file.
///
/// # Example TOML
///
/// ```toml
/// [server]
/// address = "0.0.0.0:30001"
/// shared_dir = "./server/shared_folder"
/// max_connections = 64
///
/// [discovery]
/// port = 30000
/// identification = "Alice's file sharing service"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Stream listener and shared directory settings
    pub server: ServerInfo,
    /// Discovery responder settings
    pub discovery: DiscoveryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerInfo {
    /// Address the stream listener binds to (e.g., "0.0.0.0:30001")
    pub address: String,
    /// Directory whose files are shared
    pub shared_dir: PathBuf,
    /// Most sessions served at once; further clients wait to be accepted
    pub max_connections: usize,
    /// Largest inbound frame accepted, unlimited when absent
    pub max_frame_bytes: Option<u32>,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            address: "0.0.0.0:30001".to_string(),
            shared_dir: PathBuf::from("./server/shared_folder"),
            max_connections: 64,
            max_frame_bytes: None,
        }
    }
}
