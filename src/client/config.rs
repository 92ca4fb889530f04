use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::discovery::DiscoveryConfig;

/// Client configuration loaded from TOML file.
///
/// # Example TOML
///
/// ```toml
/// [client]
/// shared_dir = "./client/shared_folder"
/// read_timeout_secs = 5
///
/// [discovery]
/// broadcast_address = "192.168.1.255"
/// timeout_ms = 2000
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Local directory and stream settings
    pub client: ClientInfo,
    /// Scanner settings
    pub discovery: DiscoveryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientInfo {
    /// Local directory that downloads land in and uploads are read from
    pub shared_dir: PathBuf,
    /// How long to wait for a server reply (seconds); absent waits forever
    pub read_timeout_secs: Option<u64>,
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self {
            shared_dir: PathBuf::from("./client/shared_folder"),
            read_timeout_secs: Some(5),
        }
    }
}

impl ClientInfo {
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: ClientConfig = toml::from_str("").unwrap();
        assert_eq!(config.client.read_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.discovery.timeout_ms, 2000);
    }

    #[test]
    fn test_overrides() {
        let config: ClientConfig = toml::from_str(
            r#"
            [client]
            shared_dir = "/tmp/share"
            read_timeout_secs = 30

            [discovery]
            broadcast_address = "10.0.0.255"
            "#,
        )
        .unwrap();
        assert_eq!(config.client.shared_dir, PathBuf::from("/tmp/share"));
        assert_eq!(config.client.read_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.discovery.broadcast_address, "10.0.0.255");
    }
}
