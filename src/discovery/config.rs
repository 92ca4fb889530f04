use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::common::errors::DiscoveryError;

/// Discovery settings shared by the responder (server) and scanner (client).
///
/// # Example TOML
///
/// ```toml
/// [discovery]
/// port = 30000
/// broadcast_address = "255.255.255.255"
/// timeout_ms = 2000
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Whether the server runs a responder at all
    pub enabled: bool,
    /// Well-known discovery port
    pub port: u16,
    /// Address the responder binds to
    pub bind_address: String,
    /// Address the scanner sends its request to
    pub broadcast_address: String,
    /// How long one scanner receive waits before the scan ends (milliseconds)
    pub timeout_ms: u64,
    /// Text the responder sends back to identify itself
    pub identification: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 30000,
            bind_address: "0.0.0.0".to_string(),
            broadcast_address: "255.255.255.255".to_string(),
            timeout_ms: 2000,
            identification: "LAN file sharing service".to_string(),
        }
    }
}

impl DiscoveryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub async fn bind_addr(&self) -> Result<SocketAddr, DiscoveryError> {
        resolve(&self.bind_address, self.port).await
    }

    pub async fn broadcast_addr(&self) -> Result<SocketAddr, DiscoveryError> {
        resolve(&self.broadcast_address, self.port).await
    }
}

async fn resolve(host: &str, port: u16) -> Result<SocketAddr, DiscoveryError> {
    tokio::net::lookup_host((host, port))
        .await?
        .next()
        .ok_or_else(|| DiscoveryError::InvalidConfig(format!("{} does not resolve", host)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DiscoveryConfig::default();
        assert_eq!(config.port, 30000);
        assert_eq!(config.timeout(), Duration::from_secs(2));
    }

    #[test]
    fn test_partial_toml() {
        let config: DiscoveryConfig = toml::from_str("port = 40000\ntimeout_ms = 250").unwrap();
        assert_eq!(config.port, 40000);
        assert_eq!(config.timeout_ms, 250);
        assert_eq!(config.broadcast_address, "255.255.255.255");
        assert!(config.enabled);
    }

    #[tokio::test]
    async fn test_resolve_addresses() {
        let config = DiscoveryConfig {
            broadcast_address: "127.0.0.1".into(),
            port: 31000,
            ..DiscoveryConfig::default()
        };
        assert_eq!(
            config.broadcast_addr().await.unwrap(),
            "127.0.0.1:31000".parse().unwrap()
        );
        assert_eq!(
            config.bind_addr().await.unwrap(),
            "0.0.0.0:31000".parse().unwrap()
        );
    }
}
