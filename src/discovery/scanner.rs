use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use log::{info, warn};

use super::datagram::{Datagram, DatagramEndpoint};
use super::{DiscoveryConfig, DISCOVERY_REQUEST};
use crate::common::connection::Transport;
use crate::common::errors::DiscoveryError;

/// A reply collected during one discovery window. Not deduplicated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryReply {
    /// Identification text sent by the server
    pub message: String,
    /// Where the reply came from
    pub sender: SocketAddr,
}

/// Client side of discovery.
pub struct DiscoveryScanner {
    config: DiscoveryConfig,
}

impl DiscoveryScanner {
    pub fn new(config: DiscoveryConfig) -> Self {
        Self { config }
    }

    /// Broadcast one request and collect replies until a receive waits the
    /// configured timeout without data.
    ///
    /// # Returns
    /// - `Ok(replies)`: every reply received, in arrival order; empty when nobody answered
    /// - `Err`: the socket could not be opened or the request could not be sent
    ///
    /// # Example
    /// ```ignore
    /// let replies = DiscoveryScanner::new(DiscoveryConfig::default()).scan().await?;
    /// for reply in replies {
    ///     println!("{}: {}", reply.sender.ip(), reply.message);
    /// }
    /// ```
    pub async fn scan(&self) -> Result<Vec<DiscoveryReply>, DiscoveryError> {
        let target = self.config.broadcast_addr().await?;
        let local = if target.is_ipv4() {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
        };

        let mut endpoint = DatagramEndpoint::bind(local)
            .await?
            .with_broadcast(true)
            .with_receive_timeout(Some(self.config.timeout()));
        endpoint.prepare().await?;

        endpoint
            .send(Datagram {
                payload: DISCOVERY_REQUEST.as_bytes().to_vec(),
                peer: target,
            })
            .await?;
        info!(
            "🔎 Listening for discovery replies ({} ms)...",
            self.config.timeout_ms
        );

        let mut replies = Vec::new();
        while let Some(datagram) = endpoint.receive().await? {
            match String::from_utf8(datagram.payload) {
                Ok(message) => replies.push(DiscoveryReply {
                    message,
                    sender: datagram.peer,
                }),
                Err(_) => warn!("⚠️ Ignoring non UTF-8 reply from {}", datagram.peer),
            }
        }

        Ok(replies)
    }
}
