use std::io;
use std::net::SocketAddr;

use log::{debug, info, warn};

use super::datagram::{Datagram, DatagramEndpoint};
use super::{DiscoveryConfig, DISCOVERY_PACKET_SIZE, DISCOVERY_REQUEST};
use crate::common::connection::Transport;
use crate::common::errors::DiscoveryError;

/// Server side of discovery: answers every `SERVICE DISCOVERY` datagram with
/// the configured identification string.
pub struct DiscoveryResponder {
    endpoint: DatagramEndpoint,
    identification: Vec<u8>,
}

impl DiscoveryResponder {
    pub async fn bind(config: &DiscoveryConfig) -> Result<Self, DiscoveryError> {
        if config.identification.len() > DISCOVERY_PACKET_SIZE {
            return Err(DiscoveryError::InvalidConfig(format!(
                "identification is {} bytes, limit is {}",
                config.identification.len(),
                DISCOVERY_PACKET_SIZE
            )));
        }

        let mut endpoint = DatagramEndpoint::bind(config.bind_addr().await?).await?;
        endpoint.prepare().await?;

        Ok(Self {
            endpoint,
            identification: config.identification.clone().into_bytes(),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.endpoint.local_addr()
    }

    /// Answer requests forever. Returns only on a socket failure.
    pub async fn run(mut self) -> Result<(), DiscoveryError> {
        if let Ok(addr) = self.local_addr() {
            info!("📡 Discovery responder listening on {}", addr);
        }

        loop {
            if let Some(datagram) = self.endpoint.receive().await? {
                self.answer(datagram).await;
            }
        }
    }

    async fn answer(&mut self, datagram: Datagram) {
        if datagram.payload != DISCOVERY_REQUEST.as_bytes() {
            debug!(
                "Ignoring {} byte datagram from {}",
                datagram.payload.len(),
                datagram.peer
            );
            return;
        }

        info!("🔎 Discovery request from {}", datagram.peer);
        let reply = Datagram {
            payload: self.identification.clone(),
            peer: datagram.peer,
        };
        if let Err(e) = self.endpoint.send(reply).await {
            warn!("⚠️ Failed to answer discovery request from {}: {}", datagram.peer, e);
        }
    }
}
