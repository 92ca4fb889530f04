//! Datagram variant of the [`Transport`] capability.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use log::debug;
use tokio::net::UdpSocket;

use super::DISCOVERY_PACKET_SIZE;
use crate::common::connection::Transport;
use crate::common::errors::TransportError;

/// One datagram and the address it came from or goes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    pub payload: Vec<u8>,
    pub peer: SocketAddr,
}

/// UDP socket exchanging datagrams of at most [`DISCOVERY_PACKET_SIZE`] bytes.
pub struct DatagramEndpoint {
    socket: UdpSocket,
    broadcast: bool,
    receive_timeout: Option<Duration>,
}

impl DatagramEndpoint {
    pub async fn bind(addr: SocketAddr) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(addr).await?;
        Ok(Self {
            socket,
            broadcast: false,
            receive_timeout: None,
        })
    }

    /// Allow sending to broadcast addresses once [`Transport::prepare`] runs.
    pub fn with_broadcast(mut self, broadcast: bool) -> Self {
        self.broadcast = broadcast;
        self
    }

    /// Bound each receive; an elapsed window makes `receive` return `Ok(None)`.
    pub fn with_receive_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.receive_timeout = timeout;
        self
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    async fn recv_one(&self) -> Result<Datagram, TransportError> {
        let mut buf = [0u8; DISCOVERY_PACKET_SIZE];
        loop {
            match self.socket.recv_from(&mut buf).await {
                Ok((n, peer)) => {
                    return Ok(Datagram {
                        payload: buf[..n].to_vec(),
                        peer,
                    })
                }
                // ICMP unreachable from an earlier send surfaces here on some platforms.
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionRefused
                    ) =>
                {
                    debug!("Ignoring datagram socket error: {}", e);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl Transport for DatagramEndpoint {
    type Packet = Datagram;

    async fn prepare(&mut self) -> Result<(), TransportError> {
        self.socket.set_broadcast(self.broadcast)?;
        Ok(())
    }

    async fn send(&mut self, packet: Datagram) -> Result<(), TransportError> {
        if packet.payload.len() > DISCOVERY_PACKET_SIZE {
            return Err(TransportError::FrameTooLarge {
                len: packet.payload.len() as u64,
                max: DISCOVERY_PACKET_SIZE as u64,
            });
        }
        self.socket.send_to(&packet.payload, packet.peer).await?;
        Ok(())
    }

    async fn receive(&mut self) -> Result<Option<Datagram>, TransportError> {
        match self.receive_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.recv_one()).await {
                Ok(datagram) => datagram.map(Some),
                Err(_) => Ok(None),
            },
            None => self.recv_one().await.map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loopback() -> SocketAddr {
        "127.0.0.1:0".parse().unwrap()
    }

    #[tokio::test]
    async fn test_exchange_datagrams() {
        let mut a = DatagramEndpoint::bind(loopback()).await.unwrap();
        let mut b = DatagramEndpoint::bind(loopback()).await.unwrap();
        a.prepare().await.unwrap();

        let to_b = b.local_addr().unwrap();
        a.send(Datagram {
            payload: b"ping".to_vec(),
            peer: to_b,
        })
        .await
        .unwrap();

        let got = b.receive().await.unwrap().unwrap();
        assert_eq!(got.payload, b"ping");
        assert_eq!(got.peer, a.local_addr().unwrap());
    }

    #[tokio::test]
    async fn test_receive_window_elapses() {
        let mut endpoint = DatagramEndpoint::bind(loopback())
            .await
            .unwrap()
            .with_receive_timeout(Some(Duration::from_millis(50)));

        assert_eq!(endpoint.receive().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_oversized_datagram_rejected() {
        let mut endpoint = DatagramEndpoint::bind(loopback()).await.unwrap();
        let peer = endpoint.local_addr().unwrap();

        let result = endpoint
            .send(Datagram {
                payload: vec![0; DISCOVERY_PACKET_SIZE + 1],
                peer,
            })
            .await;
        assert!(matches!(result, Err(TransportError::FrameTooLarge { .. })));
    }

    #[tokio::test]
    async fn test_prepare_enables_broadcast() {
        let mut endpoint = DatagramEndpoint::bind(loopback())
            .await
            .unwrap()
            .with_broadcast(true);
        endpoint.prepare().await.unwrap();
        assert!(endpoint.socket.broadcast().unwrap());
    }
}
