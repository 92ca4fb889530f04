//! # Framed Stream Transport
//!
//! Wraps a byte stream and delimits messages with a length prefix.
//!
//! ## Wire Protocol
//!
//! ```text
//! [4 bytes: payload length, big-endian] [N bytes: payload]
//! ```
//!
//! Commands and text replies are UTF-8 inside the payload; file contents are
//! sent as raw bytes and never decoded.
//!
//! The stream and datagram endpoints share the [`Transport`] capability so
//! that callers can drive either one with `prepare` / `send` / `receive`.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use log::error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};

use super::errors::TransportError;

/// Upper bound on a single read from the underlying stream.
pub const PACKET_SIZE: usize = 1024;

/// Size of the length prefix in front of every frame.
pub const LENGTH_PREFIX_LEN: usize = 4;

/// Encode a payload length as a big-endian prefix, independent of host byte order.
pub fn encode_length(len: u32) -> [u8; LENGTH_PREFIX_LEN] {
    [
        (len >> 24) as u8,
        (len >> 16) as u8,
        (len >> 8) as u8,
        len as u8,
    ]
}

/// Decode a big-endian length prefix.
pub fn decode_length(prefix: [u8; LENGTH_PREFIX_LEN]) -> u32 {
    (u32::from(prefix[0]) << 24)
        | (u32::from(prefix[1]) << 16)
        | (u32::from(prefix[2]) << 8)
        | u32::from(prefix[3])
}

/// Send/receive capability shared by the stream and datagram endpoints.
///
/// `receive` returns `Ok(None)` for the endpoint's normal termination signal:
/// end of stream for a connection, an elapsed receive window for a datagram socket.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Unit exchanged by this endpoint.
    type Packet;

    /// Ready the endpoint for traffic. Stream connections need nothing.
    async fn prepare(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn send(&mut self, packet: Self::Packet) -> Result<(), TransportError>;

    async fn receive(&mut self) -> Result<Option<Self::Packet>, TransportError>;
}

/// Length-prefixed connection over any async byte stream.
///
/// Takes `&mut self` for both directions, so two sends on the same connection
/// can never interleave. Closing consumes the connection.
pub struct Connection<S = TcpStream> {
    /// Underlying byte stream
    stream: S,
    /// Upper bound on the idle wait of each read from the stream
    read_timeout: Option<Duration>,
    /// Largest inbound payload accepted; `None` accepts anything a u32 can express
    max_frame_len: Option<u32>,
}

impl Connection<TcpStream> {
    /// Open a TCP connection to `addr`.
    ///
    /// # Example
    /// ```ignore
    /// let mut conn = Connection::connect("192.168.1.20:30001").await?;
    /// conn.send_text("LIST").await?;
    /// ```
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self::new(stream))
    }

    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.stream.peer_addr()
    }
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Create a new Connection from an established stream.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            read_timeout: None,
            max_frame_len: None,
        }
    }

    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) {
        self.read_timeout = timeout;
    }

    pub fn set_max_frame_len(&mut self, max: Option<u32>) {
        self.max_frame_len = max;
    }

    /// Write one frame: the big-endian length prefix followed by `payload`.
    ///
    /// # Returns
    /// - `Ok(())`: frame written and flushed
    /// - `Err(TransportError::FrameTooLarge)`: payload length does not fit in the prefix
    /// - `Err(TransportError::Io)`: the write failed
    pub async fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        let length = u32::try_from(payload.len()).map_err(|_| TransportError::FrameTooLarge {
            len: payload.len() as u64,
            max: u64::from(u32::MAX),
        })?;

        self.stream.write_all(&encode_length(length)).await?;
        self.stream.write_all(payload).await?;
        self.stream.flush().await?;

        Ok(())
    }

    pub async fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
        self.send(text.as_bytes()).await
    }

    /// Read one frame.
    ///
    /// # Returns
    /// - `Ok(Some(bytes))`: a complete payload
    /// - `Ok(None)`: the peer closed before the prefix or before the full payload
    /// - `Err`: I/O failure, a read that stayed idle past the read timeout,
    ///   or an over-limit frame
    pub async fn receive(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        self.read_frame().await
    }

    /// Read one frame and decode it as UTF-8.
    pub async fn receive_text(&mut self) -> Result<Option<String>, TransportError> {
        match self.receive().await? {
            Some(bytes) => Ok(Some(String::from_utf8(bytes)?)),
            None => Ok(None),
        }
    }

    /// Shut down the write half and release the stream.
    pub async fn close(mut self) -> Result<(), TransportError> {
        self.stream.shutdown().await?;
        Ok(())
    }

    async fn read_frame(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        let prefix = match self.read_exactly(LENGTH_PREFIX_LEN).await? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };
        let length = decode_length([prefix[0], prefix[1], prefix[2], prefix[3]]);

        if let Some(max) = self.max_frame_len {
            if length > max {
                error!("❌ Frame too large: {} bytes (max: {} bytes)", length, max);
                return Err(TransportError::FrameTooLarge {
                    len: u64::from(length),
                    max: u64::from(max),
                });
            }
        }

        self.read_exactly(length as usize).await
    }

    /// Read exactly `count` bytes in chunks of at most [`PACKET_SIZE`].
    async fn read_exactly(&mut self, count: usize) -> Result<Option<Vec<u8>>, TransportError> {
        // Capacity grows with what actually arrives, not with what the prefix claims.
        let mut data = Vec::with_capacity(count.min(64 * PACKET_SIZE));
        let mut chunk = [0u8; PACKET_SIZE];

        while data.len() < count {
            let want = (count - data.len()).min(PACKET_SIZE);
            let read = self.stream.read(&mut chunk[..want]);
            let result = match self.read_timeout {
                Some(limit) => tokio::time::timeout(limit, read)
                    .await
                    .map_err(|_| TransportError::TimedOut)?,
                None => read.await,
            };
            let n = match result {
                Ok(0) => return Ok(None),
                Ok(n) => n,
                Err(e) if is_disconnect(&e) => return Ok(None),
                Err(e) => return Err(e.into()),
            };
            data.extend_from_slice(&chunk[..n]);
        }

        Ok(Some(data))
    }
}

impl<S> Transport for Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    type Packet = Vec<u8>;

    async fn send(&mut self, packet: Vec<u8>) -> Result<(), TransportError> {
        Connection::send(self, &packet).await
    }

    async fn receive(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        Connection::receive(self).await
    }
}

fn is_disconnect(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
    )
}
