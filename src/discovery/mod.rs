//! # Service Discovery
//!
//! Connectionless handshake that lets a client find file-sharing servers on
//! the local network without knowing their addresses.
//!
//! ```text
//! Client --(broadcast "SERVICE DISCOVERY")--> every host on the discovery port
//! Server --(identification string)----------> Client, one reply per request
//! ```
//!
//! The scanner keeps collecting replies until a receive waits a full timeout
//! without data. An empty result means no server answered.

pub mod config;
pub mod datagram;
pub mod responder;
pub mod scanner;

pub use config::DiscoveryConfig;
pub use datagram::{Datagram, DatagramEndpoint};
pub use responder::DiscoveryResponder;
pub use scanner::{DiscoveryReply, DiscoveryScanner};

/// Exact request payload a responder answers.
pub const DISCOVERY_REQUEST: &str = "SERVICE DISCOVERY";

/// Largest discovery datagram sent or read.
pub const DISCOVERY_PACKET_SIZE: usize = 256;
