//! # lan-share
//!
//! Minimal LAN file sharing: a server exposes a shared directory over a
//! length-prefixed request/response protocol, and clients find servers with a
//! UDP broadcast handshake.
//!
//! ## Modules
//!
//! - [`common`]: framed transport, command router, protocol commands, errors, config
//! - [`server`]: listener, per-connection sessions and the shared directory
//! - [`client`]: client core issuing `LIST` / `GET` / `PUT` / `BYE`
//! - [`discovery`]: UDP broadcast scanner and responder

pub mod client;
pub mod common;
pub mod discovery;
pub mod server;

pub use client::FileShareClient;
pub use common::connection::Connection;
pub use common::protocol::Command;
pub use server::Server;
