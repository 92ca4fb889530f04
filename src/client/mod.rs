//! # Client Components
//!
//! ## Core Client ([`client`])
//! Sends `LIST` / `GET` / `PUT` / `BYE` over one framed connection and turns
//! error replies into [`ClientError::Remote`](crate::common::errors::ClientError::Remote).
//!
//! ## Shell ([`shell`])
//! Interactive front end: discovery scan, connect, local and remote listings,
//! downloads into and uploads from the local shared directory.

pub mod client;
pub mod config;
pub mod shell;

pub use client::FileShareClient;
pub use config::ClientConfig;
pub use shell::Shell;
