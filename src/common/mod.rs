//! # Common Components
//!
//! Shared utilities and data structures used by both client and server components.
//!
//! ## Modules
//!
//! - [`connection`]: framed stream transport and the [`Transport`](connection::Transport) capability
//! - [`router`]: ordered pattern table that routes text messages to handlers
//! - [`protocol`]: stream command set and reply literals
//! - [`storage`]: shared directory access used by both sides
//! - [`errors`]: error taxonomy shared by every layer
//! - [`config`]: configuration parsing utilities
//! - [`logging`]: logger setup for the binaries

pub mod config;
pub mod connection;
pub mod errors;
pub mod logging;
pub mod protocol;
pub mod router;
pub mod storage;
