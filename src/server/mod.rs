//! # Server Components
//!
//! - [`server`]: listener, concurrency cap and discovery responder wiring
//! - [`session`]: per-connection state machine executing stream commands
//! - [`config`]: TOML configuration

pub mod config;
pub mod server;
pub mod session;

pub use config::ServerConfig;
pub use server::Server;
pub use session::{Session, SessionState};
