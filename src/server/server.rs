//! # File Sharing Server
//!
//! Accepts stream connections and runs one [`Session`] task per connection,
//! next to a discovery responder task.
//!
//! At most `max_connections` sessions run at once: the accept loop takes a
//! semaphore permit before accepting, so extra clients wait in the listen
//! backlog. Sessions live in a `JoinSet`, so dropping the server future aborts
//! all of them.

use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, error, info};
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

use super::config::ServerConfig;
use super::session::Session;
use crate::common::connection::Connection;
use crate::common::storage::SharedDirectory;
use crate::discovery::DiscoveryResponder;

pub struct Server {
    config: ServerConfig,
    directory: SharedDirectory,
    /// Permits for concurrently running sessions
    limiter: Arc<Semaphore>,
}

impl Server {
    /// Create a new server instance.
    ///
    /// # Example
    /// ```ignore
    /// let config: ServerConfig = load_config("config/server.toml")?;
    /// let server = Server::new(config);
    /// server.run().await?;
    /// ```
    pub fn new(config: ServerConfig) -> Self {
        let directory = SharedDirectory::new(config.server.shared_dir.clone());
        let limiter = Arc::new(Semaphore::new(config.server.max_connections.max(1)));

        Self {
            config,
            directory,
            limiter,
        }
    }

    /// Main entry point: prepares the shared directory, binds the listener and
    /// the discovery responder, and serves until one of them fails.
    pub async fn run(&self) -> Result<()> {
        self.directory.ensure_exists().await?;
        info!(
            "📂 Current files in {}:",
            self.directory.root().display()
        );
        for name in self.directory.list_entries().await? {
            info!("    {}", name);
        }

        let listener = TcpListener::bind(&self.config.server.address)
            .await
            .with_context(|| format!("binding {}", self.config.server.address))?;
        info!(
            "🚀 Listening on {} (max {} sessions)",
            self.config.server.address,
            self.config.server.max_connections.max(1)
        );

        if !self.config.discovery.enabled {
            return self.serve(listener).await;
        }

        let responder = DiscoveryResponder::bind(&self.config.discovery)
            .await
            .context("binding discovery responder")?;

        tokio::select! {
            result = self.serve(listener) => result,
            result = responder.run() => {
                error!("❌ Discovery responder terminated");
                result.map_err(Into::into)
            }
        }
    }

    /// Accept connections from `listener` forever, one session task each.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let mut sessions = JoinSet::new();

        loop {
            let permit = self
                .limiter
                .clone()
                .acquire_owned()
                .await
                .context("session limiter closed")?;

            let (socket, addr) = loop {
                tokio::select! {
                    accepted = listener.accept() => match accepted {
                        Ok(pair) => break pair,
                        Err(e) => error!("❌ Accept error: {}", e),
                    },
                    Some(finished) = sessions.join_next() => log_session_exit(finished),
                }
            };
            debug!("Accepted connection from {}", addr);

            let mut conn = Connection::new(socket);
            conn.set_max_frame_len(self.config.server.max_frame_bytes);
            let mut session = Session::new(conn, self.directory.clone(), addr.to_string());

            sessions.spawn(async move {
                // Held for the lifetime of the session.
                let _permit = permit;
                // Transport errors are already logged by the session.
                let _ = session.run().await;
            });
        }
    }
}

fn log_session_exit(finished: Result<(), JoinError>) {
    if let Err(e) = finished {
        if e.is_panic() {
            error!("❌ Session task panicked: {}", e);
        }
    }
}
