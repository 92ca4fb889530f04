//! # Connection Session
//!
//! Server-side lifecycle of one accepted connection:
//!
//! ```text
//! ACCEPTED --run()--> SERVING --(end of stream | BYE | transport error)--> CLOSED
//! ```
//!
//! While `SERVING`, each frame is decoded, classified into a [`Command`] and
//! executed against the [`SharedDirectory`]. Unknown commands and storage
//! failures are answered with an error reply and the session keeps going;
//! transport failures end it.

use log::{debug, error, info, warn};
use tokio::io::{AsyncRead, AsyncWrite};
use uuid::Uuid;

use crate::common::connection::Connection;
use crate::common::errors::{StorageError, TransportError};
use crate::common::protocol::{error_reply, join_listing, Command, REPLY_ACK, REPLY_OK};
use crate::common::storage::SharedDirectory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Accepted,
    Serving,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Continue,
    Close,
}

pub struct Session<S> {
    /// Correlates the log lines of one session
    id: Uuid,
    /// Peer description for logging
    peer: String,
    /// `None` once the session is closed
    conn: Option<Connection<S>>,
    directory: SharedDirectory,
    state: SessionState,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(conn: Connection<S>, directory: SharedDirectory, peer: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            peer: peer.into(),
            conn: Some(conn),
            directory,
            state: SessionState::Accepted,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Serve requests until the peer disconnects, says `BYE`, or the transport fails.
    ///
    /// The connection is released on every path; the session ends `Closed`.
    pub async fn run(&mut self) -> Result<(), TransportError> {
        if self.state != SessionState::Accepted {
            return Err(TransportError::Closed);
        }

        info!("🔗 Session {} serving {}", self.id, self.peer);
        self.state = SessionState::Serving;

        let result = self.serve().await;
        if let Err(e) = &result {
            error!("❌ Session {} transport error: {}", self.id, e);
        }

        if let Some(conn) = self.conn.take() {
            if let Err(e) = conn.close().await {
                debug!("Session {} close: {}", self.id, e);
            }
        }
        self.state = SessionState::Closed;
        info!("🔌 Session {} closed ({})", self.id, self.peer);

        result
    }

    async fn serve(&mut self) -> Result<(), TransportError> {
        loop {
            let frame = match self.connection()?.receive().await? {
                Some(frame) => frame,
                None => {
                    info!("Session {}: client disconnected", self.id);
                    return Ok(());
                }
            };

            if self.handle_frame(frame).await? == Step::Close {
                return Ok(());
            }
        }
    }

    async fn handle_frame(&mut self, frame: Vec<u8>) -> Result<Step, TransportError> {
        let message = match String::from_utf8(frame) {
            Ok(message) => message,
            Err(_) => {
                warn!("⚠️ Session {}: command is not valid UTF-8", self.id);
                self.send_error("command is not valid UTF-8").await?;
                return Ok(Step::Continue);
            }
        };

        let command = match Command::parse(&message) {
            Ok(command) => command,
            Err(e) => {
                warn!("⚠️ Session {}: {}", self.id, e);
                self.send_error(e).await?;
                return Ok(Step::Continue);
            }
        };

        debug!("Session {} <- {}", self.id, summarize(&command));
        self.execute(command).await
    }

    async fn execute(&mut self, command: Command) -> Result<Step, TransportError> {
        match command {
            Command::List => {
                let result = self
                    .directory
                    .list_entries()
                    .await
                    .map(|names| join_listing(&names).into_bytes());
                self.reply(result).await?;
            }
            Command::Get { filename } => {
                let result = self.directory.read_file(&filename).await;
                self.reply(result).await?;
            }
            Command::Put {
                filename,
                contents: Some(contents),
            } => {
                let result = self
                    .directory
                    .write_file(&filename, contents.as_bytes())
                    .await
                    .map(|_| REPLY_ACK.as_bytes().to_vec());
                self.reply(result).await?;
            }
            Command::Put {
                filename,
                contents: None,
            } => {
                if let Err(e) = SharedDirectory::check_name(&filename) {
                    self.reply(Err(e)).await?;
                    return Ok(Step::Continue);
                }

                self.connection()?.send_text(REPLY_OK).await?;
                let payload = match self.connection()?.receive().await? {
                    Some(payload) => payload,
                    None => {
                        info!("Session {}: client disconnected during upload", self.id);
                        return Ok(Step::Close);
                    }
                };

                let result = self
                    .directory
                    .write_file(&filename, &payload)
                    .await
                    .map(|_| REPLY_ACK.as_bytes().to_vec());
                if result.is_ok() {
                    info!(
                        "📥 Session {} stored {} ({} bytes)",
                        self.id,
                        filename,
                        payload.len()
                    );
                }
                self.reply(result).await?;
            }
            Command::Bye => {
                info!("👋 Session {}: BYE", self.id);
                return Ok(Step::Close);
            }
        }

        Ok(Step::Continue)
    }

    /// Send a handler result: the payload on success, an error reply otherwise.
    async fn reply(&mut self, result: Result<Vec<u8>, StorageError>) -> Result<(), TransportError> {
        match result {
            Ok(payload) => self.connection()?.send(&payload).await,
            Err(e) => {
                warn!("⚠️ Session {}: {}", self.id, e);
                self.send_error(e).await
            }
        }
    }

    async fn send_error(&mut self, message: impl std::fmt::Display) -> Result<(), TransportError> {
        let text = error_reply(message);
        self.connection()?.send_text(&text).await
    }

    fn connection(&mut self) -> Result<&mut Connection<S>, TransportError> {
        self.conn.as_mut().ok_or(TransportError::Closed)
    }
}

/// Log form of a command; upload contents are reduced to their size.
fn summarize(command: &Command) -> String {
    match command {
        Command::Put {
            filename,
            contents: Some(contents),
        } => format!("PUT-{} ({} bytes inline)", filename, contents.len()),
        other => other.to_string(),
    }
}
