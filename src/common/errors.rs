//! # Error Taxonomy
//!
//! - [`TransportError`]: I/O failure on a framed connection, always fatal to a session
//! - [`RouteError`]: no pattern matched a message, recoverable
//! - [`PatternError`]: a route pattern could not be parsed
//! - [`StorageError`]: shared directory failure, reported back to the peer
//! - [`ClientError`]: what the client core surfaces to its caller
//! - [`DiscoveryError`]: socket failure while scanning or responding
//!
//! End of stream and an elapsed discovery window are not errors; they are
//! signalled with `Ok(None)`.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("read timed out")]
    TimedOut,

    #[error("connection closed")]
    Closed,

    #[error("frame too large: {len} bytes (max: {max} bytes)")]
    FrameTooLarge { len: u64, max: u64 },

    #[error("payload is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RouteError {
    #[error("unknown command: {0}")]
    NoMatch(String),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PatternError {
    #[error("unclosed capture in pattern {0:?}")]
    UnclosedCapture(String),

    #[error("empty capture name in pattern {0:?}")]
    EmptyName(String),

    #[error("unknown capture kind {kind:?} in pattern {pattern:?}")]
    UnknownKind { pattern: String, kind: String },

    #[error("captures must be separated by literal text in pattern {0:?}")]
    AdjacentCaptures(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("invalid file name: {0:?}")]
    InvalidName(String),

    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("server error: {0}")]
    Remote(String),

    #[error("server closed the connection")]
    Disconnected,

    #[error("unexpected reply: {0:?}")]
    UnexpectedReply(String),
}

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("invalid discovery config: {0}")]
    InvalidConfig(String),
}

impl From<io::Error> for ClientError {
    fn from(e: io::Error) -> Self {
        Self::Transport(TransportError::Io(e))
    }
}

impl From<io::Error> for DiscoveryError {
    fn from(e: io::Error) -> Self {
        Self::Transport(TransportError::Io(e))
    }
}
