//! Error types for the echo server.
//!
//! Only startup errors (`Bind`, `InvalidAddress`, config errors) are fatal.
//! `Connection` and `Send` stay inside the task of the connection that
//! produced them.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::Error as WsError;

/// Result type alias using the crate [`enum@Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    /// The listening socket could not be created or bound.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        /// Address the server tried to listen on.
        addr: String,
        #[source]
        source: io::Error,
    },

    /// Host and port did not form a socket address.
    #[error("Invalid listen address '{0}'")]
    InvalidAddress(String),

    /// Upgrade or read failure on a single connection.
    #[error("Connection error: {0}")]
    Connection(#[source] WsError),

    /// Echo write failed, usually because the peer is closing.
    #[error("Send error: {0}")]
    Send(#[source] WsError),

    #[error("Failed to read config file '{}': {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config file '{}': {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Returns true if the peer already went away.
    ///
    /// Such errors are part of a normal disconnect and not worth reporting.
    #[must_use]
    pub fn is_disconnect(&self) -> bool {
        match self {
            Error::Connection(e) | Error::Send(e) => match e {
                WsError::ConnectionClosed
                | WsError::AlreadyClosed
                | WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake) => true,
                WsError::Io(io_err) => matches!(
                    io_err.kind(),
                    io::ErrorKind::ConnectionReset
                        | io::ErrorKind::BrokenPipe
                        | io::ErrorKind::UnexpectedEof
                ),
                _ => false,
            },
            _ => false,
        }
    }
}
