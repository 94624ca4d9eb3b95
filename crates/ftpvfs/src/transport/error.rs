//! Transport error types.

use std::io;
use thiserror::Error;

/// Errors reported by an FTP session or one of its data streams.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Socket-level failure on the control or data connection.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The server answered a command with a failure reply.
    #[error("server replied {code}: {message}")]
    Rejected { code: u16, message: String },

    /// The server sent something we could not make sense of.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// No reply within the configured deadline.
    #[error("timed out: {0}")]
    Timeout(String),
}

impl TransportError {
    /// Create a Rejected error.
    pub fn rejected(code: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            code,
            message: message.into(),
        }
    }

    /// Create a Protocol error.
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create a Timeout error.
    pub fn timeout(what: impl Into<String>) -> Self {
        Self::Timeout(what.into())
    }

    /// Reply code, if the server rejected a command.
    pub fn reply_code(&self) -> Option<u16> {
        match self {
            Self::Rejected { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<TransportError> for io::Error {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Io(e) => e,
            TransportError::Rejected { code: 550, message } => {
                io::Error::new(io::ErrorKind::NotFound, message)
            }
            TransportError::Rejected { code: 530, message } => {
                io::Error::new(io::ErrorKind::PermissionDenied, message)
            }
            e @ TransportError::Rejected { .. } => io::Error::other(e.to_string()),
            TransportError::Protocol(msg) => io::Error::new(io::ErrorKind::InvalidData, msg),
            TransportError::Timeout(msg) => io::Error::new(io::ErrorKind::TimedOut, msg),
        }
    }
}

/// Transport result type.
pub type TransportResult<T> = Result<T, TransportError>;
