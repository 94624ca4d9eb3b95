//! VFS error types.

use std::io;
use thiserror::Error;

use crate::transport::TransportError;

/// VFS error type.
///
/// Callers see exactly these kinds: the four filesystem errors, or a
/// transport failure passed through unchanged.
#[derive(Debug, Error)]
pub enum VfsError {
    /// Path is neither a file nor a directory on the server.
    #[error("file not found: {0}")]
    NotFound(String),

    /// Seek resolved to a position outside `0..=u64::MAX`.
    #[error("invalid argument: seek to {target} (position stays at {position})")]
    InvalidArgument { target: i128, position: u64 },

    /// Read or seek on a directory handle.
    #[error("read on directory: {0}")]
    ReadOnDirectory(String),

    /// Readdir on a file handle.
    #[error("readdir on file: {0}")]
    ReaddirOnFile(String),

    /// The FTP session failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl VfsError {
    /// Create a NotFound error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Create a ReadOnDirectory error.
    pub fn read_on_directory(path: impl Into<String>) -> Self {
        Self::ReadOnDirectory(path.into())
    }

    /// Create a ReaddirOnFile error.
    pub fn readdir_on_file(path: impl Into<String>) -> Self {
        Self::ReaddirOnFile(path.into())
    }

    /// Returns true for [`VfsError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Convert VfsError to std::io::Error for compatibility.
impl From<VfsError> for io::Error {
    fn from(e: VfsError) -> Self {
        match e {
            VfsError::NotFound(msg) => io::Error::new(io::ErrorKind::NotFound, msg),
            e @ VfsError::InvalidArgument { .. } => {
                io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
            }
            VfsError::ReadOnDirectory(msg) => io::Error::new(io::ErrorKind::IsADirectory, msg),
            VfsError::ReaddirOnFile(msg) => io::Error::new(io::ErrorKind::NotADirectory, msg),
            VfsError::Transport(e) => e.into(),
        }
    }
}

/// VFS result type.
pub type VfsResult<T> = Result<T, VfsError>;
