//! The seam between the filesystem and an FTP session.
//!
//! The filesystem only needs three protocol primitives: list a path, change
//! into a path, and stream a file forward from a byte offset. Everything
//! else (login, passive mode, reply codes) is the transport's business.

mod error;
mod memory;

use async_trait::async_trait;
use futures::future::BoxFuture;
use std::time::SystemTime;
use tokio::io::AsyncRead;

pub use error::{TransportError, TransportResult};
pub use memory::{MemoryStats, MemoryTransport};

/// Type tag of a listing entry, as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Link,
}

/// One entry of a `LIST` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    /// Name as the server printed it. For a listing of a single file this
    /// is usually the path that was listed.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Modification time, if the server reported one we could parse.
    pub modified: Option<SystemTime>,
    pub kind: EntryKind,
}

impl RemoteEntry {
    /// Create a file entry.
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            modified: None,
            kind: EntryKind::File,
        }
    }

    /// Create a directory entry.
    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: 0,
            modified: None,
            kind: EntryKind::Directory,
        }
    }

    /// Set the modification time.
    pub fn with_modified(mut self, modified: SystemTime) -> Self {
        self.modified = Some(modified);
        self
    }

    /// Returns true if the server tagged this entry as a directory.
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// A forward-only download started by [`FtpTransport::retr_from`].
///
/// Reading yields the file's bytes from the requested offset; `Ok(0)` means
/// the server finished the transfer. Dropping the stream closes the data
/// connection, but only [`DataStream::close`] also settles the transfer with
/// the server. `close` may be slow, so the filesystem runs it off the read
/// path when a stream is abandoned.
pub trait DataStream: AsyncRead + Send + Unpin {
    /// Terminate the transfer and release its connection.
    fn close(self: Box<Self>) -> BoxFuture<'static, TransportResult<()>>;
}

/// A logged-in FTP session.
///
/// Sessions are single-owner and not reentrant: one command at a time. The
/// filesystem serializes access through a mutex.
#[async_trait]
pub trait FtpTransport: Send {
    /// List the entries at `path`, in server order.
    ///
    /// Many servers answer an empty list for a path that does not exist, so
    /// an empty result is not an error here.
    async fn list(&mut self, path: &str) -> TransportResult<Vec<RemoteEntry>>;

    /// Change the working directory to `path`.
    async fn change_dir(&mut self, path: &str) -> TransportResult<()>;

    /// Start downloading `path` from `offset`.
    async fn retr_from(&mut self, path: &str, offset: u64) -> TransportResult<Box<dyn DataStream>>;
}
