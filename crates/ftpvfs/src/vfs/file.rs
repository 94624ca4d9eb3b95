//! Seekable file handle over forward-only FTP downloads.
//!
//! FTP can only stream a file forward from an offset (`REST` + `RETR`), and
//! each new transfer costs several round trips. [`FtpFile`] keeps at most one
//! transfer open and remembers the last [`LOOKBACK_CAPACITY`] bytes it
//! delivered, so a read after a seek lands in one of three places:
//!
//! - **No pending seek**: continue the open transfer, starting one if needed.
//! - **Seek into the look-back window**: replay from memory, no network.
//! - **Seek anywhere else**: abandon the transfer (closed on a background
//!   task) and start a new one at the requested offset.
//!
//! Seeks are lazy; only reads touch the network.

use async_trait::async_trait;
use std::io::SeekFrom;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::sync::Mutex;

use super::handle::FileHandle;
use super::lookback::Lookback;
use super::types::FileAttr;
use super::{VfsError, VfsResult};
use crate::constants::LOOKBACK_CAPACITY;
use crate::transport::{DataStream, FtpTransport, TransportError};

/// An open remote file.
pub struct FtpFile<T: FtpTransport> {
    session: Arc<Mutex<T>>,
    path: String,
    attr: FileAttr,

    /// Offset through which the current transfer has delivered bytes.
    committed: u64,
    /// Offset the next read serves. Differs from `committed` only after a seek.
    requested: u64,
    stream: Option<Box<dyn DataStream>>,
    lookback: Lookback,
}

impl<T: FtpTransport> std::fmt::Debug for FtpFile<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FtpFile")
            .field("path", &self.path)
            .field("size", &self.attr.size)
            .field("committed", &self.committed)
            .field("requested", &self.requested)
            .field("streaming", &self.stream.is_some())
            .finish()
    }
}

impl<T: FtpTransport> FtpFile<T> {
    /// Create a handle for `path`. No transfer is started until the first read.
    pub fn new(session: Arc<Mutex<T>>, path: impl Into<String>, attr: FileAttr) -> Self {
        Self {
            session,
            path: path.into(),
            attr,
            committed: 0,
            requested: 0,
            stream: None,
            lookback: Lookback::new(LOOKBACK_CAPACITY),
        }
    }

    /// The remote path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Size reported by the listing at open time.
    pub fn size(&self) -> u64 {
        self.attr.size
    }

    /// Offset the next read will serve.
    pub fn position(&self) -> u64 {
        self.requested
    }

    /// Returns true while a transfer is open.
    pub fn is_streaming(&self) -> bool {
        self.stream.is_some()
    }

    /// Start a transfer at `offset` and re-anchor both positions there.
    async fn open_stream(&mut self, offset: u64) -> VfsResult<()> {
        let stream = {
            let mut session = self.session.lock().await;
            session.retr_from(&self.path, offset).await?
        };
        tracing::debug!(path = %self.path, offset, "opened transfer");
        self.stream = Some(stream);
        self.committed = offset;
        self.requested = offset;
        self.lookback.reset(offset);
        Ok(())
    }

    /// Hand the open transfer, if any, to a background task that closes it.
    ///
    /// Closing a transfer can take as long as a network round trip, and the
    /// caller is about to start a new one; we never wait for it.
    fn release_stream(&mut self) {
        if let Some(stream) = self.stream.take() {
            detach_close(self.path.clone(), stream);
        }
    }
}

#[async_trait]
impl<T: FtpTransport + 'static> FileHandle for FtpFile<T> {
    async fn read(&mut self, buf: &mut [u8]) -> VfsResult<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        if self.requested != self.committed {
            if let Some(n) = self.lookback.slice_from(self.requested, buf) {
                self.requested += n as u64;
                return Ok(n);
            }
            tracing::trace!(
                path = %self.path,
                from = self.committed,
                to = self.requested,
                "seek outside look-back window"
            );
            self.release_stream();
        }

        if self.stream.is_none() {
            self.open_stream(self.requested).await?;
        }
        let Some(stream) = self.stream.as_mut() else {
            return Err(TransportError::protocol("transfer vanished after open").into());
        };

        let n = stream.read(buf).await.map_err(TransportError::from)?;
        self.lookback.append(&buf[..n]);
        self.committed += n as u64;
        self.requested = self.committed;
        Ok(n)
    }

    fn seek(&mut self, pos: SeekFrom) -> VfsResult<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => i128::from(offset),
            SeekFrom::Current(delta) => i128::from(self.committed) + i128::from(delta),
            SeekFrom::End(delta) => i128::from(self.attr.size) + i128::from(delta),
        };

        let Ok(target) = u64::try_from(target) else {
            return Err(VfsError::InvalidArgument {
                target,
                position: self.committed,
            });
        };

        if target == self.committed {
            return Ok(self.committed);
        }
        self.requested = target;
        Ok(target)
    }

    fn readdir(&self, _count: i64) -> VfsResult<Vec<FileAttr>> {
        Err(VfsError::readdir_on_file(&self.path))
    }

    fn stat(&self) -> VfsResult<FileAttr> {
        Ok(self.attr.clone())
    }

    async fn close(&mut self) -> VfsResult<()> {
        let Some(stream) = self.stream.take() else {
            return Ok(());
        };
        stream.close().await?;
        tracing::debug!(path = %self.path, offset = self.committed, "closed transfer");
        Ok(())
    }
}

impl<T: FtpTransport> Drop for FtpFile<T> {
    fn drop(&mut self) {
        let Some(stream) = self.stream.take() else {
            return;
        };
        // Outside a runtime the stream is simply dropped, which still closes
        // its connection.
        if tokio::runtime::Handle::try_current().is_ok() {
            detach_close(std::mem::take(&mut self.path), stream);
        }
    }
}

/// Close `stream` on its own task. Failures are logged and otherwise ignored.
fn detach_close(path: String, stream: Box<dyn DataStream>) {
    tokio::spawn(async move {
        if let Err(e) = stream.close().await {
            tracing::debug!(path = %path, error = %e, "abandoned transfer closed with error");
        }
    });
}
