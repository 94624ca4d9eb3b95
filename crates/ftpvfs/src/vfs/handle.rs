//! The handle surface returned by [`FtpFs::open`](super::FtpFs::open).

use async_trait::async_trait;
use std::io::SeekFrom;

use super::VfsResult;
use super::types::FileAttr;

/// An open file or directory.
///
/// Both kinds implement every method; the ones that make no sense for a
/// kind fail with a dedicated error ([`VfsError::ReadOnDirectory`] or
/// [`VfsError::ReaddirOnFile`]) so callers can treat handles uniformly,
/// the way an HTTP file server does.
///
/// Handles are not meant for concurrent use. Every mutating method takes
/// `&mut self`.
///
/// [`VfsError::ReadOnDirectory`]: super::VfsError::ReadOnDirectory
/// [`VfsError::ReaddirOnFile`]: super::VfsError::ReaddirOnFile
#[async_trait]
pub trait FileHandle: Send {
    /// Read up to `buf.len()` bytes at the current position.
    ///
    /// `Ok(0)` with a non-empty `buf` means end of file.
    async fn read(&mut self, buf: &mut [u8]) -> VfsResult<usize>;

    /// Move the position for the next read. Never touches the network.
    fn seek(&mut self, pos: SeekFrom) -> VfsResult<u64>;

    /// List directory entries.
    ///
    /// `count <= 0` returns every entry; otherwise at most `count`.
    fn readdir(&self, count: i64) -> VfsResult<Vec<FileAttr>>;

    /// Metadata for this handle.
    fn stat(&self) -> VfsResult<FileAttr>;

    /// Release any transfer held by the handle. Closing twice is fine.
    async fn close(&mut self) -> VfsResult<()>;

    // ========================================================================
    // Convenience methods (default implementations)
    // ========================================================================

    /// Read until end of file, appending to `out`.
    ///
    /// Returns the number of bytes appended.
    async fn read_to_end(&mut self, out: &mut Vec<u8>) -> VfsResult<usize> {
        let mut chunk = [0u8; 8192];
        let mut total = 0;
        loop {
            let n = self.read(&mut chunk).await?;
            if n == 0 {
                return Ok(total);
            }
            out.extend_from_slice(&chunk[..n]);
            total += n;
        }
    }
}
