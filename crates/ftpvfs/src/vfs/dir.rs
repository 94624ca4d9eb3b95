//! Directory handle over a materialized `LIST` response.

use async_trait::async_trait;
use std::io::SeekFrom;

use super::handle::FileHandle;
use super::types::FileAttr;
use super::{VfsError, VfsResult};
use crate::transport::RemoteEntry;

/// An open directory.
///
/// Holds the listing exactly as the server returned it; nothing is
/// re-queried or re-sorted for the handle's lifetime.
#[derive(Debug, Clone)]
pub struct FtpDir {
    path: String,
    entries: Vec<FileAttr>,
}

impl FtpDir {
    /// Wrap a listing of `path`.
    pub fn new(path: impl Into<String>, entries: Vec<RemoteEntry>) -> Self {
        Self {
            path: path.into(),
            entries: entries.into_iter().map(FileAttr::from).collect(),
        }
    }

    /// The path this directory was opened with.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// All entries, in server order.
    pub fn entries(&self) -> &[FileAttr] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the directory has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl FileHandle for FtpDir {
    async fn read(&mut self, _buf: &mut [u8]) -> VfsResult<usize> {
        Err(VfsError::read_on_directory(&self.path))
    }

    fn seek(&mut self, _pos: SeekFrom) -> VfsResult<u64> {
        Err(VfsError::read_on_directory(&self.path))
    }

    /// Returns a prefix of the listing; there is no cursor, so repeated
    /// calls return the same entries.
    fn readdir(&self, count: i64) -> VfsResult<Vec<FileAttr>> {
        let take = match usize::try_from(count) {
            Ok(n) if n > 0 && n <= self.entries.len() => n,
            _ => self.entries.len(),
        };
        Ok(self.entries[..take].to_vec())
    }

    fn stat(&self) -> VfsResult<FileAttr> {
        Ok(FileAttr::directory(&self.path))
    }

    async fn close(&mut self) -> VfsResult<()> {
        Ok(())
    }
}
