//! The filesystem entry point.

use std::sync::Arc;
use tokio::sync::Mutex;

use super::dir::FtpDir;
use super::file::FtpFile;
use super::handle::FileHandle;
use super::types::FileAttr;
use super::{VfsError, VfsResult};
use crate::transport::{FtpTransport, RemoteEntry};

/// A filesystem view of one FTP session.
///
/// Owns the session. Handles returned by [`FtpFs::open`] share it, and every
/// protocol command goes through one mutex, so commands never interleave.
/// That does not make concurrent use of handles sensible: an FTP session
/// runs one transfer at a time.
pub struct FtpFs<T: FtpTransport> {
    session: Arc<Mutex<T>>,
}

impl<T: FtpTransport> std::fmt::Debug for FtpFs<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FtpFs").finish_non_exhaustive()
    }
}

impl<T: FtpTransport + 'static> FtpFs<T> {
    /// Take ownership of a logged-in session.
    pub fn new(session: T) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
        }
    }

    /// The shared session, for commands outside the filesystem's scope.
    pub fn session(&self) -> Arc<Mutex<T>> {
        Arc::clone(&self.session)
    }

    /// Open `path` as a file or a directory.
    ///
    /// Lists `path` and classifies the result:
    ///
    /// - one non-directory entry named exactly `path`: a file
    /// - empty listing: an empty directory if `path` can be entered,
    ///   otherwise [`VfsError::NotFound`]
    /// - anything else: a directory with the listing as-is
    ///
    /// Listing failures are returned unchanged.
    pub async fn open(&self, path: &str) -> VfsResult<Box<dyn FileHandle>> {
        let mut session = self.session.lock().await;
        let entries = session.list(path).await?;

        if entries.is_empty() {
            // Empty directory, or nothing there at all?
            if let Err(e) = session.change_dir(path).await {
                tracing::debug!(path, error = %e, "empty listing and not a directory");
                return Err(VfsError::not_found(path));
            }
            tracing::debug!(path, "opened empty directory");
            return Ok(Box::new(FtpDir::new(path, entries)));
        }
        drop(session);

        if let Some(entry) = single_file(&entries, path) {
            tracing::debug!(path, size = entry.size, "opened file");
            let attr = FileAttr::from(entry);
            return Ok(Box::new(FtpFile::new(self.session(), path, attr)));
        }

        tracing::debug!(path, entries = entries.len(), "opened directory");
        Ok(Box::new(FtpDir::new(path, entries)))
    }
}

/// The listing's only entry, if it is a file named exactly `path`.
///
/// A directory holding one file is listed the same way, but with the
/// file's own name rather than the listed path.
fn single_file<'a>(entries: &'a [RemoteEntry], path: &str) -> Option<&'a RemoteEntry> {
    match entries {
        [entry] if !entry.is_dir() && entry.name == path => Some(entry),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{EntryKind, MemoryTransport, TransportError};

    #[test]
    fn test_single_file_classification() {
        let file = [RemoteEntry::file("/d/a.txt", 12)];
        assert!(single_file(&file, "/d/a.txt").is_some());
        assert!(single_file(&file, "/d").is_none());

        let dir = [RemoteEntry::directory("/d/a.txt")];
        assert!(single_file(&dir, "/d/a.txt").is_none());

        let two = [RemoteEntry::file("/x", 1), RemoteEntry::file("/x", 1)];
        assert!(single_file(&two, "/x").is_none());

        let link = [RemoteEntry {
            name: "/l".into(),
            size: 3,
            modified: None,
            kind: EntryKind::Link,
        }];
        assert!(single_file(&link, "/l").is_some());
    }

    #[tokio::test]
    async fn test_open_file() {
        let transport = MemoryTransport::new().with_file("/d/a.txt", b"hello world!".to_vec());
        let stats = transport.stats();
        let fs = FtpFs::new(transport);

        let handle = fs.open("/d/a.txt").await.unwrap();
        let attr = handle.stat().unwrap();
        assert!(attr.is_file());
        assert_eq!(attr.size, 12);
        assert_eq!(attr.name, "/d/a.txt");
        assert_eq!(stats.lists(), 1);
        assert_eq!(stats.cwds(), 0);
        assert_eq!(stats.retrs(), 0);
    }

    #[tokio::test]
    async fn test_directory_with_single_file_is_a_directory() {
        let fs = FtpFs::new(MemoryTransport::new().with_file("/only/one.txt", b"1".to_vec()));
        let handle = fs.open("/only").await.unwrap();
        assert!(handle.stat().unwrap().is_dir());
        let entries = handle.readdir(0).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "one.txt");
    }

    #[tokio::test]
    async fn test_open_empty_directory() {
        let transport = MemoryTransport::new().with_dir("/empty");
        let stats = transport.stats();
        let fs = FtpFs::new(transport);

        let handle = fs.open("/empty").await.unwrap();
        assert!(handle.stat().unwrap().is_dir());
        assert!(handle.readdir(0).unwrap().is_empty());
        assert_eq!(stats.lists(), 1);
        assert_eq!(stats.cwds(), 1);
    }

    #[tokio::test]
    async fn test_open_missing_is_not_found() {
        let fs = FtpFs::new(MemoryTransport::new());
        let err = fs.open("/missing").await.err().unwrap();
        assert!(matches!(err, VfsError::NotFound(ref p) if p == "/missing"));
    }

    #[tokio::test]
    async fn test_list_failure_passes_through() {
        let transport = MemoryTransport::new()
            .with_dir("/d")
            .with_list_error("/d", 421);
        let stats = transport.stats();
        let fs = FtpFs::new(transport);

        let err = fs.open("/d").await.err().unwrap();
        match err {
            VfsError::Transport(TransportError::Rejected { code, .. }) => assert_eq!(code, 421),
            other => panic!("expected transport error, got {:?}", other),
        }
        assert_eq!(stats.cwds(), 0);
    }

    #[tokio::test]
    async fn test_open_does_not_hold_session() {
        let fs = FtpFs::new(
            MemoryTransport::new()
                .with_file("/a", b"aaaa".to_vec())
                .with_file("/b", b"bbbb".to_vec()),
        );
        let mut a = fs.open("/a").await.unwrap();
        let mut b = fs.open("/b").await.unwrap();

        let mut buf = [0u8; 4];
        assert_eq!(a.read(&mut buf).await.unwrap(), 4);
        assert_eq!(&buf, b"aaaa");
        a.close().await.unwrap();
        assert_eq!(b.read(&mut buf).await.unwrap(), 4);
        assert_eq!(&buf, b"bbbb");
    }
}
