//! In-memory FTP transport.
//!
//! Serves a fixed tree of files and directories without any network. Used
//! for testing and for exercising the filesystem without a server. Counts
//! every protocol primitive it is asked for so callers can assert on round
//! trips.

use async_trait::async_trait;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::task::{Context, Poll};
use std::time::SystemTime;
use tokio::io::{AsyncRead, ReadBuf};

use super::error::{TransportError, TransportResult};
use super::{DataStream, EntryKind, FtpTransport, RemoteEntry};

/// Node in the in-memory tree.
#[derive(Debug, Clone)]
enum Node {
    File {
        data: Arc<Vec<u8>>,
        modified: Option<SystemTime>,
    },
    Directory {
        /// Full paths of children, in insertion order.
        children: Vec<String>,
    },
}

/// Round-trip counters shared between a [`MemoryTransport`] and its streams.
#[derive(Debug, Default)]
pub struct MemoryStats {
    lists: AtomicUsize,
    cwds: AtomicUsize,
    retrs: AtomicUsize,
    closes: AtomicUsize,
    last_retr_offset: AtomicU64,
}

impl MemoryStats {
    /// Number of `list` calls.
    pub fn lists(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }

    /// Number of `change_dir` calls.
    pub fn cwds(&self) -> usize {
        self.cwds.load(Ordering::SeqCst)
    }

    /// Number of streams successfully opened.
    pub fn retrs(&self) -> usize {
        self.retrs.load(Ordering::SeqCst)
    }

    /// Number of streams whose `close` has completed.
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Offset passed to the most recent successful `retr_from`.
    pub fn last_retr_offset(&self) -> u64 {
        self.last_retr_offset.load(Ordering::SeqCst)
    }

    /// Total protocol round trips of any kind.
    pub fn round_trips(&self) -> usize {
        self.lists() + self.cwds() + self.retrs()
    }
}

/// FTP transport backed by an in-memory tree.
///
/// Mimics common server behavior: listing a file yields one entry named by
/// the listed path, listing a missing path yields an empty list, and `CWD`
/// or `RETR` on anything unsuitable is rejected with 550.
#[derive(Debug)]
pub struct MemoryTransport {
    nodes: HashMap<String, Node>,
    list_errors: HashMap<String, u16>,
    stats: Arc<MemoryStats>,
    chunk_size: Option<usize>,
    stall_close: bool,
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTransport {
    /// Create a transport with an empty root directory.
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            "/".to_string(),
            Node::Directory {
                children: Vec::new(),
            },
        );
        Self {
            nodes,
            list_errors: HashMap::new(),
            stats: Arc::new(MemoryStats::default()),
            chunk_size: None,
            stall_close: false,
        }
    }

    /// Add a directory (and any missing parents).
    pub fn with_dir(mut self, path: &str) -> Self {
        self.ensure_dir(&normalize(path));
        self
    }

    /// Add a file (and any missing parents).
    pub fn with_file(self, path: &str, data: impl Into<Vec<u8>>) -> Self {
        self.insert_file(path, data.into(), None)
    }

    /// Add a file with a modification time.
    pub fn with_file_modified(
        self,
        path: &str,
        data: impl Into<Vec<u8>>,
        modified: SystemTime,
    ) -> Self {
        self.insert_file(path, data.into(), Some(modified))
    }

    /// Make `list(path)` fail with the given reply code.
    pub fn with_list_error(mut self, path: &str, code: u16) -> Self {
        self.list_errors.insert(normalize(path), code);
        self
    }

    /// Deliver at most `size` bytes per stream read, like a slow link.
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = Some(size.max(1));
        self
    }

    /// Make every stream's `close` hang forever.
    pub fn with_stalled_close(mut self) -> Self {
        self.stall_close = true;
        self
    }

    /// Shared round-trip counters.
    pub fn stats(&self) -> Arc<MemoryStats> {
        Arc::clone(&self.stats)
    }

    fn insert_file(mut self, path: &str, data: Vec<u8>, modified: Option<SystemTime>) -> Self {
        let path = normalize(path);
        self.attach(&path);
        self.nodes.insert(
            path,
            Node::File {
                data: Arc::new(data),
                modified,
            },
        );
        self
    }

    fn ensure_dir(&mut self, path: &str) {
        if self.nodes.contains_key(path) {
            return;
        }
        self.attach(path);
        self.nodes.insert(
            path.to_string(),
            Node::Directory {
                children: Vec::new(),
            },
        );
    }

    /// Register `path` as a child of its parent, creating the parent.
    fn attach(&mut self, path: &str) {
        let Some(parent) = parent_of(path) else {
            return;
        };
        self.ensure_dir(&parent);
        if let Some(Node::Directory { children }) = self.nodes.get_mut(&parent)
            && !children.iter().any(|c| c == path)
        {
            children.push(path.to_string());
        }
    }

    fn entry_for(&self, full_path: &str, name: String) -> Option<RemoteEntry> {
        match self.nodes.get(full_path)? {
            Node::File { data, modified } => Some(RemoteEntry {
                name,
                size: data.len() as u64,
                modified: *modified,
                kind: EntryKind::File,
            }),
            Node::Directory { .. } => Some(RemoteEntry::directory(name)),
        }
    }
}

#[async_trait]
impl FtpTransport for MemoryTransport {
    async fn list(&mut self, path: &str) -> TransportResult<Vec<RemoteEntry>> {
        self.stats.lists.fetch_add(1, Ordering::SeqCst);
        let normalized = normalize(path);

        if let Some(code) = self.list_errors.get(&normalized) {
            return Err(TransportError::rejected(*code, format!("LIST {} failed", path)));
        }

        match self.nodes.get(&normalized) {
            Some(Node::File { .. }) => Ok(self
                .entry_for(&normalized, path.to_string())
                .into_iter()
                .collect()),
            Some(Node::Directory { children }) => Ok(children
                .iter()
                .filter_map(|child| self.entry_for(child, base_name(child).to_string()))
                .collect()),
            None => Ok(Vec::new()),
        }
    }

    async fn change_dir(&mut self, path: &str) -> TransportResult<()> {
        self.stats.cwds.fetch_add(1, Ordering::SeqCst);
        match self.nodes.get(&normalize(path)) {
            Some(Node::Directory { .. }) => Ok(()),
            _ => Err(TransportError::rejected(
                550,
                format!("{}: No such file or directory", path),
            )),
        }
    }

    async fn retr_from(&mut self, path: &str, offset: u64) -> TransportResult<Box<dyn DataStream>> {
        let data = match self.nodes.get(&normalize(path)) {
            Some(Node::File { data, .. }) => Arc::clone(data),
            Some(Node::Directory { .. }) => {
                return Err(TransportError::rejected(550, format!("{}: Not a regular file", path)));
            }
            None => {
                return Err(TransportError::rejected(
                    550,
                    format!("{}: No such file or directory", path),
                ));
            }
        };

        self.stats.retrs.fetch_add(1, Ordering::SeqCst);
        self.stats.last_retr_offset.store(offset, Ordering::SeqCst);

        let pos = usize::try_from(offset).unwrap_or(usize::MAX).min(data.len());
        Ok(Box::new(MemoryStream {
            data,
            pos,
            chunk_size: self.chunk_size,
            stall_close: self.stall_close,
            stats: Arc::clone(&self.stats),
        }))
    }
}

/// Stream over one in-memory file.
struct MemoryStream {
    data: Arc<Vec<u8>>,
    pos: usize,
    chunk_size: Option<usize>,
    stall_close: bool,
    stats: Arc<MemoryStats>,
}

impl AsyncRead for MemoryStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let start = self.pos;
        let mut n = (self.data.len() - start).min(buf.remaining());
        if let Some(chunk) = self.chunk_size {
            n = n.min(chunk);
        }
        buf.put_slice(&self.data[start..start + n]);
        self.pos += n;
        Poll::Ready(Ok(()))
    }
}

impl DataStream for MemoryStream {
    fn close(self: Box<Self>) -> BoxFuture<'static, TransportResult<()>> {
        let stats = Arc::clone(&self.stats);
        let stall = self.stall_close;
        Box::pin(async move {
            if stall {
                std::future::pending::<()>().await;
            }
            stats.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }
}

/// Normalize a path: leading `/`, no trailing `/`, no empty components.
fn normalize(path: &str) -> String {
    let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
    format!("/{}", parts.join("/"))
}

fn parent_of(path: &str) -> Option<String> {
    if path == "/" {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some("/".to_string()),
        Some(idx) => Some(path[..idx].to_string()),
        None => None,
    }
}

fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
