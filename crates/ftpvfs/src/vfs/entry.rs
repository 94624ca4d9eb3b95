//! Remote entry → [`FileAttr`] mapping.
//!
//! Name, size and modification time pass straight through. Links are
//! reported as files; the mode comes from [`synthesized_mode`].

use crate::transport::{EntryKind, RemoteEntry};

use super::types::{FileAttr, FileType, synthesized_mode};

impl From<EntryKind> for FileType {
    fn from(kind: EntryKind) -> Self {
        match kind {
            EntryKind::Directory => FileType::Directory,
            EntryKind::File | EntryKind::Link => FileType::File,
        }
    }
}

impl From<RemoteEntry> for FileAttr {
    fn from(entry: RemoteEntry) -> Self {
        let kind = FileType::from(entry.kind);
        Self {
            name: entry.name,
            size: entry.size,
            kind,
            mode: synthesized_mode(kind),
            mtime: entry.modified,
        }
    }
}

impl From<&RemoteEntry> for FileAttr {
    fn from(entry: &RemoteEntry) -> Self {
        Self::from(entry.clone())
    }
}
