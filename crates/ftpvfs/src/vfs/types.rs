//! Core VFS types.

use std::time::SystemTime;

use crate::constants::{DEFAULT_PERM, MODE_DIR};

/// File type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// Regular file.
    File,
    /// Directory.
    Directory,
}

impl FileType {
    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, FileType::File)
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, FileType::Directory)
    }
}

/// File attributes (metadata).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttr {
    /// Entry name. For a directory handle, the path it was opened with.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// File type.
    pub kind: FileType,
    /// Mode bits: permissions plus [`MODE_DIR`] for directories.
    pub mode: u32,
    /// Last modification time, when known.
    pub mtime: Option<SystemTime>,
}

impl FileAttr {
    /// Attributes for a regular file.
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            kind: FileType::File,
            mode: synthesized_mode(FileType::File),
            mtime: None,
        }
    }

    /// Attributes for a directory.
    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: 0,
            kind: FileType::Directory,
            mode: synthesized_mode(FileType::Directory),
            mtime: None,
        }
    }

    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    /// Permission bits only (e.g., 0o644).
    pub fn perm(&self) -> u32 {
        self.mode & 0o777
    }
}

/// Mode bits reported for an entry of the given kind.
///
/// FTP has no permission model we can rely on, so every entry is `0o644`,
/// with the directory bit set for directories.
pub fn synthesized_mode(kind: FileType) -> u32 {
    match kind {
        FileType::File => DEFAULT_PERM,
        FileType::Directory => DEFAULT_PERM | MODE_DIR,
    }
}
