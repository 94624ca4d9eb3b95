//! # ftpvfs
//!
//! A seekable, hierarchical virtual filesystem over a sequential FTP session.
//!
//! FTP only knows how to stream a file forward from some offset (`REST` +
//! `RETR`) until the data connection is closed. This crate turns that into
//! handles that support `seek` and `read` at arbitrary positions, plus
//! directory handles built from `LIST` output:
//!
//! - [`FtpFs`] - Entry point. `open(path)` lists the path and classifies it.
//! - [`FtpFile`] - Seekable reader with a small look-back buffer.
//! - [`FtpDir`] - Pre-materialized directory listing.
//! - [`FtpTransport`] - The seam to the protocol session. See `ftpvfs-client`
//!   for a network implementation and [`MemoryTransport`] for an in-process one.

pub mod constants;
pub mod transport;
pub mod vfs;

pub use transport::{
    DataStream, EntryKind, FtpTransport, MemoryStats, MemoryTransport, RemoteEntry,
    TransportError, TransportResult,
};
pub use vfs::{
    FileAttr, FileHandle, FileType, FtpDir, FtpFile, FtpFs, Lookback, VfsError, VfsResult,
};
