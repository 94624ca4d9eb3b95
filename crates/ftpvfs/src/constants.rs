//! Filesystem constants.
//!
//! FTP carries no permission model, so the modes reported here are a fixed
//! convention rather than data from the server.

/// Capacity of the per-handle look-back buffer, in bytes.
pub const LOOKBACK_CAPACITY: usize = 1024;

/// Permission bits reported for every remote entry (`rw-r--r--`).
pub const DEFAULT_PERM: u32 = 0o644;

/// Directory bit, as in `S_IFDIR`.
pub const MODE_DIR: u32 = 0o040000;
