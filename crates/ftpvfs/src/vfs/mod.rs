//! Virtual filesystem over an FTP session.
//!
//! Key components:
//!
//! - [`FtpFs`] - Opens paths and classifies them as files or directories
//! - [`FtpFile`] - Seekable reader over forward-only transfers
//! - [`FtpDir`] - Immutable directory listing
//! - [`Lookback`] - Ring buffer that makes small backward seeks free
//!
//! ## Design Decisions
//!
//! - **Lazy seeks**: `seek` only records the target; the next `read` decides
//!   whether to replay buffered bytes or start a new transfer.
//! - **Listing order is kept**: directory handles never sort.
//! - **End of transfer is end of file**: the size from the listing is
//!   reported by `stat`, but reads stop when the server stops sending.

mod dir;
mod entry;
mod error;
mod file;
mod fs;
mod handle;
mod lookback;
mod types;

pub use dir::FtpDir;
pub use error::{VfsError, VfsResult};
pub use file::FtpFile;
pub use fs::FtpFs;
pub use handle::FileHandle;
pub use lookback::Lookback;
pub use types::{FileAttr, FileType, synthesized_mode};
