//! FTP session for `ftpvfs`.
//!
//! [`FtpSession`] speaks just enough FTP for the filesystem: login, passive
//! data connections, `LIST`, `CWD` and resumable `RETR`.
//!
//! ```ignore
//! let session = FtpSession::connect(&FtpConfig::new("ftp.example.org")).await?;
//! let fs = FtpFs::new(session);
//! let mut file = fs.open("/pub/README").await?;
//! ```

pub mod config;
pub mod constants;
pub mod listing;
pub mod reply;
mod session;

pub use config::FtpConfig;
pub use reply::Reply;
pub use session::{FtpDataStream, FtpSession};
