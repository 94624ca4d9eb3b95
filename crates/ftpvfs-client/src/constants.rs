//! Client configuration constants.

/// Default FTP control port.
pub const DEFAULT_FTP_PORT: u16 = 21;

/// Default FTP host.
pub const DEFAULT_FTP_HOST: &str = "localhost";

/// Default login for servers that allow anonymous access.
pub const DEFAULT_USERNAME: &str = "anonymous";

/// Conventional anonymous password.
pub const DEFAULT_PASSWORD: &str = "anonymous@";

/// Seconds allowed for a TCP connect (control or data).
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Seconds allowed for the server to answer a command.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 30;
