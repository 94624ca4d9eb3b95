//! FTP connection configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::{
    DEFAULT_COMMAND_TIMEOUT_SECS, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_FTP_HOST,
    DEFAULT_FTP_PORT, DEFAULT_PASSWORD, DEFAULT_USERNAME,
};

/// FTP connection configuration.
///
/// Every field has a default, so a config file only needs the fields it
/// changes.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub connect_timeout_secs: u64,
    pub command_timeout_secs: u64,
    /// Dial the control connection's peer for passive data connections,
    /// ignoring the address in a `PASV` reply. Servers behind NAT often
    /// report a private address there.
    pub passive_use_control_host: bool,
}

impl Default for FtpConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_FTP_HOST.into(),
            port: DEFAULT_FTP_PORT,
            username: DEFAULT_USERNAME.into(),
            password: DEFAULT_PASSWORD.into(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
            passive_use_control_host: true,
        }
    }
}

impl std::fmt::Debug for FtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("command_timeout_secs", &self.command_timeout_secs)
            .field("passive_use_control_host", &self.passive_use_control_host)
            .finish()
    }
}

impl FtpConfig {
    /// Anonymous login to `host` on the default port.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Default::default()
        }
    }

    /// Set the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the login.
    pub fn with_login(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// TCP connect deadline.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Reply deadline.
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}
