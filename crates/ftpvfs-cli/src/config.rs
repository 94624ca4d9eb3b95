//! Configuration file loading.
//!
//! The file is a RON `FtpConfig`; every field is optional:
//!
//! ```ron
//! (
//!     host: "ftp.example.org",
//!     port: 2121,
//!     passive_use_control_host: false,
//! )
//! ```

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use ftpvfs_client::FtpConfig;

/// `<config_dir>/ftpvfs/config.ron`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("ftpvfs").join("config.ron"))
}

/// Load the file named on the command line, or the default file if present.
///
/// A missing default file yields the built-in defaults. A missing explicit
/// file is an error.
pub fn load(explicit: Option<&str>) -> Result<FtpConfig> {
    if let Some(path) = explicit {
        let path: PathBuf = shellexpand::tilde(path).as_ref().into();
        return read_config(&path);
    }

    match default_config_path() {
        Some(path) if path.exists() => read_config(&path),
        _ => Ok(FtpConfig::default()),
    }
}

/// Parse one RON config file.
pub fn read_config(path: &Path) -> Result<FtpConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: FtpConfig =
        ron::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?;
    tracing::debug!(path = %path.display(), ?config, "loaded config");
    Ok(config)
}

/// Command-line values that win over the file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl Overrides {
    pub fn apply(self, mut config: FtpConfig) -> FtpConfig {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(user) = self.user {
            config.username = user;
        }
        if let Some(password) = self.password {
            config.password = password;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_partial_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"(host: "ftp.example.org", port: 2121)"#).unwrap();

        let config = read_config(file.path()).unwrap();
        assert_eq!(config.host, "ftp.example.org");
        assert_eq!(config.port, 2121);
        assert_eq!(config.username, "anonymous");
        assert!(config.passive_use_control_host);
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.ron");
        assert!(load(Some(missing.to_str().unwrap())).is_err());
    }

    #[test]
    fn test_malformed_config_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "(port: \"not a number\")").unwrap();
        let err = read_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("parsing config"));
    }

    #[test]
    fn test_overrides_win() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"(host: "from-file", username: "amy")"#).unwrap();
        let config = read_config(file.path()).unwrap();

        let config = Overrides {
            host: Some("from-cli".into()),
            password: Some("secret".into()),
            ..Default::default()
        }
        .apply(config);

        assert_eq!(config.host, "from-cli");
        assert_eq!(config.username, "amy");
        assert_eq!(config.password, "secret");
        assert_eq!(config.port, 21);
    }
}
