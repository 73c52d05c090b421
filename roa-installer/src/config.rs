//! Installer configuration.
//!
//! Defaults match the production download server. An optional
//! `installer.ini` next to the launcher settings can override them:
//!
//! ```ini
//! [server]
//! base_url = https://launcher.annorath-game.com/data
//! timeout_secs = 300
//!
//! [tls]
//! certs_dir = /opt/roa/launcher/certs
//! keep_system_roots = true
//!
//! [logging]
//! directory = /home/hero/.local/share/roainstaller/logs
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;

use crate::error::{InstallerError, InstallerResult};
use crate::settings::current_settings_dir;
use crate::sync::TrustConfig;

/// Production download server.
pub const DEFAULT_BASE_URL: &str = "https://launcher.annorath-game.com/data";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Pinned certificate files: intermediate issuer and root CA.
pub const CERTIFICATE_FILES: [&str; 2] = ["class2.pem", "ca.pem"];

/// File name of the optional override file.
pub const CONFIG_FILE_NAME: &str = "installer.ini";

/// Configuration for the installer engine.
#[derive(Debug, Clone, PartialEq)]
pub struct InstallerConfig {
    /// Root URL; platform folders live directly below it.
    pub base_url: String,

    /// Timeout for each HTTP request.
    pub timeout: Duration,

    /// Directory holding the pinned PEM certificates.
    pub certs_dir: PathBuf,

    /// Trust the built-in roots in addition to the pinned certificates.
    pub keep_system_roots: bool,

    /// Directory for rolling log files.
    pub log_dir: PathBuf,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            certs_dir: default_certs_dir(),
            keep_system_roots: true,
            log_dir: default_log_dir(),
        }
    }
}

impl InstallerConfig {
    /// Load the configuration from the default location.
    ///
    /// A missing file yields the defaults.
    pub fn load() -> InstallerResult<Self> {
        Self::load_from(&default_config_path()?)
    }

    /// Load the configuration from `path`, falling back to defaults for a
    /// missing file or missing keys.
    pub fn load_from(path: &Path) -> InstallerResult<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No installer config, using defaults");
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path).map_err(|e| InstallerError::Settings {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    /// Build a configuration from parsed INI content.
    pub fn from_ini(ini: &Ini) -> InstallerResult<Self> {
        let mut config = Self::default();

        if let Some(server) = ini.section(Some("server")) {
            if let Some(url) = server.get("base_url") {
                let url = url.trim();
                if !url.starts_with("https://") && !url.starts_with("http://") {
                    return Err(InstallerError::Config(format!(
                        "server.base_url must be an http(s) URL, got '{}'",
                        url
                    )));
                }
                config.base_url = url.trim_end_matches('/').to_string();
            }
            if let Some(secs) = server.get("timeout_secs") {
                let secs: u64 = secs.trim().parse().map_err(|_| {
                    InstallerError::Config(format!("server.timeout_secs is not a number: '{}'", secs))
                })?;
                config.timeout = Duration::from_secs(secs.max(1));
            }
        }

        if let Some(tls) = ini.section(Some("tls")) {
            if let Some(dir) = tls.get("certs_dir") {
                config.certs_dir = PathBuf::from(dir.trim());
            }
            if let Some(keep) = tls.get("keep_system_roots") {
                config.keep_system_roots = parse_bool(keep).ok_or_else(|| {
                    InstallerError::Config(format!(
                        "tls.keep_system_roots must be true or false, got '{}'",
                        keep
                    ))
                })?;
            }
        }

        if let Some(dir) = ini.section(Some("logging")).and_then(|s| s.get("directory")) {
            config.log_dir = PathBuf::from(dir.trim());
        }

        Ok(config)
    }

    /// Set the certificate directory.
    pub fn with_certs_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.certs_dir = dir.into();
        self
    }

    /// Trust settings for the HTTP transport.
    pub fn trust(&self) -> TrustConfig {
        TrustConfig {
            pem_files: CERTIFICATE_FILES
                .iter()
                .map(|name| self.certs_dir.join(name))
                .collect(),
            keep_system_roots: self.keep_system_roots,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Some(true),
        "false" | "no" | "0" | "off" => Some(false),
        _ => None,
    }
}

/// Default location of `installer.ini`.
pub fn default_config_path() -> InstallerResult<PathBuf> {
    Ok(current_settings_dir()?.join(CONFIG_FILE_NAME))
}

/// Certificates ship in `certs/` next to the installer binary.
fn default_certs_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("certs")))
        .unwrap_or_else(|| PathBuf::from("certs"))
}

fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("roainstaller")
        .join("logs")
}
