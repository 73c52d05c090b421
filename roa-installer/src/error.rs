//! Error types for the installer engine.
//!
//! Variants follow the failure classes the installer reports to the user:
//! configuration (no known installation root), transport, filesystem and
//! settings/config problems. A digest mismatch is not an error; it is the
//! normal reason for downloading a file.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for installer operations.
pub type InstallerResult<T> = Result<T, InstallerError>;

/// Classification of a failed transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Certificate chain could not be validated against the trusted roots.
    Tls,
    /// Server answered with a non-success status code.
    Status(u16),
    /// Request exceeded the configured timeout.
    Timeout,
    /// Connection-level failure (DNS, refused, reset).
    Network,
    /// Response body could not be read completely.
    Body,
}

impl std::fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tls => write!(f, "TLS certificate validation failed"),
            Self::Status(code) => write!(f, "HTTP status {}", code),
            Self::Timeout => write!(f, "timed out"),
            Self::Network => write!(f, "network error"),
            Self::Body => write!(f, "incomplete response body"),
        }
    }
}

/// Errors that can occur while installing, updating or removing the client.
#[derive(Debug, Error)]
pub enum InstallerError {
    /// No valid installation root is known, so the operation is refused.
    #[error("{operation} failed: please reinstall/repair the Relics of Annorath client")]
    Blocked { operation: &'static str },

    /// A manifest or file transfer failed.
    #[error("failed to fetch {url}: {kind} ({reason})")]
    Transport {
        url: String,
        kind: TransportErrorKind,
        reason: String,
    },

    /// A local filesystem operation failed.
    #[error("failed to {action} {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        action: &'static str,
        #[source]
        source: io::Error,
    },

    /// A directory tree could not be removed; the user has to do it by hand.
    #[error("failed to remove {}: please remove it manually", path.display())]
    RemovalFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Repair could neither recover nor obtain an installation directory.
    #[error("please select a valid installation directory or reinstall the application")]
    NoInstallPath,

    /// Persisted settings could not be read or written.
    #[error("settings error in {}: {reason}", path.display())]
    Settings { path: PathBuf, reason: String },

    /// Invalid installer configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl InstallerError {
    /// Build a filesystem error for `path`.
    pub fn fs(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            action,
            source,
        }
    }

    /// Whether this is a TLS trust failure.
    pub fn is_tls(&self) -> bool {
        matches!(
            self,
            Self::Transport {
                kind: TransportErrorKind::Tls,
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_display() {
        let err = InstallerError::Blocked { operation: "Update" };
        assert_eq!(
            err.to_string(),
            "Update failed: please reinstall/repair the Relics of Annorath client"
        );
    }

    #[test]
    fn test_transport_display_and_tls_flag() {
        let err = InstallerError::Transport {
            url: "https://example.com/a.txt".to_string(),
            kind: TransportErrorKind::Tls,
            reason: "unknown issuer".to_string(),
        };
        assert!(err.is_tls());
        assert!(err.to_string().contains("TLS certificate validation failed"));
        assert!(err.to_string().contains("unknown issuer"));

        let err = InstallerError::Transport {
            url: "https://example.com/a.txt".to_string(),
            kind: TransportErrorKind::Status(404),
            reason: "not found".to_string(),
        };
        assert!(!err.is_tls());
        assert!(err.to_string().contains("HTTP status 404"));
    }

    #[test]
    fn test_removal_failed_display() {
        let err = InstallerError::RemovalFailed {
            path: PathBuf::from("/opt/roa/game"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("/opt/roa/game"));
        assert!(err.to_string().contains("remove it manually"));
    }
}
