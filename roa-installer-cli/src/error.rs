//! CLI error type.

use std::fmt;

use roa_installer::InstallerError;

/// Errors that end the `roainstaller` process.
#[derive(Debug)]
pub enum CliError {
    /// The installer engine failed.
    Installer(InstallerError),
    /// The async runtime or process environment could not be set up.
    Runtime(String),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Installer(InstallerError::Blocked { .. }) => 3,
            CliError::Installer(InstallerError::Config(_) | InstallerError::Settings { .. }) => 4,
            CliError::Installer(_) => 1,
            CliError::Runtime(_) => 5,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Installer(e) => write!(f, "{}", e),
            CliError::Runtime(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Installer(e) => Some(e),
            CliError::Runtime(_) => None,
        }
    }
}

impl From<InstallerError> for CliError {
    fn from(e: InstallerError) -> Self {
        CliError::Installer(e)
    }
}
