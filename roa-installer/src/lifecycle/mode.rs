//! Installer modes.

use std::fmt;

/// What the installer was asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Full client installation (no argument).
    Install,
    /// Bring an existing installation up to date.
    Update,
    /// Check an existing installation and fetch what is missing.
    Verify,
    /// Recover the root if needed, drop game content and re-verify.
    Repair,
    /// Remove the whole installation.
    Uninstall,
}

impl Mode {
    /// Name used in user-facing titles.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Install => "Installation",
            Self::Update => "Update",
            Self::Verify => "Verify",
            Self::Repair => "Repair",
            Self::Uninstall => "Uninstallation",
        }
    }

    /// Whether the mode shows per-file download progress.
    pub fn reports_progress(&self) -> bool {
        matches!(self, Self::Install | Self::Update)
    }

    /// Whether the mode refuses to run without a known installation root.
    ///
    /// Repair handles a missing root itself by recovering it.
    pub fn requires_root(&self) -> bool {
        matches!(self, Self::Update | Self::Verify | Self::Uninstall)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Install => "install",
            Self::Update => "update",
            Self::Verify => "verify",
            Self::Repair => "repair",
            Self::Uninstall => "uninstall",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_properties() {
        assert!(Mode::Install.reports_progress());
        assert!(Mode::Update.reports_progress());
        assert!(!Mode::Verify.reports_progress());
        assert!(!Mode::Repair.reports_progress());

        assert!(!Mode::Install.requires_root());
        assert!(!Mode::Repair.requires_root());
        assert!(Mode::Update.requires_root());
        assert!(Mode::Verify.requires_root());
        assert!(Mode::Uninstall.requires_root());
    }
}
