//! The user-facing collaborator.
//!
//! The installer engine never renders anything itself. Whatever shows the
//! wizard, prompts and message boxes implements `Frontend`; the engine asks it
//! for choices and pushes progress and results to it.

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::components::Component;

/// Choices collected by the install wizard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallChoices {
    /// Directory to install into.
    pub root: PathBuf,
    /// Optional components to set up after the download.
    pub components: BTreeSet<Component>,
}

/// Final messages shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Verify mode finished without errors.
    Verified,
    /// Repair mode finished without errors.
    Repaired,
    /// Uninstall removed the installation.
    Uninstalled,
    /// The operation failed; `title` names it, `message` tells the user what to do.
    Failed { title: String, message: String },
}

impl Notice {
    pub fn failed(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            title: title.into(),
            message: message.into(),
        }
    }
}

/// External collaborator supplying choices and receiving status.
pub trait Frontend: Send + Sync {
    /// Ask for the install directory and components. `None` cancels.
    fn install_choices(&self, suggested_root: Option<PathBuf>) -> Option<InstallChoices>;

    /// Ask the user to pick an existing installation directory. `None` cancels.
    fn select_install_dir(&self) -> Option<PathBuf>;

    /// Confirm deleting everything under `root`.
    fn confirm_uninstall(&self, root: &std::path::Path) -> bool;

    /// Download progress: whole percent done and the file now being fetched.
    fn progress(&self, percent: u8, current_file: &str);

    /// Free-form status line (errors during install included).
    fn status(&self, text: &str);

    /// Final message of an operation.
    fn notify(&self, notice: Notice);

    /// Advance to the last wizard step.
    fn last_step(&self);
}
