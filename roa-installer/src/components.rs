//! Optional components and post-install actions.
//!
//! After the download pipeline drains in install mode the selected optional
//! components are set up: bundled silent installers run strictly one after
//! another on a single background worker, then the requested shortcuts are
//! created.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{InstallerError, InstallerResult};
use crate::platform::{PlatformActions, ShortcutKind};

/// Optional component offered by the installer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Component {
    /// Visual C++ runtime (Windows only).
    VcRedist,
    /// OpenAL sound runtime (Windows only).
    OpenAl,
    /// Application / start menu entry.
    MenuEntry,
    /// Desktop shortcut.
    DesktopShortcut,
}

impl Component {
    /// All components in presentation order.
    pub const ALL: [Component; 4] = [
        Component::VcRedist,
        Component::OpenAl,
        Component::MenuEntry,
        Component::DesktopShortcut,
    ];

    /// Stable identifier used on the command line.
    pub fn id(&self) -> &'static str {
        match self {
            Self::VcRedist => "vcredist",
            Self::OpenAl => "openal",
            Self::MenuEntry => "menu",
            Self::DesktopShortcut => "desktop",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::VcRedist => "Microsoft Visual C++ runtime",
            Self::OpenAl => "OpenAL sound runtime",
            Self::MenuEntry => "Menu entry",
            Self::DesktopShortcut => "Desktop shortcut",
        }
    }

    /// Whether the component only applies to Windows hosts.
    pub fn windows_only(&self) -> bool {
        matches!(self, Self::VcRedist | Self::OpenAl)
    }

    /// Shortcut created for this component, if any.
    pub fn shortcut(&self) -> Option<ShortcutKind> {
        match self {
            Self::MenuEntry => Some(ShortcutKind::Menu),
            Self::DesktopShortcut => Some(ShortcutKind::Desktop),
            Self::VcRedist | Self::OpenAl => None,
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Component {
    type Err = InstallerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Component::ALL
            .iter()
            .copied()
            .find(|c| c.id().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| InstallerError::Config(format!("unknown component '{}'", s)))
    }
}

/// A bundled installer run without user interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SilentInstaller {
    pub executable: PathBuf,
    pub arguments: Vec<String>,
}

impl SilentInstaller {
    pub fn new<I, S>(executable: impl Into<PathBuf>, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            executable: executable.into(),
            arguments: arguments.into_iter().map(Into::into).collect(),
        }
    }
}

/// Runs external processes and waits for them.
pub trait ProcessRunner: Send + Sync {
    /// Run `installer` to completion and return its exit code.
    fn run(&self, installer: &SilentInstaller) -> InstallerResult<Option<i32>>;
}

/// Process runner using `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessRunner;

impl ProcessRunner for SystemProcessRunner {
    fn run(&self, installer: &SilentInstaller) -> InstallerResult<Option<i32>> {
        let status = Command::new(&installer.executable)
            .args(&installer.arguments)
            .status()
            .map_err(|e| InstallerError::fs("run", &installer.executable, e))?;
        Ok(status.code())
    }
}

/// Outcome of one silent installer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerOutcome {
    pub executable: PathBuf,
    /// Exit code, `None` when killed by a signal or not startable.
    pub exit_code: Option<i32>,
    /// Whether the process could be started at all.
    pub started: bool,
}

/// Run `queue` one installer at a time on a single background worker.
///
/// Outcomes are returned in queue order. A failing installer is logged and
/// does not stop the rest of the queue.
pub async fn run_installers(
    runner: Arc<dyn ProcessRunner>,
    queue: Vec<SilentInstaller>,
) -> Vec<InstallerOutcome> {
    if queue.is_empty() {
        return Vec::new();
    }

    let worker = tokio::task::spawn_blocking(move || {
        queue
            .iter()
            .map(|installer| {
                tracing::info!(executable = %installer.executable.display(), "Running silent installer");
                match runner.run(installer) {
                    Ok(exit_code) => {
                        if exit_code != Some(0) {
                            tracing::warn!(
                                executable = %installer.executable.display(),
                                ?exit_code,
                                "Silent installer reported failure"
                            );
                        }
                        InstallerOutcome {
                            executable: installer.executable.clone(),
                            exit_code,
                            started: true,
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Silent installer could not be started");
                        InstallerOutcome {
                            executable: installer.executable.clone(),
                            exit_code: None,
                            started: false,
                        }
                    }
                }
            })
            .collect::<Vec<_>>()
    });

    match worker.await {
        Ok(outcomes) => outcomes,
        Err(e) => {
            tracing::error!(error = %e, "Component worker panicked");
            Vec::new()
        }
    }
}

/// Summary of post-install work.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostInstallReport {
    pub installers: Vec<InstallerOutcome>,
    pub shortcuts: Vec<PathBuf>,
}

/// Install the selected optional components under `root`.
///
/// Silent installers run first; shortcuts are created once the installer
/// queue has drained. Shortcut failures are logged and skipped.
pub async fn install_components(
    platform: &dyn PlatformActions,
    runner: Arc<dyn ProcessRunner>,
    components: &BTreeSet<Component>,
    root: &Path,
) -> PostInstallReport {
    let queue = platform.component_installers(components, root);
    let installers = run_installers(runner, queue).await;

    let kinds: Vec<ShortcutKind> = components.iter().filter_map(Component::shortcut).collect();
    let shortcuts = create_shortcuts(platform, &kinds, root);

    PostInstallReport {
        installers,
        shortcuts,
    }
}

/// Create each shortcut in `kinds`, returning the paths that were written.
pub fn create_shortcuts(
    platform: &dyn PlatformActions,
    kinds: &[ShortcutKind],
    root: &Path,
) -> Vec<PathBuf> {
    kinds
        .iter()
        .filter_map(|kind| match platform.create_shortcut(*kind, root) {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(?kind, error = %e, "Failed to create shortcut");
                None
            }
        })
        .collect()
}
