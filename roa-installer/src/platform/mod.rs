//! Host platform capabilities.
//!
//! Everything that differs between operating systems sits behind the
//! `PlatformActions` trait: remote URL layout, extra directories, legacy
//! leftovers, shortcut creation, file permissions and the silent installers
//! for optional components. One implementation per OS is selected at startup
//! with [`current`].

mod linux;
mod windows;

pub use linux::LinuxPlatform;
pub use windows::WindowsPlatform;

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::components::{Component, SilentInstaller};
use crate::error::InstallerResult;

/// Display name used for shortcuts and menu entries.
pub const PRODUCT_NAME: &str = "Relics of Annorath";

/// Operating system and CPU word size of the client build to install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformKey {
    LinuxX86,
    LinuxX86_64,
    WindowsX86,
    WindowsX86_64,
}

impl PlatformKey {
    /// Resolve the key for the running host.
    ///
    /// Hosts other than Windows are served the Linux builds.
    pub fn detect() -> Self {
        let wide = cfg!(target_pointer_width = "64");
        match (cfg!(windows), wide) {
            (true, true) => Self::WindowsX86_64,
            (true, false) => Self::WindowsX86,
            (false, true) => Self::LinuxX86_64,
            (false, false) => Self::LinuxX86,
        }
    }

    /// Path segment used on the download server.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LinuxX86 => "linux_x86",
            Self::LinuxX86_64 => "linux_x86_64",
            Self::WindowsX86 => "windows_x86",
            Self::WindowsX86_64 => "windows_x86_64",
        }
    }

    /// Whether this key names a Windows build.
    pub fn is_windows(&self) -> bool {
        matches!(self, Self::WindowsX86 | Self::WindowsX86_64)
    }

    /// URL of the manifest for this platform under `base_url`.
    pub fn manifest_url(&self, base_url: &str) -> String {
        format!(
            "{}/{key}/launcher/{key}.txt",
            base_url.trim_end_matches('/'),
            key = self.as_str()
        )
    }

    /// URL of a client file for this platform under `base_url`.
    pub fn file_url(&self, base_url: &str, relative_path: &str) -> String {
        format!(
            "{}/{}/{}",
            base_url.trim_end_matches('/'),
            self.as_str(),
            relative_path.trim_start_matches('/')
        )
    }
}

impl fmt::Display for PlatformKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of launcher shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShortcutKind {
    /// Application menu / start menu entry.
    Menu,
    /// Icon on the user's desktop.
    Desktop,
}

/// Operating-system specific behavior of the installer.
pub trait PlatformActions: Send + Sync {
    /// Platform key used for remote URLs.
    fn key(&self) -> PlatformKey;

    /// Manifest URL under `base_url`.
    fn manifest_url(&self, base_url: &str) -> String {
        self.key().manifest_url(base_url)
    }

    /// URL of `relative_path` under `base_url`.
    fn file_url(&self, base_url: &str, relative_path: &str) -> String {
        self.key().file_url(base_url, relative_path)
    }

    /// Layout directories needed only on this platform, relative to the root.
    fn extra_layout_dirs(&self) -> &'static [&'static str];

    /// Files left in the root by the legacy release that must be deleted.
    fn obsolete_legacy_files(&self) -> &'static [&'static str];

    /// Where a shortcut of `kind` lives, if the location is known.
    fn shortcut_path(&self, kind: ShortcutKind) -> Option<PathBuf>;

    /// Create a shortcut of `kind` launching the client under `root`.
    fn create_shortcut(&self, kind: ShortcutKind, root: &Path) -> InstallerResult<PathBuf>;

    /// Give owner, group and others read, write and execute permission.
    fn set_executable_permissions(&self, path: &Path) -> InstallerResult<()>;

    /// Silent installers to run for the selected optional components.
    fn component_installers(
        &self,
        components: &BTreeSet<Component>,
        root: &Path,
    ) -> Vec<SilentInstaller>;
}

/// Platform implementation for the running host.
pub fn current() -> Arc<dyn PlatformActions> {
    let key = PlatformKey::detect();
    if key.is_windows() {
        Arc::new(WindowsPlatform::new(key))
    } else {
        Arc::new(LinuxPlatform::new(key))
    }
}
