//! Windows installer behavior.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use super::{PlatformActions, PlatformKey, ShortcutKind, PRODUCT_NAME};
use crate::components::{Component, SilentInstaller};
use crate::error::{InstallerError, InstallerResult};

/// Files installed into the root by the old 64-bit release.
const OBSOLETE_FILES: &[&str] = &[
    "annorath.ico",
    "install.ico",
    "libeay32.dll",
    "phonon4.dll",
    "QtCore4.dll",
    "QtGui4.dll",
    "QtNetwork4.dll",
    "QtWebKit4.dll",
    "roa_en.qm",
    "roa_ger.qm",
    "ROALauncher_x64.exe",
    "ssleay32.dll",
    "torrent.dll",
    "unins000.dat",
    "unins000.exe",
    "uninstall.ico",
    "url.ico",
];

/// Windows platform: shell shortcuts and bundled redistributables.
#[derive(Debug, Clone)]
pub struct WindowsPlatform {
    key: PlatformKey,
    start_menu: Option<PathBuf>,
    desktop: Option<PathBuf>,
}

impl WindowsPlatform {
    /// Create the platform for `key` using the user's shell folders.
    pub fn new(key: PlatformKey) -> Self {
        let start_menu = std::env::var_os("APPDATA")
            .map(PathBuf::from)
            .or_else(dirs::config_dir)
            .map(|appdata| appdata.join("Microsoft/Windows/Start Menu/Programs"));

        Self {
            key,
            start_menu,
            desktop: dirs::desktop_dir(),
        }
    }

    /// Create the platform with explicit shortcut folders.
    pub fn with_folders(
        key: PlatformKey,
        start_menu: impl Into<PathBuf>,
        desktop: impl Into<PathBuf>,
    ) -> Self {
        Self {
            key,
            start_menu: Some(start_menu.into()),
            desktop: Some(desktop.into()),
        }
    }
}

/// Render a shell `.url` shortcut pointing at the launcher under `root`.
fn shell_shortcut(root: &Path) -> String {
    let target = root.join("launcher/ROALauncher.exe");
    let target = target.to_string_lossy().replace('\\', "/");
    format!(
        "[InternetShortcut]\r\nURL=file:///{}\r\nIconIndex=0\r\nIconFile={}\r\n",
        target.trim_start_matches('/'),
        target
    )
}

impl PlatformActions for WindowsPlatform {
    fn key(&self) -> PlatformKey {
        self.key
    }

    fn extra_layout_dirs(&self) -> &'static [&'static str] {
        &[]
    }

    fn obsolete_legacy_files(&self) -> &'static [&'static str] {
        // Only the 64-bit release left files in the root
        match self.key {
            PlatformKey::WindowsX86_64 => OBSOLETE_FILES,
            _ => &[],
        }
    }

    fn shortcut_path(&self, kind: ShortcutKind) -> Option<PathBuf> {
        let folder = match kind {
            ShortcutKind::Menu => self.start_menu.as_ref()?,
            ShortcutKind::Desktop => self.desktop.as_ref()?,
        };
        Some(folder.join(format!("{}.url", PRODUCT_NAME)))
    }

    fn create_shortcut(&self, kind: ShortcutKind, root: &Path) -> InstallerResult<PathBuf> {
        let path = self.shortcut_path(kind).ok_or_else(|| {
            InstallerError::Config(format!("no folder known for {:?} shortcut", kind))
        })?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| InstallerError::fs("create", parent, e))?;
        }
        fs::write(&path, shell_shortcut(root)).map_err(|e| InstallerError::fs("write", &path, e))?;

        tracing::info!(path = %path.display(), ?kind, "Created shortcut");
        Ok(path)
    }

    fn set_executable_permissions(&self, _path: &Path) -> InstallerResult<()> {
        Ok(())
    }

    fn component_installers(
        &self,
        components: &BTreeSet<Component>,
        root: &Path,
    ) -> Vec<SilentInstaller> {
        let downloads = root.join("launcher/downloads");
        components
            .iter()
            .filter_map(|component| match component {
                Component::VcRedist => Some(SilentInstaller::new(
                    downloads.join("vcredist_x64.exe"),
                    ["/q"],
                )),
                Component::OpenAl => Some(SilentInstaller::new(
                    downloads.join("oalinst.exe"),
                    ["/silent"],
                )),
                Component::MenuEntry | Component::DesktopShortcut => None,
            })
            .collect()
    }
}
