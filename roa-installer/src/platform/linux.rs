//! Linux (and other Unix) installer behavior.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use super::{PlatformActions, PlatformKey, ShortcutKind, PRODUCT_NAME};
use crate::components::{Component, SilentInstaller};
use crate::error::{InstallerError, InstallerResult};

const EXTRA_DIRS: &[&str] = &[
    "launcher/bin",
    "launcher/lib",
    "launcher/bin/platforms",
    "launcher/bin/imageformats",
];

const OBSOLETE_FILES: &[&str] = &["ROALauncher", "ROALauncher.sh"];

/// Linux platform: freedesktop entries and POSIX permissions.
#[derive(Debug, Clone)]
pub struct LinuxPlatform {
    key: PlatformKey,
    home: Option<PathBuf>,
}

impl LinuxPlatform {
    /// Create the platform for `key` using the user's home directory.
    pub fn new(key: PlatformKey) -> Self {
        Self {
            key,
            home: dirs::home_dir(),
        }
    }

    /// Create the platform with shortcuts placed under `home`.
    pub fn with_home(key: PlatformKey, home: impl Into<PathBuf>) -> Self {
        Self {
            key,
            home: Some(home.into()),
        }
    }
}

/// Render a freedesktop `.desktop` entry for the launcher under `root`.
fn desktop_entry(root: &Path) -> String {
    let launcher = root.join("launcher/bin/ROALauncher.sh");
    let icon = root.join("launcher/roa.ico");
    format!(
        "[Desktop Entry]\n\
         Encoding=UTF-8\n\
         Version=1.0\n\
         Type=Application\n\
         Terminal=false\n\
         Exec=\"{}\"\n\
         Name={}\n\
         Icon={}\n",
        launcher.display(),
        PRODUCT_NAME,
        icon.display()
    )
}

impl PlatformActions for LinuxPlatform {
    fn key(&self) -> PlatformKey {
        self.key
    }

    fn extra_layout_dirs(&self) -> &'static [&'static str] {
        EXTRA_DIRS
    }

    fn obsolete_legacy_files(&self) -> &'static [&'static str] {
        OBSOLETE_FILES
    }

    fn shortcut_path(&self, kind: ShortcutKind) -> Option<PathBuf> {
        let home = self.home.as_ref()?;
        let file = format!("{}.desktop", PRODUCT_NAME);
        Some(match kind {
            ShortcutKind::Menu => home.join(".local/share/applications").join(file),
            ShortcutKind::Desktop => home.join("Desktop").join(file),
        })
    }

    fn create_shortcut(&self, kind: ShortcutKind, root: &Path) -> InstallerResult<PathBuf> {
        let path = self.shortcut_path(kind).ok_or_else(|| {
            InstallerError::Config("home directory is unknown, cannot place shortcut".to_string())
        })?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| InstallerError::fs("create", parent, e))?;
        }
        fs::write(&path, desktop_entry(root)).map_err(|e| InstallerError::fs("write", &path, e))?;
        self.set_executable_permissions(&path)?;

        tracing::info!(path = %path.display(), ?kind, "Created desktop entry");
        Ok(path)
    }

    #[cfg(unix)]
    fn set_executable_permissions(&self, path: &Path) -> InstallerResult<()> {
        use std::os::unix::fs::PermissionsExt;

        fs::set_permissions(path, fs::Permissions::from_mode(0o777))
            .map_err(|e| InstallerError::fs("set permissions on", path, e))
    }

    #[cfg(not(unix))]
    fn set_executable_permissions(&self, _path: &Path) -> InstallerResult<()> {
        Ok(())
    }

    fn component_installers(
        &self,
        _components: &BTreeSet<Component>,
        _root: &Path,
    ) -> Vec<SilentInstaller> {
        // Runtime libraries ship with the client on Linux
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_shortcut_paths() {
        let platform = LinuxPlatform::with_home(PlatformKey::LinuxX86_64, "/home/hero");
        assert_eq!(
            platform.shortcut_path(ShortcutKind::Menu).unwrap(),
            PathBuf::from("/home/hero/.local/share/applications/Relics of Annorath.desktop")
        );
        assert_eq!(
            platform.shortcut_path(ShortcutKind::Desktop).unwrap(),
            PathBuf::from("/home/hero/Desktop/Relics of Annorath.desktop")
        );
    }

    #[test]
    fn test_create_shortcut_writes_desktop_entry() {
        let home = TempDir::new().unwrap();
        let platform = LinuxPlatform::with_home(PlatformKey::LinuxX86_64, home.path());

        let path = platform
            .create_shortcut(ShortcutKind::Desktop, Path::new("/opt/roa"))
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("[Desktop Entry]\n"));
        assert!(content.contains("Exec=\"/opt/roa/launcher/bin/ROALauncher.sh\"\n"));
        assert!(content.contains("Name=Relics of Annorath\n"));
        assert!(content.contains("Icon=/opt/roa/launcher/roa.ico\n"));
    }

    #[cfg(unix)]
    #[test]
    fn test_set_executable_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let file = temp.path().join("ROALauncher.sh");
        fs::write(&file, b"#!/bin/sh\n").unwrap();

        let platform = LinuxPlatform::new(PlatformKey::LinuxX86_64);
        platform.set_executable_permissions(&file).unwrap();

        let mode = fs::metadata(&file).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o777);
    }

    #[test]
    fn test_no_silent_installers() {
        let platform = LinuxPlatform::new(PlatformKey::LinuxX86);
        let all: BTreeSet<Component> = Component::ALL.iter().copied().collect();
        assert!(platform
            .component_installers(&all, Path::new("/opt/roa"))
            .is_empty());
    }
}
