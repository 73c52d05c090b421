//! Directory layout under the installation root.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{InstallerError, InstallerResult};
use crate::platform::PlatformActions;

/// Subtree holding all game content.
pub const GAME_DIR: &str = "game";

/// Directories every platform needs, relative to the root.
pub const LAYOUT_DIRS: &[&str] = &[
    "game",
    "game/bin",
    "game/data",
    "game/lib",
    "launcher",
    "launcher/platforms",
    "launcher/downloads",
    "launcher/imageformats",
    "launcher/sounds",
];

/// All layout directories for `platform`, in creation order.
pub fn layout_dirs(platform: &dyn PlatformActions) -> Vec<&'static str> {
    LAYOUT_DIRS
        .iter()
        .chain(platform.extra_layout_dirs())
        .copied()
        .collect()
}

/// Create the layout under `root`. Existing directories are left alone.
///
/// Returns the directories that had to be created.
pub fn ensure_layout(root: &Path, platform: &dyn PlatformActions) -> InstallerResult<Vec<PathBuf>> {
    let mut created = Vec::new();
    for dir in layout_dirs(platform) {
        let path = root.join(dir);
        if path.is_dir() {
            continue;
        }
        fs::create_dir_all(&path).map_err(|e| InstallerError::fs("create", &path, e))?;
        created.push(path);
    }

    if !created.is_empty() {
        tracing::debug!(count = created.len(), root = %root.display(), "Created layout directories");
    }
    Ok(created)
}

/// Recursively delete `path`. A path that does not exist counts as removed.
pub fn remove_tree(path: &Path) -> InstallerResult<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => {
            tracing::info!(path = %path.display(), "Removed directory tree");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(InstallerError::RemovalFailed {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}
