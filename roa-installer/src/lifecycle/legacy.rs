//! One-time migration of installations made by the old client.
//!
//! Old installs kept game content under `files/` next to launcher libraries
//! and a handful of loose files in the root. Migration removes the leftovers,
//! moves `files/` to `game/` and clears the legacy record so it never runs
//! again.

use std::fs;
use std::path::{Path, PathBuf};

use super::layout::{remove_tree, GAME_DIR};
use crate::error::InstallerResult;
use crate::platform::PlatformActions;
use crate::settings::SettingsStore;

/// Game content directory of the old layout.
pub const LEGACY_CONTENT_DIR: &str = "files";

/// Directories of the old layout that are dropped entirely.
pub const LEGACY_DIRS: &[&str] = &["lib", "imageformats", "sounds", "downloads"];

/// Migrate the installation recorded in `legacy`, if any.
///
/// Returns the migrated root. Cleanup failures are logged and skipped; only
/// failing to clear the legacy record is an error, since migration would
/// otherwise repeat on every start.
pub fn migrate_legacy(
    legacy: &dyn SettingsStore,
    platform: &dyn PlatformActions,
) -> InstallerResult<Option<PathBuf>> {
    let root = match legacy.install_location()? {
        Some(root) => root,
        None => return Ok(None),
    };

    tracing::info!(root = %root.display(), "Migrating legacy installation");

    for file in platform.obsolete_legacy_files() {
        let path = root.join(file);
        if let Err(e) = fs::remove_file(&path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), error = %e, "Could not remove obsolete file");
            }
        }
    }

    for dir in LEGACY_DIRS {
        if let Err(e) = remove_tree(&root.join(dir)) {
            tracing::warn!(error = %e, "Could not remove legacy directory");
        }
    }

    move_content(&root);

    legacy.set_install_location(None)?;
    Ok(Some(root))
}

fn move_content(root: &Path) {
    let from = root.join(LEGACY_CONTENT_DIR);
    let to = root.join(GAME_DIR);
    if !from.is_dir() {
        return;
    }
    if to.exists() {
        tracing::warn!(path = %to.display(), "Game directory already exists, keeping legacy content in place");
        return;
    }
    match fs::rename(&from, &to) {
        Ok(()) => tracing::info!(from = %from.display(), to = %to.display(), "Moved legacy game content"),
        Err(e) => tracing::warn!(from = %from.display(), error = %e, "Could not move legacy game content"),
    }
}
