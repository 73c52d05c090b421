//! Locating an installation from the running executable.

use std::path::{Path, PathBuf};

/// Directory name the installer binary is nested in, twice.
const BIN_DIR: &str = "bin";

/// Recover the installation root from the installer's own path.
///
/// The installer ships as `<root>/bin/bin/<exe>`; anything else yields
/// `None`.
pub fn recover_root_from_exe(exe_path: &Path) -> Option<PathBuf> {
    let exe_dir = exe_path.parent()?;
    let outer = exe_dir.parent()?;

    let is_bin = |p: &Path| p.file_name().map(|n| n == BIN_DIR).unwrap_or(false);
    if !is_bin(exe_dir) || !is_bin(outer) {
        return None;
    }

    let root = outer.parent()?;
    if root.as_os_str().is_empty() {
        return None;
    }
    Some(root.to_path_buf())
}
