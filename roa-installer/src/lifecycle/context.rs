//! Per-run installation context.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::mode::Mode;
use crate::components::Component;
use crate::settings::normalize_root;

/// Immutable snapshot of what the installer knows for one operation.
///
/// Operations never mutate a context; they return an updated copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallContext {
    root: Option<PathBuf>,
    mode: Mode,
    components: BTreeSet<Component>,
}

impl InstallContext {
    /// Context for `mode` with an optional known root.
    pub fn new(root: Option<PathBuf>, mode: Mode) -> Self {
        Self {
            root: root.and_then(|r| normalize_root(&r)),
            mode,
            components: BTreeSet::new(),
        }
    }

    /// Installation root, if known.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Optional components selected for installation.
    pub fn components(&self) -> &BTreeSet<Component> {
        &self.components
    }

    /// No valid installation root is known; only installing is possible.
    pub fn is_blocked(&self) -> bool {
        self.root.is_none()
    }

    /// Copy with `root` as the installation root; an empty path leaves the
    /// copy blocked.
    pub fn with_root(&self, root: &Path) -> Self {
        Self {
            root: normalize_root(root),
            ..self.clone()
        }
    }

    pub fn with_mode(&self, mode: Mode) -> Self {
        Self {
            mode,
            ..self.clone()
        }
    }

    pub fn with_components(&self, components: BTreeSet<Component>) -> Self {
        Self {
            components,
            ..self.clone()
        }
    }
}
