//! Installer lifecycle: mode selection, layout, migration and cleanup.
//!
//! `LifecycleController` is the entry point. It resolves the installation
//! root once at construction (migrating a legacy install if one is recorded)
//! and then runs a single `Mode` per call, returning the context the mode
//! left behind.

mod context;
mod controller;
mod layout;
mod legacy;
mod mode;
mod recovery;

pub use context::InstallContext;
pub use controller::{Completion, ControllerParts, LifecycleController, Outcome, INSTALLING_COMPONENTS};
pub use layout::{ensure_layout, layout_dirs, remove_tree, GAME_DIR, LAYOUT_DIRS};
pub use legacy::{migrate_legacy, LEGACY_CONTENT_DIR, LEGACY_DIRS};
pub use mode::Mode;
pub use recovery::recover_root_from_exe;
