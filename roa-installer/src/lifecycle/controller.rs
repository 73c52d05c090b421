//! Mode dispatch and completion handling.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::context::InstallContext;
use super::layout::{ensure_layout, remove_tree, GAME_DIR};
use super::legacy::migrate_legacy;
use super::mode::Mode;
use super::recovery::recover_root_from_exe;
use crate::components::{create_shortcuts, install_components, PostInstallReport, ProcessRunner};
use crate::error::{InstallerError, InstallerResult};
use crate::frontend::{Frontend, Notice};
use crate::platform::{PlatformActions, ShortcutKind};
use crate::settings::SettingsStore;
use crate::sync::{SyncEngine, SyncReport};

/// Status shown while optional components are set up.
pub const INSTALLING_COMPONENTS: &str = "Installing additional software...";

/// Collaborators the controller drives.
pub struct ControllerParts {
    pub platform: Arc<dyn PlatformActions>,
    pub engine: SyncEngine,
    /// Current settings namespace holding the install location.
    pub settings: Arc<dyn SettingsStore>,
    pub runner: Arc<dyn ProcessRunner>,
    /// Path of the running installer binary, used by repair.
    pub exe_path: PathBuf,
}

/// How a mode finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Installed {
        sync: SyncReport,
        post: PostInstallReport,
    },
    Updated {
        sync: SyncReport,
        shortcuts: Vec<PathBuf>,
    },
    Verified(SyncReport),
    Repaired(SyncReport),
    Uninstalled,
    /// The user backed out before anything was changed.
    Cancelled,
}

/// Result of one mode together with the context it left behind.
#[derive(Debug, Clone)]
pub struct Completion {
    pub outcome: Outcome,
    pub context: InstallContext,
}

impl Completion {
    fn new(outcome: Outcome, context: InstallContext) -> Self {
        Self { outcome, context }
    }
}

/// Top-level installer state machine.
pub struct LifecycleController {
    platform: Arc<dyn PlatformActions>,
    engine: SyncEngine,
    settings: Arc<dyn SettingsStore>,
    runner: Arc<dyn ProcessRunner>,
    exe_path: PathBuf,
    context: InstallContext,
}

impl LifecycleController {
    /// Build the controller, migrating a legacy installation first.
    ///
    /// The resolved root is written back to the current settings.
    pub fn new(parts: ControllerParts, legacy: &dyn SettingsStore) -> InstallerResult<Self> {
        let migrated = match migrate_legacy(legacy, parts.platform.as_ref()) {
            Ok(root) => root,
            Err(e) => {
                tracing::warn!(error = %e, "Legacy migration skipped");
                None
            }
        };

        let root = match migrated {
            Some(root) => Some(root),
            None => parts.settings.install_location().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Install location unreadable, treating as unset");
                None
            }),
        };
        if let Some(root) = &root {
            if let Err(e) = parts.settings.set_install_location(Some(root)) {
                tracing::warn!(error = %e, "Could not store install location");
            }
        }

        let context = InstallContext::new(root, Mode::Install);
        if context.is_blocked() {
            tracing::info!("No installation found, only install is available");
        } else if let Some(root) = context.root() {
            tracing::info!(root = %root.display(), "Using installation");
        }

        Ok(Self {
            platform: parts.platform,
            engine: parts.engine,
            settings: parts.settings,
            runner: parts.runner,
            exe_path: parts.exe_path,
            context,
        })
    }

    /// Context established at startup.
    pub fn context(&self) -> &InstallContext {
        &self.context
    }

    /// Run `mode` to completion. Failures are reported to `frontend` too.
    pub async fn run(&self, mode: Mode, frontend: &dyn Frontend) -> InstallerResult<Completion> {
        let ctx = self.context.with_mode(mode);
        tracing::info!(%mode, blocked = ctx.is_blocked(), "Starting");

        let result = match ensure_runnable(&ctx) {
            Err(e) => Err(e),
            Ok(()) => match mode {
                Mode::Install => self.install(ctx, frontend).await,
                Mode::Update => self.update(ctx, frontend).await,
                Mode::Verify => self.verify(ctx, frontend).await,
                Mode::Repair => self.repair(ctx, frontend).await,
                Mode::Uninstall => self.remove_installation(ctx, frontend),
            },
        };
        self.finish(mode, result, frontend)
    }

    /// Run uninstall without an async runtime.
    pub fn uninstall(&self, frontend: &dyn Frontend) -> InstallerResult<Completion> {
        let ctx = self.context.with_mode(Mode::Uninstall);
        let result = ensure_runnable(&ctx).and_then(|()| self.remove_installation(ctx, frontend));
        self.finish(Mode::Uninstall, result, frontend)
    }

    fn finish(
        &self,
        mode: Mode,
        result: InstallerResult<Completion>,
        frontend: &dyn Frontend,
    ) -> InstallerResult<Completion> {
        match &result {
            Ok(done) => tracing::info!(%mode, outcome = ?done.outcome, "Finished"),
            Err(e) => {
                tracing::error!(%mode, error = %e, "Failed");
                let message = e.to_string();
                if mode.reports_progress() {
                    frontend.status(&message);
                }
                frontend.notify(Notice::failed(format!("{} failed", mode.title()), message));
            }
        }
        result
    }

    async fn install(&self, ctx: InstallContext, frontend: &dyn Frontend) -> InstallerResult<Completion> {
        let choices = match frontend.install_choices(ctx.root().map(Path::to_path_buf)) {
            Some(choices) => choices,
            None => return Ok(Completion::new(Outcome::Cancelled, ctx)),
        };

        let ctx = ctx
            .with_root(&choices.root)
            .with_components(choices.components);
        let root = established_root(&ctx)?;
        self.settings.set_install_location(Some(&root))?;

        ensure_layout(&root, self.platform.as_ref())?;
        let sync = self.engine.run(&root, Some(frontend)).await?;
        frontend.progress(100, "");

        frontend.status(INSTALLING_COMPONENTS);
        let post = install_components(
            self.platform.as_ref(),
            Arc::clone(&self.runner),
            ctx.components(),
            &root,
        )
        .await;
        frontend.last_step();

        Ok(Completion::new(Outcome::Installed { sync, post }, ctx))
    }

    async fn update(&self, ctx: InstallContext, frontend: &dyn Frontend) -> InstallerResult<Completion> {
        let root = established_root(&ctx)?;

        ensure_layout(&root, self.platform.as_ref())?;
        let sync = self.engine.run(&root, Some(frontend)).await?;
        frontend.progress(100, "");

        let shortcuts = create_shortcuts(
            self.platform.as_ref(),
            &[ShortcutKind::Menu, ShortcutKind::Desktop],
            &root,
        );
        frontend.last_step();

        Ok(Completion::new(Outcome::Updated { sync, shortcuts }, ctx))
    }

    async fn verify(&self, ctx: InstallContext, frontend: &dyn Frontend) -> InstallerResult<Completion> {
        let root = established_root(&ctx)?;

        ensure_layout(&root, self.platform.as_ref())?;
        let sync = self.engine.run(&root, None).await?;
        frontend.notify(Notice::Verified);

        Ok(Completion::new(Outcome::Verified(sync), ctx))
    }

    async fn repair(&self, ctx: InstallContext, frontend: &dyn Frontend) -> InstallerResult<Completion> {
        let ctx = if ctx.is_blocked() {
            let recovered = self.recover_root(frontend)?;
            self.settings.set_install_location(Some(&recovered))?;
            ctx.with_root(&recovered)
        } else {
            ctx
        };
        let root = established_root(&ctx)?;

        remove_tree(&root.join(GAME_DIR))?;
        ensure_layout(&root, self.platform.as_ref())?;
        let sync = self.engine.run(&root, None).await?;
        frontend.notify(Notice::Repaired);

        Ok(Completion::new(Outcome::Repaired(sync), ctx))
    }

    /// Find the root of a blocked installation: from the binary's location,
    /// else by asking the user.
    fn recover_root(&self, frontend: &dyn Frontend) -> InstallerResult<PathBuf> {
        if let Some(root) = recover_root_from_exe(&self.exe_path) {
            tracing::info!(root = %root.display(), "Recovered installation from executable path");
            return Ok(root);
        }

        frontend
            .select_install_dir()
            .filter(|dir| !dir.as_os_str().is_empty())
            .ok_or(InstallerError::NoInstallPath)
    }

    fn remove_installation(
        &self,
        ctx: InstallContext,
        frontend: &dyn Frontend,
    ) -> InstallerResult<Completion> {
        let root = established_root(&ctx)?;

        if !frontend.confirm_uninstall(&root) {
            return Ok(Completion::new(Outcome::Cancelled, ctx));
        }

        remove_tree(&root)?;
        // The launcher must not find the deleted root again
        if let Err(e) = self.settings.set_install_location(None) {
            tracing::warn!(error = %e, "Could not clear install location");
        }
        frontend.notify(Notice::Uninstalled);

        Ok(Completion::new(Outcome::Uninstalled, ctx))
    }
}

/// Refuse modes that need an installation when none is known.
fn ensure_runnable(ctx: &InstallContext) -> InstallerResult<()> {
    if ctx.mode().requires_root() && ctx.is_blocked() {
        return Err(InstallerError::Blocked {
            operation: ctx.mode().title(),
        });
    }
    Ok(())
}

fn established_root(ctx: &InstallContext) -> InstallerResult<PathBuf> {
    ctx.root()
        .map(Path::to_path_buf)
        .ok_or(InstallerError::NoInstallPath)
}
