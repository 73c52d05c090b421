//! `roainstaller`: installs, updates, verifies, repairs and removes the
//! Relics of Annorath client.
//!
//! Without an action a full installation is performed.

mod error;
mod terminal;

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use roa_installer::components::{Component, SystemProcessRunner};
use roa_installer::config::InstallerConfig;
use roa_installer::lifecycle::{Completion, ControllerParts, LifecycleController, Mode, Outcome};
use roa_installer::logging::{init_logging, LogConfig};
use roa_installer::platform;
use roa_installer::settings::IniSettings;
use roa_installer::sync::{HttpTransport, SyncEngine};

use crate::error::CliError;
use crate::terminal::{ConsoleFrontend, Presets};

const AFTER_HELP: &str = "\
Without an action the client is installed.

Sample: roainstaller update";

/// Action selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Action {
    /// Update an existing installation
    #[value(alias = "/silent")]
    Update,
    /// Check all files and download what is missing or damaged
    Verify,
    /// Reinstall the game content, locating the installation if needed
    Repair,
    /// Remove the client
    Uninstall,
}

impl From<Action> for Mode {
    fn from(action: Action) -> Self {
        match action {
            Action::Update => Mode::Update,
            Action::Verify => Mode::Verify,
            Action::Repair => Mode::Repair,
            Action::Uninstall => Mode::Uninstall,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "roainstaller", version, about, after_help = AFTER_HELP)]
struct Cli {
    /// What to do; omit to install
    #[arg(value_enum)]
    action: Option<Action>,

    /// Installer configuration file [default: installer.ini in the launcher settings]
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Install (or repair) into this directory instead of asking
    #[arg(long, value_name = "DIR")]
    install_dir: Option<PathBuf>,

    /// Optional components to install, comma separated (vcredist, openal, menu, desktop)
    #[arg(long, value_delimiter = ',', value_name = "LIST")]
    components: Option<Vec<Component>>,

    /// Answer yes to all confirmations
    #[arg(short, long)]
    yes: bool,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn mode(&self) -> Mode {
        self.action.map(Mode::from).unwrap_or(Mode::Install)
    }

    fn presets(&self) -> Presets {
        Presets {
            install_dir: self.install_dir.clone(),
            components: self
                .components
                .as_ref()
                .map(|list| list.iter().copied().collect::<BTreeSet<_>>()),
            assume_yes: self.yes,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = match &cli.config {
        Some(path) => InstallerConfig::load_from(path)?,
        None => InstallerConfig::load()?,
    };
    let _log_guard = init_logging(&LogConfig::new(&config.log_dir).with_verbose(cli.verbose))?;

    let mode = cli.mode();
    tracing::info!(%mode, version = env!("CARGO_PKG_VERSION"), "roainstaller starting");

    let controller = build_controller(&config)?;
    let frontend = ConsoleFrontend::new(cli.presets(), host_is_windows());

    // Uninstall never needs the network, so it runs without a runtime
    let completion = if mode == Mode::Uninstall {
        controller.uninstall(&frontend)?
    } else {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| CliError::Runtime(format!("Failed to start async runtime: {}", e)))?;
        runtime.block_on(controller.run(mode, &frontend))?
    };

    report(&completion);
    Ok(())
}

fn host_is_windows() -> bool {
    platform::PlatformKey::detect().is_windows()
}

fn build_controller(config: &InstallerConfig) -> Result<LifecycleController, CliError> {
    let platform = platform::current();
    let transport = Arc::new(HttpTransport::new(&config.trust(), config.timeout)?);
    let engine = SyncEngine::new(transport, Arc::clone(&platform), config.base_url.clone());
    let exe_path = std::env::current_exe()
        .map_err(|e| CliError::Runtime(format!("Cannot determine installer location: {}", e)))?;

    let legacy = IniSettings::legacy()?;
    let parts = ControllerParts {
        platform,
        engine,
        settings: Arc::new(IniSettings::current()?),
        runner: Arc::new(SystemProcessRunner),
        exe_path,
    };
    Ok(LifecycleController::new(parts, &legacy)?)
}

fn report(completion: &Completion) {
    match &completion.outcome {
        Outcome::Installed { sync, post } => {
            println!(
                "Downloaded {} of {} files ({} bytes).",
                sync.downloaded, sync.planned, sync.bytes
            );
            for outcome in post.installers.iter().filter(|o| o.exit_code != Some(0)) {
                println!(
                    "Warning: {} did not finish successfully.",
                    outcome.executable.display()
                );
            }
        }
        Outcome::Updated { sync, .. } => {
            println!("Downloaded {} of {} files.", sync.downloaded, sync.planned);
        }
        Outcome::Verified(sync) | Outcome::Repaired(sync) => {
            if !sync.mismatched.is_empty() {
                println!(
                    "Warning: {} files did not match the server checksum after download.",
                    sync.mismatched.len()
                );
            }
        }
        Outcome::Uninstalled => {}
        Outcome::Cancelled => println!("Cancelled, nothing was changed."),
    }
}
