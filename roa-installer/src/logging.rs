//! Logging setup.
//!
//! Human-readable output goes to stderr; a copy without colors is written to
//! a daily rolling file so failed installs can be diagnosed afterwards.
//! `RUST_LOG` overrides the default filter.

use std::path::PathBuf;

use time::format_description::well_known::Rfc3339;
use time::UtcOffset;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::OffsetTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{InstallerError, InstallerResult};

/// Prefix of the rolling log files.
pub const LOG_FILE_PREFIX: &str = "roainstaller.log";

/// Logging options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Directory for the rolling log files.
    pub directory: PathBuf,
    /// Log debug output of this crate.
    pub verbose: bool,
}

impl LogConfig {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Filter used when `RUST_LOG` is not set.
    pub fn default_filter(&self) -> String {
        let level = if self.verbose { "debug" } else { "info" };
        format!("roa_installer={level},roainstaller={level},warn")
    }
}

/// Install the global subscriber.
///
/// Keep the returned guard alive for the lifetime of the process; dropping it
/// flushes and stops the file writer.
pub fn init_logging(config: &LogConfig) -> InstallerResult<WorkerGuard> {
    std::fs::create_dir_all(&config.directory)
        .map_err(|e| InstallerError::fs("create", &config.directory, e))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_filter()));

    // The offset must be read before any other threads exist
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    let timer = OffsetTime::new(offset, Rfc3339);

    let appender = tracing_appender::rolling::daily(&config.directory, LOG_FILE_PREFIX);
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_timer(timer.clone());
    let file = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_timer(timer);

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| InstallerError::Config(format!("logging already initialized: {}", e)))?;

    tracing::debug!(directory = %config.directory.display(), "Logging initialized");
    Ok(guard)
}
