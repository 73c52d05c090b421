//! Relics of Annorath installer engine.
//!
//! Keeps a local client installation in line with the download server and
//! drives it through install, update, verify, repair and uninstall. User
//! interaction is delegated to a [`frontend::Frontend`]; everything that
//! differs per operating system sits behind [`platform::PlatformActions`].
//!
//! # Modules
//!
//! - [`sync`]: manifest retrieval, diff planning and the download pipeline
//! - [`lifecycle`]: mode dispatch, directory layout, legacy migration
//! - [`components`]: optional components and shortcuts after install
//! - [`settings`], [`config`]: persisted install location and engine config

pub mod components;
pub mod config;
pub mod error;
pub mod frontend;
pub mod lifecycle;
pub mod logging;
pub mod platform;
pub mod settings;
pub mod sync;

pub use error::{InstallerError, InstallerResult};
