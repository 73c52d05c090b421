//! Remote file manifest.
//!
//! The server publishes one manifest per platform. Each line has the form
//! `relative/path;sha256hex`. Lines that do not split into exactly two
//! fields, carry a malformed digest or an unsafe path are dropped.

use std::path::{Component, Path};
use std::sync::Arc;

use super::checksum::is_digest_hex;
use super::transport::Transport;
use crate::error::{InstallerError, InstallerResult};
use crate::platform::PlatformKey;

/// Location of the saved manifest, relative to the installation root.
pub const MANIFEST_COPY: &str = "launcher/downloads/files.txt";

/// One expected file of the installation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ManifestEntry {
    /// Path relative to the installation root, `/`-separated.
    pub relative_path: String,
    /// Expected SHA-256 digest, lowercase hex.
    pub expected_digest: String,
}

impl ManifestEntry {
    /// Parse one manifest line.
    ///
    /// Returns `None` for blank or malformed lines.
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let mut fields = line.split(';');
        let path = fields.next()?;
        let digest = fields.next()?;
        if fields.next().is_some() {
            return None;
        }

        if path.is_empty() || !is_digest_hex(digest) || !is_relative_inside_root(path) {
            return None;
        }

        Some(Self {
            relative_path: path.to_string(),
            expected_digest: digest.to_ascii_lowercase(),
        })
    }
}

/// Paths must stay below the installation root.
fn is_relative_inside_root(path: &str) -> bool {
    if path.starts_with('/') || path.starts_with('\\') {
        return false;
    }
    Path::new(path)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Parse all well-formed entries of `lines`, keeping manifest order.
pub fn parse_entries<S: AsRef<str>>(lines: &[S]) -> Vec<ManifestEntry> {
    lines
        .iter()
        .filter_map(|line| {
            let entry = ManifestEntry::parse_line(line.as_ref());
            if entry.is_none() && !line.as_ref().trim().is_empty() {
                tracing::trace!(line = line.as_ref(), "Skipping malformed manifest line");
            }
            entry
        })
        .collect()
}

/// Fetched manifest: the raw body and its lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub raw: Vec<u8>,
    pub lines: Vec<String>,
}

impl Manifest {
    /// Split a raw manifest body into lines.
    pub fn from_bytes(raw: Vec<u8>) -> Self {
        let lines = String::from_utf8_lossy(&raw)
            .lines()
            .map(|l| l.trim_end_matches('\r').to_string())
            .collect();
        Self { raw, lines }
    }

    /// Save the manifest below `root` for later inspection by the launcher.
    pub fn persist(&self, root: &Path) -> InstallerResult<()> {
        let path = root.join(MANIFEST_COPY);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| InstallerError::fs("create", parent, e))?;
        }
        std::fs::write(&path, &self.raw).map_err(|e| InstallerError::fs("write", &path, e))
    }
}

/// Retrieves the manifest for a platform.
#[derive(Clone)]
pub struct ManifestFetcher {
    transport: Arc<dyn Transport>,
    base_url: String,
}

impl ManifestFetcher {
    pub fn new(transport: Arc<dyn Transport>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
        }
    }

    /// Fetch the manifest for `key`.
    ///
    /// Failures are returned as-is; the caller decides how to surface them.
    pub async fn fetch(&self, key: PlatformKey) -> InstallerResult<Manifest> {
        let url = key.manifest_url(&self.base_url);
        tracing::info!(url = %url, "Fetching manifest");

        let body = self.transport.get(&url).await?;
        let manifest = Manifest::from_bytes(body.to_vec());

        tracing::debug!(lines = manifest.lines.len(), "Manifest received");
        Ok(manifest)
    }
}
