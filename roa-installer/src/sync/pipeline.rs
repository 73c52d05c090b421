//! Sequential download pipeline and the full sync cycle.
//!
//! Files are fetched strictly one at a time: the next request is only issued
//! after the previous body has been written to disk. Progress is reported
//! per file as whole percent.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::checksum::bytes_digest;
use super::manifest::{ManifestEntry, ManifestFetcher};
use super::plan::{plan, DownloadPlan};
use super::state::{StateObserver, StateTracker, SyncProgress, SyncReport, SyncState};
use super::transport::Transport;
use crate::error::{InstallerError, InstallerResult};
use crate::frontend::Frontend;
use crate::platform::PlatformActions;

/// How many times a transfer failing TLS validation is retried.
const TLS_RETRIES: usize = 1;

/// Drains a download plan into the installation root.
#[derive(Clone)]
pub struct DownloadPipeline {
    transport: Arc<dyn Transport>,
    platform: Arc<dyn PlatformActions>,
    base_url: String,
}

impl DownloadPipeline {
    pub fn new(
        transport: Arc<dyn Transport>,
        platform: Arc<dyn PlatformActions>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            platform,
            base_url: base_url.into(),
        }
    }

    /// Download every entry of `plan` below `root`.
    ///
    /// `progress` receives a percent/file update before each transfer; pass
    /// `None` for silent modes.
    pub async fn drain(
        &self,
        plan: DownloadPlan,
        root: &Path,
        progress: Option<&dyn Frontend>,
    ) -> InstallerResult<SyncReport> {
        let mut tracker = StateTracker::new(None);
        self.drain_tracked(plan, root, progress, &mut tracker).await
    }

    pub(crate) async fn drain_tracked(
        &self,
        mut plan: DownloadPlan,
        root: &Path,
        progress: Option<&dyn Frontend>,
        tracker: &mut StateTracker,
    ) -> InstallerResult<SyncReport> {
        let mut counter = SyncProgress::new(plan.total());
        let mut report = SyncReport {
            planned: plan.total(),
            ..Default::default()
        };

        while let Some(entry) = plan.next_entry() {
            if let Some(ui) = progress {
                ui.progress(counter.percent(), &entry.relative_path);
            }

            let result = self.transfer(&entry, root, tracker).await;
            match result {
                Ok(bytes) => {
                    counter.record_file();
                    report.downloaded += 1;
                    report.bytes += bytes.len;
                    if !bytes.digest_ok {
                        report.mismatched.push(entry.relative_path.clone());
                    }
                }
                Err(e) => {
                    tracing::error!(path = %entry.relative_path, error = %e, "Download failed");
                    tracker.enter(SyncState::Failed);
                    return Err(e);
                }
            }
        }

        tracker.enter(SyncState::Draining);
        tracing::info!(
            downloaded = report.downloaded,
            bytes = report.bytes,
            "Download plan drained"
        );
        Ok(report)
    }

    /// Fetch one entry and write it to disk.
    async fn transfer(
        &self,
        entry: &ManifestEntry,
        root: &Path,
        tracker: &mut StateTracker,
    ) -> InstallerResult<Written> {
        let url = self.platform.file_url(&self.base_url, &entry.relative_path);

        let mut attempt = 0;
        let body = loop {
            tracker.enter(SyncState::FetchingFile);
            tracing::debug!(url = %url, attempt, "Fetching file");
            match self.transport.get(&url).await {
                Ok(body) => break body,
                Err(e) if e.is_tls() && attempt < TLS_RETRIES => {
                    tracing::warn!(url = %url, error = %e, "TLS validation failed, retrying once");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        };

        tracker.enter(SyncState::WritingFile);
        let dest = root.join(&entry.relative_path);
        write_file(&dest, &body).await?;
        self.platform.set_executable_permissions(&dest)?;

        let digest_ok = bytes_digest(&body).eq_ignore_ascii_case(&entry.expected_digest);
        if !digest_ok {
            tracing::warn!(
                path = %entry.relative_path,
                "Downloaded file does not match manifest digest"
            );
        }

        Ok(Written {
            len: body.len() as u64,
            digest_ok,
        })
    }
}

struct Written {
    len: u64,
    digest_ok: bool,
}

/// Write `data` to `dest`, creating parent directories.
async fn write_file(dest: &Path, data: &[u8]) -> InstallerResult<()> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| InstallerError::fs("create", parent, e))?;
    }
    tokio::fs::write(dest, data)
        .await
        .map_err(|e| InstallerError::fs("write", dest, e))
}

/// One complete cycle: fetch manifest, plan, download.
#[derive(Clone)]
pub struct SyncEngine {
    fetcher: ManifestFetcher,
    pipeline: DownloadPipeline,
    platform: Arc<dyn PlatformActions>,
    observer: Option<StateObserver>,
}

impl SyncEngine {
    pub fn new(
        transport: Arc<dyn Transport>,
        platform: Arc<dyn PlatformActions>,
        base_url: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            fetcher: ManifestFetcher::new(Arc::clone(&transport), base_url.clone()),
            pipeline: DownloadPipeline::new(transport, Arc::clone(&platform), base_url),
            platform,
            observer: None,
        }
    }

    /// Observe every state the cycle enters.
    pub fn with_observer(mut self, observer: StateObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Bring the tree under `root` in line with the remote manifest.
    pub async fn run(
        &self,
        root: &Path,
        progress: Option<&dyn Frontend>,
    ) -> InstallerResult<SyncReport> {
        let mut tracker = StateTracker::new(self.observer.clone());

        tracker.enter(SyncState::FetchingManifest);
        let manifest = match self.fetcher.fetch(self.platform.key()).await {
            Ok(manifest) => manifest,
            Err(e) => {
                tracker.enter(SyncState::Failed);
                return Err(e);
            }
        };

        if let Err(e) = manifest.persist(root) {
            // The saved copy is informational only
            tracing::warn!(error = %e, "Could not save manifest copy");
        }

        tracker.enter(SyncState::Planning);
        let download_plan = match plan_in_background(manifest.lines.clone(), root).await {
            Ok(p) => p,
            Err(e) => {
                tracker.enter(SyncState::Failed);
                return Err(e);
            }
        };

        let report = self
            .pipeline
            .drain_tracked(download_plan, root, progress, &mut tracker)
            .await?;
        tracker.enter(SyncState::Done);
        Ok(report)
    }
}

/// Hash the local tree off the event loop.
async fn plan_in_background(lines: Vec<String>, root: &Path) -> InstallerResult<DownloadPlan> {
    let root: PathBuf = root.to_path_buf();
    tokio::task::spawn_blocking(move || plan(&lines, &root))
        .await
        .map_err(|e| InstallerError::Config(format!("planning task failed: {}", e)))
}
