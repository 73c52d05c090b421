//! Integration tests for the installer lifecycle.
//!
//! These tests drive `LifecycleController` end to end against a scripted
//! server, an in-memory settings store and a temporary installation tree:
//! - manifest → plan → download, including malformed manifest lines
//! - blocked operations that must not touch the network
//! - one-time legacy migration across restarts
//! - uninstall confirmation
//!
//! Run with: `cargo test --test lifecycle_integration`

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use tempfile::TempDir;

use roa_installer::components::{ProcessRunner, SilentInstaller};
use roa_installer::error::TransportErrorKind;
use roa_installer::frontend::{Frontend, InstallChoices, Notice};
use roa_installer::lifecycle::{ControllerParts, LifecycleController, Mode, Outcome};
use roa_installer::platform::{LinuxPlatform, PlatformActions, PlatformKey};
use roa_installer::settings::{MemorySettings, SettingsStore};
use roa_installer::sync::checksum::bytes_digest;
use roa_installer::sync::{BoxFuture, SyncEngine, SyncState, Transport};
use roa_installer::{InstallerError, InstallerResult};

// ============================================================================
// Test Doubles
// ============================================================================

const BASE: &str = "https://mirror.example.com/data";

/// Serves fixed bodies by URL and records every request.
#[derive(Default)]
struct FakeServer {
    files: Mutex<HashMap<String, Bytes>>,
    requests: Mutex<Vec<String>>,
}

impl FakeServer {
    fn manifest_url() -> String {
        format!("{}/linux_x86_64/launcher/linux_x86_64.txt", BASE)
    }

    fn file_url(path: &str) -> String {
        format!("{}/linux_x86_64/{}", BASE, path)
    }

    fn publish_manifest(&self, body: &str) {
        self.files
            .lock()
            .unwrap()
            .insert(Self::manifest_url(), Bytes::from(body.to_string()));
    }

    fn publish_file(&self, path: &str, body: &[u8]) {
        self.files
            .lock()
            .unwrap()
            .insert(Self::file_url(path), Bytes::copy_from_slice(body));
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for FakeServer {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, InstallerResult<Bytes>> {
        Box::pin(async move {
            self.requests.lock().unwrap().push(url.to_string());
            self.files
                .lock()
                .unwrap()
                .get(url)
                .cloned()
                .ok_or_else(|| InstallerError::Transport {
                    url: url.to_string(),
                    kind: TransportErrorKind::Status(404),
                    reason: "not found".to_string(),
                })
        })
    }
}

/// Never expected to run on Linux.
struct NoProcesses;

impl ProcessRunner for NoProcesses {
    fn run(&self, installer: &SilentInstaller) -> InstallerResult<Option<i32>> {
        panic!("unexpected installer run: {}", installer.executable.display());
    }
}

#[derive(Default)]
struct RecordingFrontend {
    choices: Option<InstallChoices>,
    confirm: bool,
    progress: Mutex<Vec<(u8, String)>>,
    notices: Mutex<Vec<Notice>>,
    asked_for_dir: Mutex<bool>,
}

impl Frontend for RecordingFrontend {
    fn install_choices(&self, _suggested: Option<PathBuf>) -> Option<InstallChoices> {
        self.choices.clone()
    }

    fn select_install_dir(&self) -> Option<PathBuf> {
        *self.asked_for_dir.lock().unwrap() = true;
        None
    }

    fn confirm_uninstall(&self, _root: &Path) -> bool {
        self.confirm
    }

    fn progress(&self, percent: u8, current_file: &str) {
        self.progress
            .lock()
            .unwrap()
            .push((percent, current_file.to_string()));
    }

    fn status(&self, _text: &str) {}

    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }

    fn last_step(&self) {}
}

// ============================================================================
// Helper Functions
// ============================================================================

fn digest_line(path: &str, body: &[u8]) -> String {
    format!("{};{}", path, bytes_digest(body))
}

struct Setup {
    server: Arc<FakeServer>,
    settings: Arc<MemorySettings>,
    home: TempDir,
    states: Arc<Mutex<Vec<SyncState>>>,
}

impl Setup {
    fn new(settings: MemorySettings) -> Self {
        Self {
            server: Arc::new(FakeServer::default()),
            settings: Arc::new(settings),
            home: TempDir::new().unwrap(),
            states: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn controller(&self, legacy: &dyn SettingsStore) -> LifecycleController {
        let platform: Arc<dyn PlatformActions> = Arc::new(LinuxPlatform::with_home(
            PlatformKey::LinuxX86_64,
            self.home.path(),
        ));
        let states = Arc::clone(&self.states);
        let engine = SyncEngine::new(self.server.clone(), Arc::clone(&platform), BASE)
            .with_observer(Arc::new(move |s: SyncState| states.lock().unwrap().push(s)));

        LifecycleController::new(
            ControllerParts {
                platform,
                engine,
                settings: self.settings.clone(),
                runner: Arc::new(NoProcesses),
                exe_path: PathBuf::from("/usr/local/bin/roainstaller"),
            },
            legacy,
        )
        .unwrap()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_verify_downloads_only_missing_files() {
    let root = TempDir::new().unwrap();
    std::fs::create_dir_all(root.path().join("a")).unwrap();
    std::fs::write(root.path().join("a/b.txt"), b"present").unwrap();

    let setup = Setup::new(MemorySettings::with_location(root.path()));
    setup.server.publish_manifest(&format!(
        "{}\nbad-line\n{}\n",
        digest_line("a/b.txt", b"present"),
        digest_line("c.txt", b"fresh")
    ));
    setup.server.publish_file("a/b.txt", b"present");
    setup.server.publish_file("c.txt", b"fresh");

    let controller = setup.controller(&MemorySettings::new());
    let frontend = RecordingFrontend::default();
    let done = controller.run(Mode::Verify, &frontend).await.unwrap();

    match done.outcome {
        Outcome::Verified(report) => {
            assert_eq!(report.planned, 1);
            assert_eq!(report.downloaded, 1);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(std::fs::read(root.path().join("c.txt")).unwrap(), b"fresh");
    assert_eq!(
        setup.server.requests(),
        vec![FakeServer::manifest_url(), FakeServer::file_url("c.txt")]
    );
    assert!(setup
        .server
        .requests()
        .iter()
        .all(|url| !url.contains("bad-line")));
    assert_eq!(*frontend.notices.lock().unwrap(), vec![Notice::Verified]);
    assert_eq!(
        *setup.states.lock().unwrap(),
        vec![
            SyncState::FetchingManifest,
            SyncState::Planning,
            SyncState::FetchingFile,
            SyncState::WritingFile,
            SyncState::Draining,
            SyncState::Done,
        ]
    );
    assert!(root.path().join("launcher/downloads/files.txt").is_file());
}

#[tokio::test]
async fn test_second_verify_is_a_no_op() {
    let root = TempDir::new().unwrap();
    let setup = Setup::new(MemorySettings::with_location(root.path()));
    setup
        .server
        .publish_manifest(&digest_line("game/data/world.pak", b"world"));
    setup.server.publish_file("game/data/world.pak", b"world");

    let controller = setup.controller(&MemorySettings::new());
    let frontend = RecordingFrontend::default();
    controller.run(Mode::Verify, &frontend).await.unwrap();
    let second = controller.run(Mode::Verify, &frontend).await.unwrap();

    match second.outcome {
        Outcome::Verified(report) => assert_eq!(report.planned, 0),
        other => panic!("unexpected outcome {:?}", other),
    }
    let file_requests = setup
        .server
        .requests()
        .iter()
        .filter(|url| url.ends_with("world.pak"))
        .count();
    assert_eq!(file_requests, 1);
}

#[tokio::test]
async fn test_install_reports_progress() {
    let target = TempDir::new().unwrap();
    let setup = Setup::new(MemorySettings::new());
    setup.server.publish_manifest(&format!(
        "{}\n{}\n",
        digest_line("game/bin/roa", b"binary"),
        digest_line("game/data/world.pak", b"world")
    ));
    setup.server.publish_file("game/bin/roa", b"binary");
    setup.server.publish_file("game/data/world.pak", b"world");

    let controller = setup.controller(&MemorySettings::new());
    let frontend = RecordingFrontend {
        choices: Some(InstallChoices {
            root: target.path().to_path_buf(),
            components: Default::default(),
        }),
        ..Default::default()
    };

    let done = controller.run(Mode::Install, &frontend).await.unwrap();

    assert!(matches!(done.outcome, Outcome::Installed { .. }));
    let percents: Vec<u8> = frontend
        .progress
        .lock()
        .unwrap()
        .iter()
        .map(|(p, _)| *p)
        .collect();
    assert_eq!(percents, vec![0, 50, 100]);
    assert!(target.path().join("game/bin/roa").is_file());
    assert!(setup.settings.install_location().unwrap().is_some());
}

#[tokio::test]
async fn test_blocked_modes_make_no_network_call() {
    let setup = Setup::new(MemorySettings::new());
    setup.server.publish_manifest(&digest_line("a.txt", b"a"));
    let controller = setup.controller(&MemorySettings::new());

    for mode in [Mode::Update, Mode::Verify] {
        let frontend = RecordingFrontend::default();
        let result = controller.run(mode, &frontend).await;
        assert!(matches!(result, Err(InstallerError::Blocked { .. })));
        assert!(matches!(
            frontend.notices.lock().unwrap().as_slice(),
            [Notice::Failed { .. }]
        ));
    }

    assert!(setup.server.requests().is_empty());
    assert!(setup.states.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_manifest_failure_leaves_tree_untouched() {
    let root = TempDir::new().unwrap();
    std::fs::write(root.path().join("marker"), b"keep").unwrap();
    let setup = Setup::new(MemorySettings::with_location(root.path()));
    let controller = setup.controller(&MemorySettings::new());

    let result = controller
        .run(Mode::Update, &RecordingFrontend::default())
        .await;

    assert!(matches!(result, Err(InstallerError::Transport { .. })));
    assert_eq!(setup.server.requests(), vec![FakeServer::manifest_url()]);
    assert_eq!(
        *setup.states.lock().unwrap(),
        vec![SyncState::FetchingManifest, SyncState::Failed]
    );
    assert!(root.path().join("marker").is_file());
}

#[tokio::test]
async fn test_blocked_repair_without_recovery_asks_user() {
    let setup = Setup::new(MemorySettings::new());
    let controller = setup.controller(&MemorySettings::new());
    let frontend = RecordingFrontend::default();

    let result = controller.run(Mode::Repair, &frontend).await;

    assert!(matches!(result, Err(InstallerError::NoInstallPath)));
    assert!(*frontend.asked_for_dir.lock().unwrap());
    assert!(setup.server.requests().is_empty());
}

#[test]
fn test_legacy_migration_runs_once() {
    let old = TempDir::new().unwrap();
    std::fs::create_dir_all(old.path().join("files/data")).unwrap();
    std::fs::create_dir_all(old.path().join("sounds")).unwrap();
    std::fs::write(old.path().join("files/data/world.pak"), b"world").unwrap();

    let setup = Setup::new(MemorySettings::new());
    let legacy = MemorySettings::with_location(old.path());

    let first = setup.controller(&legacy);
    assert_eq!(first.context().root(), Some(old.path()));
    assert!(old.path().join("game/data/world.pak").is_file());
    assert!(!old.path().join("sounds").exists());

    // Recreate a legacy-looking directory; a restart must not touch it.
    std::fs::create_dir_all(old.path().join("sounds")).unwrap();
    let second = setup.controller(&legacy);
    assert_eq!(second.context().root(), Some(old.path()));
    assert!(old.path().join("sounds").is_dir());
    assert_eq!(legacy.install_location().unwrap(), None);
}

#[test]
fn test_uninstall_cancel_has_no_side_effects() {
    let root = TempDir::new().unwrap();
    std::fs::create_dir_all(root.path().join("game/data")).unwrap();
    let setup = Setup::new(MemorySettings::with_location(root.path()));
    let controller = setup.controller(&MemorySettings::new());

    let done = controller.uninstall(&RecordingFrontend::default()).unwrap();

    assert_eq!(done.outcome, Outcome::Cancelled);
    assert!(root.path().join("game/data").is_dir());
    assert!(setup.server.requests().is_empty());
}

#[test]
fn test_blocked_uninstall_is_refused() {
    let setup = Setup::new(MemorySettings::new());
    let controller = setup.controller(&MemorySettings::new());
    let frontend = RecordingFrontend {
        confirm: true,
        ..Default::default()
    };

    let result = controller.uninstall(&frontend);

    assert!(matches!(result, Err(InstallerError::Blocked { .. })));
}
