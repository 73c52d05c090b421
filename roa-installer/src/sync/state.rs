//! Sync cycle state machine and progress accounting.

use std::fmt;
use std::sync::Arc;

/// States of one sync cycle.
///
/// ```text
/// Idle ─► FetchingManifest ─► Planning ─► FetchingFile ─► WritingFile ─┐
///                │               │            ▲   │                     │
///                │               │            └───┼─────────────────────┤
///                │               ▼                │                     ▼
///                └──────────► Failed ◄────────────┘                 Draining ─► Done
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncState {
    Idle,
    FetchingManifest,
    Planning,
    FetchingFile,
    WritingFile,
    Draining,
    Done,
    Failed,
}

impl SyncState {
    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(self, next: SyncState) -> bool {
        use SyncState::*;

        matches!(
            (self, next),
            (Idle, FetchingManifest)
                | (Idle, FetchingFile)
                | (Idle, Draining)
                | (FetchingManifest, Planning)
                | (Planning, FetchingFile)
                | (Planning, Draining)
                | (FetchingFile, WritingFile)
                | (FetchingFile, FetchingFile)
                | (WritingFile, FetchingFile)
                | (WritingFile, Draining)
                | (Draining, Done)
                | (FetchingManifest, Failed)
                | (Planning, Failed)
                | (FetchingFile, Failed)
                | (WritingFile, Failed)
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            SyncState::Idle => "idle",
            SyncState::FetchingManifest => "fetching-manifest",
            SyncState::Planning => "planning",
            SyncState::FetchingFile => "fetching-file",
            SyncState::WritingFile => "writing-file",
            SyncState::Draining => "draining",
            SyncState::Done => "done",
            SyncState::Failed => "failed",
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Callback receiving every state the cycle enters.
pub type StateObserver = Arc<dyn Fn(SyncState) + Send + Sync>;

/// Tracks the current state and notifies an optional observer.
pub(crate) struct StateTracker {
    current: SyncState,
    observer: Option<StateObserver>,
}

impl StateTracker {
    pub(crate) fn new(observer: Option<StateObserver>) -> Self {
        Self {
            current: SyncState::Idle,
            observer,
        }
    }

    pub(crate) fn enter(&mut self, next: SyncState) {
        debug_assert!(
            self.current.can_transition_to(next),
            "illegal sync transition {} -> {}",
            self.current,
            next
        );
        tracing::trace!(from = %self.current, to = %next, "Sync state change");
        self.current = next;
        if let Some(observer) = &self.observer {
            observer(next);
        }
    }
}

/// File-count progress of a download plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncProgress {
    /// Files written so far.
    pub completed: usize,
    /// Files in the plan.
    pub total: usize,
}

impl SyncProgress {
    pub fn new(total: usize) -> Self {
        Self {
            completed: 0,
            total,
        }
    }

    /// Whole percent complete, rounded down. An empty plan is complete.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((100 * self.completed.min(self.total)) / self.total) as u8
    }

    /// Record one finished file.
    pub fn record_file(&mut self) {
        self.completed += 1;
    }
}

/// Result of a successful sync cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Files the plan contained.
    pub planned: usize,
    /// Files fetched and written.
    pub downloaded: usize,
    /// Bytes written to disk.
    pub bytes: u64,
    /// Written files whose digest differed from the manifest.
    pub mismatched: Vec<String>,
}
