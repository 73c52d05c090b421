//! Diff planning: which manifest entries need downloading.

use std::collections::{HashSet, VecDeque};
use std::path::Path;

use super::checksum;
use super::manifest::{parse_entries, ManifestEntry};

/// Ordered queue of files to fetch in this sync cycle.
///
/// Entries keep manifest order and are consumed front to back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadPlan {
    entries: VecDeque<ManifestEntry>,
    total: usize,
}

impl DownloadPlan {
    /// Build a plan from entries, dropping repeated paths.
    pub fn from_entries(entries: impl IntoIterator<Item = ManifestEntry>) -> Self {
        let mut seen = HashSet::new();
        let entries: VecDeque<ManifestEntry> = entries
            .into_iter()
            .filter(|e| seen.insert(e.relative_path.clone()))
            .collect();
        let total = entries.len();
        Self { entries, total }
    }

    /// Number of entries the plan was built with; the progress denominator.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Entries not yet taken.
    pub fn remaining(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Take the next entry to download.
    pub fn next_entry(&mut self) -> Option<ManifestEntry> {
        self.entries.pop_front()
    }

    /// Pending relative paths, in download order.
    #[cfg(test)]
    pub fn paths(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.relative_path.as_str()).collect()
    }
}

/// Compare manifest lines against the tree under `root`.
///
/// Every well-formed entry whose local copy is missing, unreadable or has a
/// different digest is planned exactly once. Malformed lines are skipped.
pub fn plan<S: AsRef<str>>(manifest_lines: &[S], root: &Path) -> DownloadPlan {
    let entries = parse_entries(manifest_lines);
    let candidates = entries.len();

    let plan = DownloadPlan::from_entries(
        entries
            .into_iter()
            .filter(|entry| !checksum::verify(&root.join(&entry.relative_path), &entry.expected_digest)),
    );

    tracing::info!(
        entries = candidates,
        planned = plan.total(),
        root = %root.display(),
        "Download plan built"
    );
    plan
}
