//! Synchronization of the local installation with the download server.
//!
//! This module provides the pieces of one sync cycle:
//! - SHA-256 verification of local files (`checksum`)
//! - Pinned-certificate HTTP transport (`transport`)
//! - Manifest parsing and retrieval (`manifest`)
//! - Diff planning against the local tree (`plan`)
//! - Cycle state machine and progress accounting (`state`)
//! - Sequential download pipeline and the full cycle (`pipeline`)
//!
//! # Architecture
//!
//! ```text
//! SyncEngine
//!     │
//!     ├── ManifestFetcher ──► Transport (trait)
//!     │                          └── HttpTransport
//!     ├── plan() ──► checksum::verify
//!     │
//!     └── DownloadPipeline ──► Transport, PlatformActions
//! ```

pub mod checksum;
mod manifest;
mod pipeline;
mod plan;
mod state;
pub(crate) mod transport;

pub use manifest::{parse_entries, Manifest, ManifestEntry, ManifestFetcher, MANIFEST_COPY};
pub use pipeline::{DownloadPipeline, SyncEngine};
pub use plan::{plan, DownloadPlan};
pub use state::{StateObserver, SyncProgress, SyncReport, SyncState};
pub use transport::{BoxFuture, HttpTransport, Transport, TrustConfig};
