//! Secure HTTP transport for manifests and client files.
//!
//! The `Transport` trait is the seam between the sync engine and the network,
//! so the pipeline can be driven by a scripted transport in tests. The
//! production implementation pins the certificates shipped with the installer.

use std::error::Error as StdError;
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use reqwest::{Certificate, Client};

use crate::error::{InstallerError, InstallerResult, TransportErrorKind};

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Asynchronous GET-only transport.
///
/// Implementations must be `Send + Sync` so a single instance can be shared
/// between the manifest fetcher and the download pipeline.
pub trait Transport: Send + Sync {
    /// Fetch the full body at `url`.
    ///
    /// # Errors
    ///
    /// Returns `InstallerError::Transport` classified by failure kind. TLS
    /// trust failures use `TransportErrorKind::Tls`.
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, InstallerResult<Bytes>>;
}

/// Certificates trusted in addition to (or instead of) the system roots.
#[derive(Debug, Clone, Default)]
pub struct TrustConfig {
    /// PEM files to trust, typically the root CA and its intermediate issuer.
    pub pem_files: Vec<PathBuf>,
    /// Keep the built-in web PKI roots alongside the pinned certificates.
    pub keep_system_roots: bool,
}

/// Reqwest-backed transport with pinned certificates.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Build a transport trusting the given certificates.
    ///
    /// Missing PEM files are skipped with a warning so a stripped-down build
    /// still works against the system trust store. An unparsable PEM file is
    /// a configuration error.
    pub fn new(trust: &TrustConfig, timeout: Duration) -> InstallerResult<Self> {
        let mut builder = Client::builder()
            .timeout(timeout)
            .tls_built_in_root_certs(trust.keep_system_roots);

        let mut pinned = 0usize;
        for path in &trust.pem_files {
            match load_certificate(path)? {
                Some(cert) => {
                    builder = builder.add_root_certificate(cert);
                    pinned += 1;
                }
                None => {
                    tracing::warn!(path = %path.display(), "Pinned certificate not found, skipping");
                }
            }
        }

        if pinned == 0 && !trust.keep_system_roots {
            return Err(InstallerError::Config(
                "no trusted certificates available: pinned certificates are missing and system roots are disabled"
                    .to_string(),
            ));
        }

        let client = builder
            .build()
            .map_err(|e| InstallerError::Config(format!("failed to create HTTP client: {}", e)))?;

        tracing::debug!(pinned, system_roots = trust.keep_system_roots, "HTTP transport ready");

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, InstallerResult<Bytes>> {
        Box::pin(async move {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| classify(url, &e))?;

            let status = response.status();
            if !status.is_success() {
                return Err(InstallerError::Transport {
                    url: url.to_string(),
                    kind: TransportErrorKind::Status(status.as_u16()),
                    reason: status
                        .canonical_reason()
                        .unwrap_or("unexpected status")
                        .to_string(),
                });
            }

            response.bytes().await.map_err(|e| InstallerError::Transport {
                url: url.to_string(),
                kind: TransportErrorKind::Body,
                reason: e.to_string(),
            })
        })
    }
}

fn load_certificate(path: &Path) -> InstallerResult<Option<Certificate>> {
    let pem = match fs::read(path) {
        Ok(pem) => pem,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(InstallerError::fs("read certificate", path, e)),
    };

    Certificate::from_pem(&pem).map(Some).map_err(|e| {
        InstallerError::Config(format!("invalid certificate {}: {}", path.display(), e))
    })
}

/// Map a reqwest error onto the installer's transport taxonomy.
fn classify(url: &str, err: &reqwest::Error) -> InstallerError {
    let kind = if err.is_timeout() {
        TransportErrorKind::Timeout
    } else if is_certificate_error(err) {
        TransportErrorKind::Tls
    } else {
        TransportErrorKind::Network
    };

    InstallerError::Transport {
        url: url.to_string(),
        kind,
        reason: error_chain(err),
    }
}

/// Rustls reports trust failures deep in the source chain, wrapped in
/// `InvalidData` I/O errors that other decode failures share, so only the
/// certificate problem named in the message counts.
fn is_certificate_error(err: &(dyn StdError + 'static)) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = current {
        let text = e.to_string().to_ascii_lowercase();
        if text.contains("certificate") || text.contains("unknownissuer") {
            return true;
        }
        current = e.source();
    }
    false
}

fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut parts = vec![err.to_string()];
    let mut current = err.source();
    while let Some(e) = current {
        parts.push(e.to_string());
        current = e.source();
    }
    parts.join(": ")
}
