//! SHA-256 digests for local file verification.
//!
//! A file that cannot be read simply fails verification; the caller treats
//! that the same as a mismatch and schedules a download.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{InstallerError, InstallerResult};

/// Buffer size for reading files during digest calculation (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// Length of a hex-encoded SHA-256 digest.
pub const DIGEST_HEX_LEN: usize = 64;

/// Calculate the SHA-256 digest of a file as lowercase hex.
///
/// The file is streamed in fixed-size chunks so memory use stays bounded
/// for large game archives.
pub fn file_digest(path: &Path) -> InstallerResult<String> {
    let mut file = File::open(path).map_err(|e| InstallerError::fs("open", path, e))?;

    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let bytes_read = file
            .read(&mut buffer)
            .map_err(|e| InstallerError::fs("read", path, e))?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// SHA-256 digest of an in-memory buffer as lowercase hex.
pub fn bytes_digest(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Check whether the file at `path` matches `expected_hex`.
///
/// Both digests are compared lowercased. Unreadable or missing files return
/// `false`.
pub fn verify(path: &Path, expected_hex: &str) -> bool {
    match file_digest(path) {
        Ok(actual) => actual.eq_ignore_ascii_case(expected_hex.trim()),
        Err(e) => {
            tracing::trace!(path = %path.display(), error = %e, "File not verifiable");
            false
        }
    }
}

/// Whether `s` looks like a hex-encoded SHA-256 digest.
pub fn is_digest_hex(s: &str) -> bool {
    s.len() == DIGEST_HEX_LEN && s.bytes().all(|b| b.is_ascii_hexdigit())
}
