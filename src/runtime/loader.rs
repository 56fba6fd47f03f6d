// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Artifact file loading
//!
//! Reads benchmark artifacts from disk. Artifacts may be stored gzip-compressed;
//! those are decompressed on demand so every probe sees the same module bytes.
//! Parsing the binary format is the detector's job, not this module's.

use crate::observability::messages::runtime::{ArtifactLoadFailed, ArtifactLoaded};
use crate::runtime::error::{AdapterError, AdapterResult};
use flate2::read::GzDecoder;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Maximum allowed size for a decompressed artifact (64 MB)
const MAX_ARTIFACT_SIZE: usize = 64 * 1024 * 1024;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Returns true if the bytes start with the gzip magic number.
pub fn is_gzip(bytes: &[u8]) -> bool {
    bytes.len() >= GZIP_MAGIC.len() && bytes[..2] == GZIP_MAGIC
}

/// Locates the artifact on disk.
///
/// Returns `path` itself when it exists, otherwise `<path>.gz` when that exists,
/// otherwise `None`.
pub fn locate_artifact(path: &Path) -> Option<PathBuf> {
    if path.is_file() {
        return Some(path.to_path_buf());
    }

    let mut compressed = path.as_os_str().to_owned();
    compressed.push(".gz");
    let compressed = PathBuf::from(compressed);
    compressed.is_file().then_some(compressed)
}

/// Loads artifact bytes, decompressing gzip-at-rest artifacts.
///
/// # Returns
/// * `Ok(Vec<u8>)` - The WebAssembly module bytes
/// * `Err(AdapterError)` - If the file is missing, unreadable, corrupt, or too large
pub fn load_artifact_bytes<P: AsRef<Path>>(path: P) -> AdapterResult<Vec<u8>> {
    let requested = path.as_ref();
    let shown = requested.display().to_string();

    let result = locate_artifact(requested)
        .ok_or_else(|| {
            AdapterError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("artifact not found: {}", shown),
            ))
        })
        .and_then(|located| read_artifact(&located));

    match result {
        Ok((bytes, decompressed)) => {
            tracing::debug!(
                "{}",
                ArtifactLoaded {
                    artifact_path: &shown,
                    size_bytes: bytes.len(),
                    decompressed,
                }
            );
            Ok(bytes)
        }
        Err(error) => {
            tracing::error!(
                "{}",
                ArtifactLoadFailed {
                    artifact_path: &shown,
                    error: &error,
                }
            );
            Err(error)
        }
    }
}

fn read_artifact(path: &Path) -> AdapterResult<(Vec<u8>, bool)> {
    let raw = std::fs::read(path)?;

    let (bytes, decompressed) = if is_gzip(&raw) {
        (gunzip(&raw)?, true)
    } else {
        (raw, false)
    };

    if bytes.len() > MAX_ARTIFACT_SIZE {
        return Err(AdapterError::InvalidWasmBinary(format!(
            "artifact too large: {} bytes (max: {} bytes)",
            bytes.len(),
            MAX_ARTIFACT_SIZE
        )));
    }

    Ok((bytes, decompressed))
}

fn gunzip(raw: &[u8]) -> AdapterResult<Vec<u8>> {
    let mut decoder = GzDecoder::new(raw).take(MAX_ARTIFACT_SIZE as u64 + 1);
    let mut bytes = Vec::new();
    decoder.read_to_end(&mut bytes).map_err(|e| {
        AdapterError::InvalidWasmBinary(format!("corrupt gzip artifact: {}", e))
    })?;
    Ok(bytes)
}
