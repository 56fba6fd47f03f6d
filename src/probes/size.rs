// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::{Probe, ProbeContext};
use crate::observability::messages::probe::{ProbeIterationFailed, SizeMeasured};
use crate::report::{MeasurementResult, ProbeKind, SizeMetrics};
use crate::runtime::locate_artifact;
use async_trait::async_trait;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;

/// Raw and gzipped artifact size. Never instantiates anything.
///
/// A missing artifact measures as zero rather than failing, so a partially
/// built registry still gets a size column.
pub struct SizeProbe {
    gzip_level: u32,
}

impl SizeProbe {
    pub fn new(gzip_level: u32) -> Self {
        Self { gzip_level }
    }
}

/// Length of `bytes` after gzip at `level`.
pub fn gzipped_len(bytes: &[u8], level: u32) -> std::io::Result<u64> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::new(level));
    encoder.write_all(bytes)?;
    Ok(encoder.finish()?.len() as u64)
}

fn compression_percent(raw: u64, gzipped: u64) -> f64 {
    if raw == 0 {
        return 0.0;
    }
    (1.0 - gzipped as f64 / raw as f64) * 100.0
}

#[async_trait]
impl Probe for SizeProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Size
    }

    async fn measure(&self, ctx: &ProbeContext<'_>, result: &mut MeasurementResult) {
        let mut metrics = SizeMetrics::default();

        for companion in &ctx.descriptor.companions {
            match tokio::fs::metadata(companion).await {
                Ok(meta) => metrics.companion_bytes += meta.len(),
                Err(e) => result.record_error(format!(
                    "Size: companion '{}': {}",
                    companion.display(),
                    e
                )),
            }
        }

        if locate_artifact(&ctx.descriptor.artifact).is_none() {
            result.size = metrics;
            return;
        }

        let bytes = match ctx.artifact_bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(
                    "{}",
                    ProbeIterationFailed {
                        target: ctx.target(),
                        probe: ProbeKind::Size,
                        detail: &e.to_string(),
                    }
                );
                result.record_error(format!("Size: {}", e));
                result.size = metrics;
                return;
            }
        };

        metrics.raw_bytes = bytes.len() as u64;
        match gzipped_len(&bytes, self.gzip_level) {
            Ok(gzipped) => {
                metrics.gzipped_bytes = gzipped;
                metrics.compression_percent = compression_percent(metrics.raw_bytes, gzipped);
            }
            Err(e) => result.record_error(format!("Size: gzip failed: {}", e)),
        }

        tracing::info!(
            "{}",
            SizeMeasured {
                target: ctx.target(),
                raw_bytes: metrics.raw_bytes,
                gzipped_bytes: metrics.gzipped_bytes,
            }
        );
        result.size = metrics;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArtifactDescriptor;
    use crate::runtime::test_fixtures::native_module;
    use crate::runtime::{AdapterOptions, RuntimeContract};
    use std::path::PathBuf;
    use tempfile::TempDir;

    async fn measure(descriptor: &ArtifactDescriptor, level: u32) -> MeasurementResult {
        let ctx = ProbeContext {
            descriptor,
            options: AdapterOptions::default(),
        };
        let mut result = MeasurementResult::new(&descriptor.name, descriptor.contract.label());
        SizeProbe::new(level).measure(&ctx, &mut result).await;
        result
    }

    #[tokio::test]
    async fn test_missing_artifact_measures_zero() {
        let descriptor = ArtifactDescriptor::new(
            "ghost",
            PathBuf::from("/nonexistent/ghost.wasm"),
            RuntimeContract::Native,
        );
        let result = measure(&descriptor, 9).await;

        assert_eq!(result.size.raw_bytes, 0);
        assert_eq!(result.size.gzipped_bytes, 0);
        assert!(!result.has_errors());
    }

    #[tokio::test]
    async fn test_sizes_present_artifact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("native.wasm");
        let wasm = native_module();
        std::fs::write(&path, &wasm).unwrap();
        let companion = dir.path().join("native.js");
        std::fs::write(&companion, "export {};").unwrap();

        let mut descriptor = ArtifactDescriptor::new("native", path, RuntimeContract::Native);
        descriptor.companions.push(companion);
        let result = measure(&descriptor, 9).await;

        assert_eq!(result.size.raw_bytes, wasm.len() as u64);
        assert!(result.size.gzipped_bytes > 0);
        assert!(result.size.gzipped_bytes < result.size.raw_bytes);
        assert!(result.size.compression_percent > 0.0);
        assert_eq!(result.size.companion_bytes, 10);
        assert!(!result.has_errors());
    }

    #[tokio::test]
    async fn test_gzip_at_rest_is_measured_decompressed() {
        let dir = TempDir::new().unwrap();
        let wasm = native_module();
        let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
        encoder.write_all(&wasm).unwrap();
        std::fs::write(dir.path().join("native.wasm.gz"), encoder.finish().unwrap()).unwrap();

        let descriptor = ArtifactDescriptor::new(
            "native",
            dir.path().join("native.wasm"),
            RuntimeContract::Native,
        );
        let result = measure(&descriptor, 9).await;
        assert_eq!(result.size.raw_bytes, wasm.len() as u64);
    }

    #[tokio::test]
    async fn test_missing_companion_is_recorded() {
        let mut descriptor = ArtifactDescriptor::new(
            "ghost",
            PathBuf::from("/nonexistent/ghost.wasm"),
            RuntimeContract::Native,
        );
        descriptor.companions.push(PathBuf::from("/nonexistent/ghost.js"));
        let result = measure(&descriptor, 9).await;

        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("Size: companion"));
    }

    #[test]
    fn test_gzip_level_is_honoured() {
        let data = b"abcabcabcabcabcabcabcabcabcabcabcabcabcabcabcabc".repeat(64);
        let stored = gzipped_len(&data, 0).unwrap();
        let best = gzipped_len(&data, 9).unwrap();
        assert!(best < stored);
        assert!(stored > data.len() as u64);
    }
}
